//! Unit conversion engine
//!
//! Converters are plain functions registered against a
//! `(source unit mnemonic, target unit mnemonic)` pair. A converter reads
//! sibling columns of the file for context (salinity, temperature,
//! sigma-theta), replaces the values of the converted column and sets its
//! unit to the target. The registry is shared read-only while converting, so
//! files may be converted concurrently.

use crate::app::models::{Column, DataFile, Unit};
use crate::constants::{
    APPROXIMATION_SALINITY, APPROXIMATION_TEMPERATURE, MISSING_DATA_THRESHOLD,
    REFERENCE_TEMPERATURE, SALINITY_COLUMNS, SIGMA_THETA_COLUMN, TEMPERATURE_COLUMNS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub mod converters;
pub mod precision;
pub mod seawater;

#[cfg(test)]
pub mod tests;

pub use converters::{
    cc_per_kilogram_e_neg_5_to_nanomole_per_kilogram,
    ctdoxy_micromole_per_liter_to_micromole_per_kilogram, equivalent,
    milliliter_per_liter_to_umol_per_kg, mol_per_liter_to_mol_per_kg,
};

/// Signature shared by all converters
pub type ConverterFn = fn(&DataFile, &mut Column, &ConversionContext) -> Result<()>;

/// How bottle oxygens were sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OxygenMethod {
    /// Whole bottle titration, measured temperature applies
    #[default]
    Whole,
    /// Aliquot titration, CTD oxygen uses the approximation temperature
    Aliquot,
}

/// Options passed to every converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Salinity columns, best first
    pub salinity_columns: Vec<String>,

    /// Temperature columns, best first
    pub temperature_columns: Vec<String>,

    /// Salinity used when none is available or it is not positive
    pub approximation_salinity: f64,

    /// Temperature used when none is available
    pub approximation_temperature: f64,

    /// Fixed temperature used by the non-oxygen per-litre converter
    pub reference_temperature: f64,

    /// Values below this are treated as missing
    pub missing_threshold: f64,

    /// Sigma-theta column used by the CTD oxygen converter
    pub sigma_theta_column: String,

    /// Bottle oxygen sampling method
    pub oxygen_method: OxygenMethod,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            salinity_columns: SALINITY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            temperature_columns: TEMPERATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            approximation_salinity: APPROXIMATION_SALINITY,
            approximation_temperature: APPROXIMATION_TEMPERATURE,
            reference_temperature: REFERENCE_TEMPERATURE,
            missing_threshold: MISSING_DATA_THRESHOLD,
            sigma_theta_column: SIGMA_THETA_COLUMN.to_string(),
            oxygen_method: OxygenMethod::Whole,
        }
    }
}

impl ConversionOptions {
    pub fn with_oxygen_method(mut self, method: OxygenMethod) -> Self {
        self.oxygen_method = method;
        self
    }
}

/// Target unit and options of a single converter call
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub target: Unit,
    pub options: ConversionOptions,
}

impl ConversionContext {
    pub fn new(target: Unit, options: ConversionOptions) -> Self {
        Self { target, options }
    }
}

/// Named sets of converters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterPreset {
    /// Bottle per-litre to per-kilogram conversions
    PerLitreToPerKg,
    /// CTD oxygen UMOL/L to UMOL/KG through sigma-theta
    CtdOxygen,
    /// Helium and neon 10^-5 CC/KG to NMOL/KG
    NobleGas,
}

/// Confirms individual conversions for the `Ask` policy
pub trait ConversionPrompt: Send + Sync {
    /// Return true to convert `parameter` from `from` to `to`
    fn confirm(&self, parameter: &str, from: &str, to: &str) -> bool;
}

/// Caller policy for conversions triggered by mismatched units
#[derive(Clone, Default)]
pub enum ConversionPolicy {
    /// Never convert
    #[default]
    Skip,
    /// Convert whenever a converter is registered
    Always,
    /// Ask the prompt for every conversion
    Ask(Arc<dyn ConversionPrompt>),
}

impl ConversionPolicy {
    /// Whether a conversion may run
    pub fn allows(&self, parameter: &str, from: &str, to: &str) -> bool {
        match self {
            ConversionPolicy::Skip => false,
            ConversionPolicy::Always => true,
            ConversionPolicy::Ask(prompt) => prompt.confirm(parameter, from, to),
        }
    }
}

impl fmt::Debug for ConversionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionPolicy::Skip => write!(f, "Skip"),
            ConversionPolicy::Always => write!(f, "Always"),
            ConversionPolicy::Ask(_) => write!(f, "Ask"),
        }
    }
}

/// Registry of converters keyed by unit mnemonic pairs
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: BTreeMap<(String, String), ConverterFn>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.converters.keys()).finish()
    }
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the converters of the given presets
    pub fn from_presets(presets: &[ConverterPreset]) -> Self {
        let mut registry = Self::new();
        for preset in presets {
            registry.extend(match preset {
                ConverterPreset::PerLitreToPerKg => Self::per_litre_to_per_kg(),
                ConverterPreset::CtdOxygen => Self::ctd_oxygen(),
                ConverterPreset::NobleGas => Self::noble_gas(),
            });
        }
        registry
    }

    /// Bottle per-litre to per-kilogram converters
    pub fn per_litre_to_per_kg() -> Self {
        let mut registry = Self::new();
        registry.register("DEG C", "ITS-90", equivalent);
        registry.register("ML/L", "UMOL/KG", milliliter_per_liter_to_umol_per_kg);
        registry.register("UMOL/L", "UMOL/KG", mol_per_liter_to_mol_per_kg);
        registry.register("PMOL/L", "PMOL/KG", mol_per_liter_to_mol_per_kg);
        registry.register("NMOL/L", "NMOL/KG", mol_per_liter_to_mol_per_kg);
        registry
    }

    /// CTD oxygen converter using the sigma-theta column
    pub fn ctd_oxygen() -> Self {
        let mut registry = Self::new();
        registry.register(
            "UMOL/L",
            "UMOL/KG",
            ctdoxy_micromole_per_liter_to_micromole_per_kilogram,
        );
        registry
    }

    /// Helium and neon converter
    pub fn noble_gas() -> Self {
        let mut registry = Self::new();
        registry.register(
            "10^-5CC/KG",
            "NMOL/KG",
            cc_per_kilogram_e_neg_5_to_nanomole_per_kilogram,
        );
        registry
    }

    /// Register a converter, replacing any converter for the same pair
    pub fn register(&mut self, from: &str, to: &str, converter: ConverterFn) {
        debug!("Registering unit converter {} -> {}", from, to);
        self.converters
            .insert((from.to_string(), to.to_string()), converter);
    }

    /// Add every converter of another registry, later registrations win
    pub fn extend(&mut self, other: ConverterRegistry) {
        self.converters.extend(other.converters);
    }

    pub fn is_registered(&self, from: &str, to: &str) -> bool {
        self.converters
            .contains_key(&(from.to_string(), to.to_string()))
    }

    pub fn get(&self, from: &str, to: &str) -> Option<ConverterFn> {
        self.converters
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    /// Registered unit pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.converters
            .keys()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Run the converter registered for `from -> to` on a column
    pub fn invoke(
        &self,
        file: &DataFile,
        column: &mut Column,
        from: &str,
        to: &Unit,
        options: &ConversionOptions,
    ) -> Result<()> {
        let converter = self
            .get(from, &to.mnemonic)
            .ok_or_else(|| Error::no_converter(from, to.mnemonic.clone()))?;
        let context = ConversionContext::new(to.clone(), options.clone());
        converter(file, column, &context)
    }

    /// Convert a column of a file to `target`
    ///
    /// Returns `Ok(false)` without touching the column when it is already in
    /// the target unit. A failed conversion leaves the column unchanged.
    pub fn convert_column(
        &self,
        file: &mut DataFile,
        mnemonic: &str,
        target: &Unit,
        options: &ConversionOptions,
    ) -> Result<bool> {
        let mut column = file
            .remove_column(mnemonic)
            .ok_or_else(|| Error::missing_column(mnemonic))?;

        let from = column.parameter.unit_mnemonic().map(str::to_string);
        let result = match from {
            Some(ref from) if from == &target.mnemonic => {
                debug!("{} is already in {}, not converting", mnemonic, from);
                Ok(false)
            }
            Some(ref from) => self
                .invoke(file, &mut column, from, target, options)
                .map(|()| {
                    info!("Converted {} from {} to {}", mnemonic, from, target.mnemonic);
                    true
                }),
            None => Err(Error::no_converter("", target.mnemonic.clone())),
        };

        file.insert_column_as(mnemonic, column);
        result
    }
}
