//! Configuration management and validation.
//!
//! Provides configuration structures for the Exchange codec, the parameter
//! catalog, unit conversion and batch processing. Configuration is layered:
//! built-in defaults, then an optional TOML file, then command line
//! overrides, then `validate()`.

use crate::app::models::OutOfBand;
use crate::app::services::unit_conversion::{ConversionOptions, ConverterPreset};
use crate::constants::{
    BOTTLE_IDENTIFIER, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PARALLEL_WORKERS,
    DEFAULT_STAMP_INSTITUTION, DEFAULT_STAMP_PERSON, FILL_VALUE,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How unit mismatches found during canonicalization are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionPolicyMode {
    /// Warn and leave the column unchanged
    #[default]
    Skip,
    /// Convert whenever a converter is registered
    Always,
    /// Ask an interactive prompt for every conversion
    Ask,
}

/// Exchange reader/writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// File type identifier expected on the stamp line
    pub identifier: String,

    /// Out-of-band ("no data") detection
    pub out_of_band: OutOfBand,

    /// Value written for null cells
    pub fill_value: i64,

    /// Institution code used when a file has no stamp
    pub stamp_institution: String,

    /// Person code used when a file has no stamp
    pub stamp_person: String,

    /// Policy applied to mismatched units at the end of a read
    pub conversion_policy: ConversionPolicyMode,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            identifier: BOTTLE_IDENTIFIER.to_string(),
            out_of_band: OutOfBand::default(),
            fill_value: FILL_VALUE,
            stamp_institution: DEFAULT_STAMP_INSTITUTION.to_string(),
            stamp_person: DEFAULT_STAMP_PERSON.to_string(),
            conversion_policy: ConversionPolicyMode::Skip,
        }
    }
}

impl ExchangeConfig {
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_conversion_policy(mut self, policy: ConversionPolicyMode) -> Self {
        self.conversion_policy = policy;
        self
    }

    pub fn with_stamp_codes(
        mut self,
        institution: impl Into<String>,
        person: impl Into<String>,
    ) -> Self {
        self.stamp_institution = institution.into();
        self.stamp_person = person.into();
        self
    }
}

/// Parameter catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Substitute a contrived parameter for unknown mnemonics instead of failing
    pub allow_contrived: bool,

    /// CSV parameter table loaded instead of the built-in table
    pub table_path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn with_allow_contrived(mut self, allow: bool) -> Self {
        self.allow_contrived = allow;
        self
    }

    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }
}

/// Unit conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Converter sets registered on every file read
    pub presets: Vec<ConverterPreset>,

    /// Options passed to every converter
    #[serde(flatten)]
    pub options: ConversionOptions,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            presets: vec![ConverterPreset::PerLitreToPerKg],
            options: ConversionOptions::default(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files processed concurrently
    pub workers: usize,

    /// Show progress bars
    pub show_progress: bool,

    /// Overwrite existing output files
    pub overwrite: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, DEFAULT_PARALLEL_WORKERS),
            show_progress: true,
            overwrite: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no -v/-q flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Global configuration for hydrographic processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub catalog: CatalogConfig,
    pub conversion: ConversionConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location (`<config dir>/hydro-processor/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("Failed to read config {}", path.display()), e))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid config file: {}", e)))
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Cannot serialize config: {}", e)))
    }

    /// Set the number of concurrent workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.processing.workers = workers;
        self
    }

    /// Allow or forbid contrived fallback for unknown mnemonics
    pub fn with_allow_contrived(mut self, allow: bool) -> Self {
        self.catalog.allow_contrived = allow;
        self
    }

    /// Use a CSV parameter table
    pub fn with_catalog_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog.table_path = Some(path.into());
        self
    }

    /// Set the conversion policy applied while reading
    pub fn with_conversion_policy(mut self, policy: ConversionPolicyMode) -> Self {
        self.exchange.conversion_policy = policy;
        self
    }

    /// Disable progress bars
    pub fn without_progress(mut self) -> Self {
        self.processing.show_progress = false;
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.exchange.identifier.trim().is_empty() {
            return Err(Error::configuration("exchange.identifier must not be empty"));
        }
        if self.exchange.identifier.contains(',') {
            return Err(Error::configuration(
                "exchange.identifier must not contain a comma",
            ));
        }
        if self.exchange.out_of_band.tolerance.is_sign_negative() {
            return Err(Error::configuration(
                "exchange.out_of_band.tolerance must not be negative",
            ));
        }
        if self.processing.workers == 0 {
            return Err(Error::configuration("processing.workers must be at least 1"));
        }
        if let Some(path) = &self.catalog.table_path {
            if !path.exists() {
                return Err(Error::configuration(format!(
                    "catalog.table_path does not exist: {}",
                    path.display()
                )));
            }
        }
        let options = &self.conversion.options;
        if options.approximation_salinity <= 0.0 {
            return Err(Error::configuration(
                "conversion.approximation_salinity must be positive",
            ));
        }
        if options.salinity_columns.is_empty() || options.temperature_columns.is_empty() {
            return Err(Error::configuration(
                "conversion salinity and temperature column lists must not be empty",
            ));
        }
        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(Error::configuration(format!(
                "logging.level '{}' is not one of error, warn, info, debug, trace",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::unit_conversion::OxygenMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.exchange.identifier, "BOTTLE");
        assert_eq!(config.exchange.fill_value, -999);
        assert!(!config.catalog.allow_contrived);
        assert_eq!(config.exchange.conversion_policy, ConversionPolicyMode::Skip);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default()
            .with_workers(2)
            .with_allow_contrived(true)
            .with_conversion_policy(ConversionPolicyMode::Always);
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.processing.workers, 2);
        assert!(parsed.catalog.allow_contrived);
        assert_eq!(parsed.exchange.conversion_policy, ConversionPolicyMode::Always);
        assert_eq!(parsed.conversion.presets, config.conversion.presets);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[catalog]\nallow_contrived = true\n\n[conversion]\noxygen_method = \"aliquot\"\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.catalog.allow_contrived);
        assert_eq!(config.conversion.options.oxygen_method, OxygenMethod::Aliquot);
        assert_eq!(config.exchange.identifier, "BOTTLE");
        assert_eq!(config.conversion.options.approximation_salinity, 34.8);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/hydro/config.toml")));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default().with_workers(0);
        assert!(config.validate().is_err());

        config = Config::default();
        config.exchange.identifier = "BOT,TLE".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config = Config::default().with_catalog_table("/nonexistent/params.csv");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let result = Config::from_toml("[processing]\nworkers = \"many\"");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
