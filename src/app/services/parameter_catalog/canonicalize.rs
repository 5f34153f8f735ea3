//! Replacing file parameters with their canonical definitions

use super::ParameterCatalog;
use crate::app::models::{DataFile, Parameter};
use crate::app::services::unit_conversion::{ConversionOptions, ConversionPolicy};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// A column whose declared unit differs from the catalog unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMismatch {
    pub column: String,
    pub found: String,
    pub expected: String,
}

/// A conversion that was applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedConversion {
    pub column: String,
    pub from: String,
    pub to: String,
}

/// A conversion that was attempted and failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedConversion {
    pub column: String,
    pub from: String,
    pub to: String,
    pub message: String,
}

/// Outcome of canonicalizing one file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalizationReport {
    /// Columns whose parameter was replaced by the catalog definition
    pub replaced: Vec<String>,

    /// Columns whose mnemonic could not be resolved
    pub unknown: Vec<String>,

    /// Alias columns left alone because the canonical column already exists
    pub shadowed: Vec<String>,

    /// Columns with mismatched units
    pub mismatched: Vec<UnitMismatch>,

    /// Conversions applied
    pub converted: Vec<AppliedConversion>,

    /// Conversions that failed, leaving the column unchanged
    pub failed: Vec<FailedConversion>,
}

impl CanonicalizationReport {
    /// Whether any column was left with a unit other than the catalog's
    pub fn has_unresolved_units(&self) -> bool {
        self.mismatched.len() > self.converted.len()
    }
}

impl ParameterCatalog {
    /// Resolve every column of a file against the catalog
    ///
    /// Unknown mnemonics keep their parameter. Columns found through an
    /// alias are re-keyed by the canonical name, unless the file already
    /// has a column of that name. A column whose declared unit
    /// differs from the catalog unit is only replaced when the file carries a
    /// converter for the pair and the policy allows the conversion. A
    /// declared unit is kept when the catalog has none.
    pub fn check_and_replace(
        &self,
        file: &mut DataFile,
        policy: &ConversionPolicy,
        options: &ConversionOptions,
    ) -> Result<CanonicalizationReport> {
        let mut report = CanonicalizationReport::default();
        let keys: Vec<String> = file.mnemonics().map(str::to_string).collect();

        for key in keys {
            let Some(column) = file.column(&key) else {
                continue;
            };
            let name = column.parameter.name.clone();
            let declared = column.parameter.unit.clone();

            let mut resolved = match self.resolve(&name) {
                Ok(parameter) => parameter,
                Err(Error::CatalogClosed) => return Err(Error::CatalogClosed),
                Err(e) => {
                    warn!("{}", e);
                    report.unknown.push(key.clone());
                    continue;
                }
            };

            if resolved.name != key && file.contains(&resolved.name) {
                warn!(
                    "Column '{}' resolves to '{}', which the file already has; keeping it as is",
                    key, resolved.name
                );
                report.shadowed.push(key.clone());
                continue;
            }

            let found = declared.as_ref().map(|u| u.mnemonic.clone()).filter(|m| !m.is_empty());
            let expected = resolved.unit_mnemonic().map(str::to_string);

            match (found, expected) {
                (Some(found), Some(expected)) if found != expected => {
                    warn!(
                        "Mismatched units for '{}'. Found '{}' but expected '{}'",
                        name, found, expected
                    );
                    report.mismatched.push(UnitMismatch {
                        column: key.clone(),
                        found: found.clone(),
                        expected: expected.clone(),
                    });

                    let Some(registry) = file.unit_converters.clone() else {
                        continue;
                    };
                    if !registry.is_registered(&found, &expected) {
                        debug!("No converter for '{}' -> '{}'", found, expected);
                        continue;
                    }
                    if !policy.allows(&name, &found, &expected) {
                        info!("Not converting '{}' from '{}' to '{}'", name, found, expected);
                        continue;
                    }

                    let Some(target) = resolved.unit.clone() else {
                        continue;
                    };
                    match registry.convert_column(file, &key, &target, options) {
                        Ok(_) => {
                            let mnemonic = install(file, &key, resolved);
                            report.converted.push(AppliedConversion {
                                column: mnemonic.clone(),
                                from: found,
                                to: expected,
                            });
                            report.replaced.push(mnemonic);
                        }
                        Err(e) => {
                            error!("Conversion of '{}' failed: {}", name, e);
                            report.failed.push(FailedConversion {
                                column: key,
                                from: found,
                                to: expected,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                (_, expected) => {
                    if expected.is_none() && declared.is_some() {
                        resolved.unit = declared;
                    }
                    report.replaced.push(install(file, &key, resolved));
                }
            }
        }

        debug!(
            "Canonicalized {} columns ({} unknown, {} mismatched, {} converted)",
            report.replaced.len(),
            report.unknown.len(),
            report.mismatched.len(),
            report.converted.len()
        );
        Ok(report)
    }
}

/// Give the column stored under `key` its resolved parameter, re-keying it
/// by the canonical name. Returns the mnemonic the column ends up under.
fn install(file: &mut DataFile, key: &str, resolved: Parameter) -> String {
    let name = resolved.name.clone();
    if name == key {
        if let Some(column) = file.column_mut(key) {
            column.parameter = resolved;
        }
        return name;
    }
    match file.remove_column(key) {
        Some(mut column) => {
            debug!("Renaming column '{}' to '{}'", key, name);
            column.parameter = resolved;
            file.insert_column_as(name.clone(), column);
            name
        }
        None => key.to_string(),
    }
}
