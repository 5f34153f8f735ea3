//! Tests for check_and_replace

use super::*;
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::app::services::unit_conversion::{
    ConversionOptions, ConversionPolicy, ConversionPrompt, ConverterRegistry,
};
use crate::config::CatalogConfig;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn catalog() -> ParameterCatalog {
    ParameterCatalog::builtin(CatalogConfig::default())
}

fn oxygen_ml_per_l_file() -> DataFile {
    let mut file = file_with(vec![
        declared_column("CTDSAL", Some("PSS-78"), &["35.0"]),
        declared_column("CTDTMP", Some("ITS-90"), &["10.0"]),
        declared_column("OXYGEN", Some("ML/L"), &["6.123"]),
    ]);
    file.unit_converters = Some(Arc::new(ConverterRegistry::per_litre_to_per_kg()));
    file
}

#[test]
fn test_replaces_known_parameters() {
    let mut file = file_with(vec![
        declared_column("STNNBR", None, &["1"]),
        declared_column("CTDPRS", Some("DBAR"), &["10.5"]),
        declared_column("CTDTEMP", Some("ITS-90"), &["12.1"]),
    ]);
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default())
        .unwrap();

    assert_eq!(report.replaced.len(), 3);
    assert!(report.unknown.is_empty());
    assert_eq!(file.column("CTDPRS").unwrap().parameter.format, "%9.1f");
    // Alias columns are stored under the canonical mnemonic
    assert!(!file.contains("CTDTEMP"));
    assert_eq!(file.column("CTDTMP").unwrap().parameter.name, "CTDTMP");
    assert!(report.replaced.contains(&"CTDTMP".to_string()));
}

#[test]
fn test_alias_keys_become_canonical() {
    let mut file = file_with(vec![
        declared_column("STATION", None, &["1", "2"]),
        declared_column("CAST", None, &["1", "1"]),
        declared_column("SAMPNO", None, &["1", "1"]),
    ]);
    catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default())
        .unwrap();

    assert_eq!(
        file.mnemonics().collect::<Vec<_>>(),
        vec!["CASTNO", "SAMPNO", "STNNBR"]
    );
    for (key, column) in file.mnemonics().zip(file.columns()) {
        assert_eq!(key, column.parameter.name);
    }
    assert_eq!(
        file.column("STNNBR").unwrap().get(1),
        Some(&Value::Number(Decimal::from(2)))
    );
}

#[test]
fn test_alias_of_existing_column_is_left_alone() {
    let mut file = file_with(vec![
        declared_column("OXYGEN", Some("UMOL/KG"), &["250.1"]),
        declared_column("O2", Some("UMOL/KG"), &["251.3"]),
    ]);
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default())
        .unwrap();

    assert_eq!(report.shadowed, vec!["O2".to_string()]);
    assert_eq!(file.column("OXYGEN").unwrap().parameter.name, "OXYGEN");
    assert_eq!(file.column("O2").unwrap().parameter.name, "O2");
    assert_eq!(
        file.column("O2").unwrap().get(0),
        Some(&Value::Number(Decimal::from_str("251.3").unwrap()))
    );
}

#[test]
fn test_unknown_parameter_is_kept() {
    let mut file = file_with(vec![declared_column("MYSTERY", Some("FURLONGS"), &["1"])]);
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Always, &ConversionOptions::default())
        .unwrap();
    assert_eq!(report.unknown, vec!["MYSTERY".to_string()]);
    assert_eq!(unit_of(&file, "MYSTERY"), Some("FURLONGS".to_string()));
}

#[test]
fn test_declared_unit_kept_when_catalog_has_none() {
    let mut file = file_with(vec![declared_column("_SITE", Some("CODE"), &["A"])]);
    catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default())
        .unwrap();
    assert_eq!(unit_of(&file, "_SITE"), Some("CODE".to_string()));
}

#[test]
fn test_mismatched_units_without_permission_are_left_alone() {
    let mut file = oxygen_ml_per_l_file();
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default())
        .unwrap();

    assert_eq!(report.mismatched.len(), 1);
    assert_eq!(report.mismatched[0].found, "ML/L");
    assert_eq!(report.mismatched[0].expected, "UMOL/KG");
    assert!(report.converted.is_empty());
    assert!(report.has_unresolved_units());
    assert_eq!(unit_of(&file, "OXYGEN"), Some("ML/L".to_string()));
    assert_eq!(
        file.column("OXYGEN").unwrap().get(0),
        Some(&Value::Number(Decimal::from_str("6.123").unwrap()))
    );
}

#[test]
fn test_mismatched_units_converted_when_policy_allows() {
    let mut file = oxygen_ml_per_l_file();
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Always, &ConversionOptions::default())
        .unwrap();

    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].column, "OXYGEN");
    assert!(!report.has_unresolved_units());
    let oxygen = file.column("OXYGEN").unwrap();
    assert_eq!(oxygen.parameter.unit_mnemonic(), Some("UMOL/KG"));
    assert_eq!(oxygen.parameter.format, "%9.1f");
    assert_eq!(
        oxygen.get(0),
        Some(&Value::Number(Decimal::from_str("266.3").unwrap()))
    );
}

#[test]
fn test_mismatch_without_registered_converter() {
    let mut file = file_with(vec![declared_column("CTDPRS", Some("PSI"), &["100.0"])]);
    file.unit_converters = Some(Arc::new(ConverterRegistry::per_litre_to_per_kg()));
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Always, &ConversionOptions::default())
        .unwrap();
    assert_eq!(report.mismatched.len(), 1);
    assert!(report.converted.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(unit_of(&file, "CTDPRS"), Some("PSI".to_string()));
}

struct Decline;

impl ConversionPrompt for Decline {
    fn confirm(&self, _parameter: &str, _from: &str, _to: &str) -> bool {
        false
    }
}

#[test]
fn test_ask_policy_declined() {
    let mut file = oxygen_ml_per_l_file();
    let report = catalog()
        .check_and_replace(
            &mut file,
            &ConversionPolicy::Ask(Arc::new(Decline)),
            &ConversionOptions::default(),
        )
        .unwrap();
    assert!(report.converted.is_empty());
    assert_eq!(unit_of(&file, "OXYGEN"), Some("ML/L".to_string()));
}

#[test]
fn test_failed_conversion_is_reported() {
    // Text in a numeric column makes the converter fail
    let mut file = file_with(vec![declared_column("SILCAT", Some("UMOL/L"), &["45.67", "bad"])]);
    file.unit_converters = Some(Arc::new(ConverterRegistry::per_litre_to_per_kg()));
    let report = catalog()
        .check_and_replace(&mut file, &ConversionPolicy::Always, &ConversionOptions::default())
        .unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(unit_of(&file, "SILCAT"), Some("UMOL/L".to_string()));
}

#[test]
fn test_closed_catalog_aborts() {
    let catalog = catalog();
    catalog.close();
    let mut file = oxygen_ml_per_l_file();
    let result =
        catalog.check_and_replace(&mut file, &ConversionPolicy::Skip, &ConversionOptions::default());
    assert!(matches!(result, Err(Error::CatalogClosed)));
}
