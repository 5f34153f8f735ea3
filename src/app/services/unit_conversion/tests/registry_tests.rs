//! Tests for the converter registry and conversion policies

use super::*;
use crate::Error;
use crate::app::services::unit_conversion::{
    ConversionOptions, ConversionPolicy, ConversionPrompt, ConverterPreset, ConverterRegistry,
    equivalent,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn oxygen_file() -> DataFile {
    file_with(vec![
        column("CTDSAL", Some("PSS-78"), &["35.0"]),
        column("CTDTMP", Some("ITS-90"), &["10.0"]),
        column("OXYGEN", Some("ML/L"), &["6.123"]),
    ])
}

#[test]
fn test_per_litre_preset_pairs() {
    let registry = ConverterRegistry::per_litre_to_per_kg();
    assert!(registry.is_registered("DEG C", "ITS-90"));
    assert!(registry.is_registered("ML/L", "UMOL/KG"));
    assert!(registry.is_registered("UMOL/L", "UMOL/KG"));
    assert!(registry.is_registered("PMOL/L", "PMOL/KG"));
    assert!(registry.is_registered("NMOL/L", "NMOL/KG"));
    assert!(!registry.is_registered("UMOL/KG", "ML/L"));
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_from_presets_later_preset_wins() {
    let registry =
        ConverterRegistry::from_presets(&[ConverterPreset::PerLitreToPerKg, ConverterPreset::CtdOxygen]);
    let ctd = ConverterRegistry::ctd_oxygen().get("UMOL/L", "UMOL/KG").unwrap();
    assert_eq!(registry.get("UMOL/L", "UMOL/KG").unwrap() as usize, ctd as usize);
    assert!(registry.is_registered("ML/L", "UMOL/KG"));

    let noble = ConverterRegistry::from_presets(&[ConverterPreset::NobleGas]);
    assert!(noble.is_registered("10^-5CC/KG", "NMOL/KG"));
}

#[test]
fn test_convert_column_is_idempotent() {
    let registry = ConverterRegistry::per_litre_to_per_kg();
    let mut file = oxygen_file();
    let target = Unit::new("UMOL/KG");
    let options = ConversionOptions::default();

    assert!(registry.convert_column(&mut file, "OXYGEN", &target, &options).unwrap());
    let first = number_at(&file, "OXYGEN", 0);
    assert_eq!(first, Some(dec("266.3")));

    assert!(!registry.convert_column(&mut file, "OXYGEN", &target, &options).unwrap());
    assert_eq!(number_at(&file, "OXYGEN", 0), first);
    assert_eq!(file.column_count(), 3);
}

#[test]
fn test_convert_column_without_converter() {
    let registry = ConverterRegistry::new();
    let mut file = oxygen_file();
    let result = registry.convert_column(
        &mut file,
        "OXYGEN",
        &Unit::new("UMOL/KG"),
        &ConversionOptions::default(),
    );
    assert!(matches!(result, Err(Error::NoConverter { .. })));
    // The column is put back untouched
    assert_eq!(number_at(&file, "OXYGEN", 0), Some(dec("6.123")));
}

#[test]
fn test_convert_missing_column() {
    let registry = ConverterRegistry::per_litre_to_per_kg();
    let mut file = oxygen_file();
    let result = registry.convert_column(
        &mut file,
        "SILCAT",
        &Unit::new("UMOL/KG"),
        &ConversionOptions::default(),
    );
    assert!(matches!(result, Err(Error::MissingColumn { .. })));
}

#[test]
fn test_register_replaces_existing_pair() {
    let mut registry = ConverterRegistry::per_litre_to_per_kg();
    registry.register("ML/L", "UMOL/KG", equivalent);
    let mut file = oxygen_file();
    registry
        .convert_column(
            &mut file,
            "OXYGEN",
            &Unit::new("UMOL/KG"),
            &ConversionOptions::default(),
        )
        .unwrap();
    assert_eq!(number_at(&file, "OXYGEN", 0), Some(dec("6.123")));
}

struct CountingPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl ConversionPrompt for CountingPrompt {
    fn confirm(&self, _parameter: &str, _from: &str, _to: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

#[test]
fn test_conversion_policies() {
    assert!(!ConversionPolicy::Skip.allows("OXYGEN", "ML/L", "UMOL/KG"));
    assert!(ConversionPolicy::Always.allows("OXYGEN", "ML/L", "UMOL/KG"));

    let prompt = Arc::new(CountingPrompt {
        answer: false,
        asked: AtomicUsize::new(0),
    });
    let policy = ConversionPolicy::Ask(prompt.clone());
    assert!(!policy.allows("OXYGEN", "ML/L", "UMOL/KG"));
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert_eq!(format!("{:?}", policy), "Ask");
}
