//! End-to-end tests for Exchange files on disk
//!
//! Files are written to a temporary directory, read back through the catalog
//! and converters, rewritten and checked.

use hydro_processor::app::services::collection_ops::split_by_cast;
use hydro_processor::app::services::exchange::{ExchangeReader, ExchangeWriter};
use hydro_processor::app::services::parameter_catalog::ParameterCatalog;
use hydro_processor::app::services::quality_checks::{CheckOptions, Severity, check_file};
use hydro_processor::config::{CatalogConfig, ConversionPolicyMode, ExchangeConfig};
use hydro_processor::{Error, Value};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::TempDir;

const OXYGEN_ML_PER_L: &str = "BOTTLE,20200101ABCDEF
EXPOCODE,STNNBR,CASTNO,SAMPNO,CTDSAL,CTDTMP,OXYGEN,OXYGEN_FLAG_W
,,,,PSS-78,ITS-90,ML/L,
49MX20100101,1,1,1,35.0,10.0,6.123,2
49MX20100101,1,1,2,35.0,10.0,-999,9
END_DATA
";

const FLAGGED_BOTTLES: &str = "BOTTLE,19971021WHPOSIOSA
# Cruise P16S
EXPOCODE,SECT_ID,STNNBR,CASTNO,SAMPNO,BTLNBR,BTLNBR_FLAG_W,DATE,TIME,LATITUDE,LONGITUDE,CTDPRS,CTDSAL,CTDSAL_FLAG_W,SALNTY,SALNTY_FLAG_W
,,,,,,,,,,,DBAR,PSS-78,,PSS-78,
31WTTUNES_3,P16S,1,1,2,2,2,19920710,0930,-17.0000,-150.5000,10.0,35.1000,2,35.1020,2
31WTTUNES_3,P16S,1,1,1,1,2,19920710,0930,-17.0000,-150.5000,500.5,34.6000,2,34.6100,9
END_DATA
";

fn catalog() -> ParameterCatalog {
    ParameterCatalog::builtin(CatalogConfig::default().with_allow_contrived(true))
}

fn dec(text: &str) -> Value {
    Value::Number(Decimal::from_str(text).unwrap())
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_oxygen_converted_to_per_kg_and_written() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "oxy_hy1.csv", OXYGEN_ML_PER_L);
    let output = dir.path().join("oxy_converted_hy1.csv");

    let catalog = catalog();
    let config = ExchangeConfig::default().with_conversion_policy(ConversionPolicyMode::Always);
    let result = ExchangeReader::new(&catalog, &config)
        .read_path_with_stats(&input)
        .unwrap();

    assert_eq!(result.report.converted.len(), 1);
    let oxygen = result.file.column("OXYGEN").unwrap();
    assert_eq!(oxygen.parameter.unit_mnemonic(), Some("UMOL/KG"));
    assert_eq!(oxygen.get(0), Some(&dec("266.3")));
    assert_eq!(oxygen.get(1), None);
    assert_eq!(oxygen.flags_woce, vec![Some(2), Some(9)]);

    ExchangeWriter::new(&catalog, &config)
        .write_path(&result.file, &output)
        .unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("BOTTLE,20200101ABCDEF\n"));
    assert!(written.contains("UMOL/KG"));
    assert!(written.contains("266.3"));
    assert!(written.ends_with("END_DATA\n"));

    // A converted file needs no further conversion
    let again = ExchangeReader::new(&catalog, &config)
        .read_path_with_stats(&output)
        .unwrap();
    assert!(again.report.mismatched.is_empty());
    assert!(again.report.converted.is_empty());
    assert_eq!(
        again.file.column("OXYGEN").unwrap().get(0),
        Some(&dec("266.3"))
    );
}

#[test]
fn test_mismatched_units_kept_without_conversion() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "oxy_hy1.csv", OXYGEN_ML_PER_L);

    let catalog = catalog();
    let config = ExchangeConfig::default();
    let result = ExchangeReader::new(&catalog, &config)
        .read_path_with_stats(&input)
        .unwrap();

    assert!(result.report.has_unresolved_units());
    let oxygen = result.file.column("OXYGEN").unwrap();
    assert_eq!(oxygen.parameter.unit_mnemonic(), Some("ML/L"));
    assert_eq!(oxygen.get(0), Some(&dec("6.123")));
}

#[test]
fn test_flagged_file_survives_disk_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "p16s_hy1.csv", FLAGGED_BOTTLES);
    let first = dir.path().join("first_hy1.csv");
    let second = dir.path().join("second_hy1.csv");

    let catalog = catalog();
    let config = ExchangeConfig::default();
    let reader = ExchangeReader::new(&catalog, &config);
    let writer = ExchangeWriter::new(&catalog, &config);

    let original = reader.read_path(&input).unwrap();
    writer.write_path(&original, &first).unwrap();
    let reread = reader.read_path(&first).unwrap();
    writer.write_path(&reread, &second).unwrap();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
    assert_eq!(reread.len(), 2);
    assert_eq!(reread.stamp(), Some("19971021WHPOSIOSA"));
    assert!(reread.header().unwrap().contains("# Cruise P16S"));
    for mnemonic in ["CTDPRS", "CTDSAL", "SALNTY", "LATITUDE", "BTLNBR"] {
        assert_eq!(
            reread.column(mnemonic).unwrap().values,
            original.column(mnemonic).unwrap().values,
            "{} changed",
            mnemonic
        );
    }
    assert_eq!(
        reread.column("SALNTY").unwrap().flags_woce,
        vec![Some(2), Some(9)]
    );
}

#[test]
fn test_quality_check_on_read_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "p16s_hy1.csv", FLAGGED_BOTTLES);

    let catalog = catalog();
    let config = ExchangeConfig::default();
    let file = ExchangeReader::new(&catalog, &config).read_path(&input).unwrap();

    let options = CheckOptions::default().with_verify_unique(vec![
        "STNNBR".to_string(),
        "CASTNO".to_string(),
        "SAMPNO".to_string(),
    ]);
    let report = check_file(&file, &options);

    // SALNTY row 2 has data but flag 9
    let salinity: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.column.as_deref() == Some("SALNTY"))
        .collect();
    assert_eq!(salinity.len(), 1);
    assert_eq!(salinity[0].severity, Severity::Warning);
    assert_eq!(salinity[0].row, Some(2));
    assert!(!report.has_errors());
}

#[test]
fn test_structural_errors_carry_line_context() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(
        &dir,
        "broken_hy1.csv",
        "BOTTLE,20200101ABCDEF\nEXPOCODE,STNNBR,CASTNO,SAMPNO\n,,,\nA,1,1\nEND_DATA\n",
    );

    let catalog = catalog();
    let config = ExchangeConfig::default();
    let error = ExchangeReader::new(&catalog, &config)
        .read_path(&input)
        .unwrap_err();
    assert!(matches!(
        error,
        Error::RowCountMismatch {
            row: 1,
            line: 4,
            expected: 4,
            found: 3
        }
    ));
    assert!(error.is_structural());
}

#[test]
fn test_missing_file_is_io_error() {
    let catalog = catalog();
    let config = ExchangeConfig::default();
    let result = ExchangeReader::new(&catalog, &config).read_path(std::path::Path::new(
        "/nonexistent/cruise_hy1.csv",
    ));
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_alias_beside_canonical_column_round_trips() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(
        &dir,
        "o2_hy1.csv",
        "BOTTLE,20200101ABCDEF\nEXPOCODE,STNNBR,CASTNO,SAMPNO,OXYGEN,O2\n,,,,UMOL/KG,UMOL/KG\n49MX20100101,1,1,1,250.1,251.3\nEND_DATA\n",
    );
    let first = dir.path().join("first_hy1.csv");
    let second = dir.path().join("second_hy1.csv");

    let catalog = catalog();
    let config = ExchangeConfig::default();
    let reader = ExchangeReader::new(&catalog, &config);
    let writer = ExchangeWriter::new(&catalog, &config);

    let file = reader.read_path(&input).unwrap();
    writer.write_path(&file, &first).unwrap();
    let reread = reader.read_path(&first).unwrap();
    writer.write_path(&reread, &second).unwrap();

    let written = fs::read_to_string(&first).unwrap();
    assert!(!written.contains("OXYGEN,OXYGEN"));
    assert_eq!(written, fs::read_to_string(&second).unwrap());
    assert_eq!(reread.column("O2").unwrap().get(0), Some(&dec("251.3")));
    assert_eq!(reread.column("OXYGEN").unwrap().get(0), Some(&dec("250.1")));
}

#[test]
fn test_aliased_cast_keys_split() {
    let catalog = catalog();
    let config = ExchangeConfig::default();
    let file = ExchangeReader::new(&catalog, &config)
        .read(
            "BOTTLE,20200101ABCDEF\nEXPOCODE,STATION,CAST,SAMPNO,CTDOXY\n,,,,UMOL/KG\n49MX20100101,1,1,1,200.5\n49MX20100101,2,1,1,201.5\nEND_DATA\n"
                .as_bytes(),
        )
        .unwrap();

    assert!(file.contains("STNNBR"));
    assert!(file.contains("CASTNO"));
    assert!(!file.contains("STATION"));
    let casts = split_by_cast(&file, &["STNNBR", "CASTNO"]).unwrap();
    assert_eq!(casts.len(), 2);
}
