//! Data quality checks on a read file
//!
//! Checks flag/value consistency, fill values, blank text, parameter bounds
//! and key uniqueness. Findings are collected rather than raised so that a
//! whole file can be reported on at once.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::app::models::{DataFile, Value};
use crate::app::services::collection_ops::{describe_key, row_key};
use crate::constants::{NOT_WATER_PARAMETERS, water_flags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// One finding; `row` is the 1-based data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub column: Option<String>,
    pub row: Option<usize>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity)?;
        if let Some(column) = &self.column {
            write!(f, " {}", column)?;
        }
        if let Some(row) = self.row {
            write!(f, " row {}", row)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub issues: Vec<Issue>,
}

impl CheckReport {
    fn push(
        &mut self,
        severity: Severity,
        column: Option<&str>,
        row: Option<usize>,
        message: impl Into<String>,
    ) {
        self.issues.push(Issue {
            severity,
            column: column.map(str::to_string),
            row,
            message: message.into(),
        });
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.iter().all(|i| i.severity == Severity::Info)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} errors, {} warnings, {} notes",
            self.count(Severity::Error),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    /// Columns whose combined values must be unique per row
    pub verify_unique: Vec<String>,

    /// Report values outside the parameter bounds
    pub check_bounds: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            verify_unique: Vec::new(),
            check_bounds: true,
        }
    }
}

impl CheckOptions {
    pub fn with_verify_unique(mut self, columns: Vec<String>) -> Self {
        self.verify_unique = columns;
        self
    }
}

/// Run every check on a file
pub fn check_file(file: &DataFile, options: &CheckOptions) -> CheckReport {
    info!("Checking {} columns over {} rows", file.column_count(), file.len());
    let mut report = CheckReport::default();

    check_fill_flags(file, &mut report);
    check_empty_columns(file, &mut report);
    check_flag_zero(file, &mut report);
    check_blank_values(file, &mut report);
    if options.check_bounds {
        check_bounds(file, &mut report);
    }
    if !options.verify_unique.is_empty() {
        check_unique(file, &options.verify_unique, &mut report);
    }

    for issue in &report.issues {
        match issue.severity {
            Severity::Info => debug!("{}", issue),
            _ => warn!("{}", issue),
        }
    }
    report
}

/// Fill values need a fill flag (1, 5, 9) and fill flags need a fill value
fn check_fill_flags(file: &DataFile, report: &mut CheckReport) {
    for (key, column) in file.mnemonics().zip(file.columns()) {
        if !column.is_flagged_woce() || NOT_WATER_PARAMETERS.contains(&column.mnemonic()) {
            continue;
        }
        if column.flags_woce.len() != column.len() {
            report.push(
                Severity::Error,
                Some(key),
                None,
                format!(
                    "has {} values but {} flags",
                    column.len(),
                    column.flags_woce.len()
                ),
            );
            continue;
        }
        for (row, flag) in column.flags_woce.iter().enumerate() {
            let Some(flag) = *flag else {
                continue;
            };
            let requires_fill = water_flags::REQUIRE_FILL.contains(&flag);
            match column.get(row) {
                Some(value) if requires_fill => report.push(
                    Severity::Warning,
                    Some(key),
                    Some(row + 1),
                    format!(
                        "has data {} but expected fill value for flag {}: {}",
                        value,
                        flag,
                        water_flags::describe(flag)
                    ),
                ),
                None if !requires_fill => report.push(
                    Severity::Warning,
                    Some(key),
                    Some(row + 1),
                    format!(
                        "has unexpected fill value for flag {}: {}",
                        flag,
                        water_flags::describe(flag)
                    ),
                ),
                _ => {}
            }
        }
    }
}

fn check_empty_columns(file: &DataFile, report: &mut CheckReport) {
    for (key, column) in file.mnemonics().zip(file.columns()) {
        if !column.is_empty() && column.values.iter().all(Option::is_none) {
            report.push(Severity::Info, Some(key), None, "is empty (only has fill values)");
        }
    }
}

fn check_flag_zero(file: &DataFile, report: &mut CheckReport) {
    for (key, column) in file.mnemonics().zip(file.columns()) {
        if let Some(row) = column.flags_woce.iter().position(|f| *f == Some(0)) {
            report.push(Severity::Warning, Some(key), Some(row + 1), "has flag 0");
        }
    }
}

fn check_blank_values(file: &DataFile, report: &mut CheckReport) {
    for (key, column) in file.mnemonics().zip(file.columns()) {
        let rows: Vec<String> = column
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_ref().is_some_and(Value::is_blank))
            .map(|(row, _)| (row + 1).to_string())
            .collect();
        if !rows.is_empty() {
            report.push(
                Severity::Error,
                Some(key),
                None,
                format!(
                    "has blank values on row(s) {}, conversions may fail",
                    rows.join(",")
                ),
            );
        }
    }
}

fn check_bounds(file: &DataFile, report: &mut CheckReport) {
    for (key, column) in file.mnemonics().zip(file.columns()) {
        let parameter = &column.parameter;
        if parameter.bound_lower.is_none() && parameter.bound_upper.is_none() {
            continue;
        }
        for row in 0..column.len() {
            if let Some(value) = column.get(row).and_then(Value::as_decimal) {
                if !parameter.is_in_range(value) {
                    report.push(
                        Severity::Warning,
                        Some(key),
                        Some(row + 1),
                        format!("value {} outside the expected range", value),
                    );
                }
            }
        }
    }
}

fn check_unique(file: &DataFile, keys: &[String], report: &mut CheckReport) {
    if let Some(missing) = keys.iter().find(|k| !file.contains(k)) {
        report.push(
            Severity::Error,
            Some(missing.as_str()),
            None,
            "cannot verify uniqueness: column not found",
        );
        return;
    }
    let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
    for row in 0..file.len() {
        let key = row_key(file, keys, row);
        match seen.get(&key) {
            Some(first) => report.push(
                Severity::Warning,
                None,
                Some(row + 1),
                format!(
                    "duplicates {} of row {}",
                    describe_key(keys, &key),
                    first + 1
                ),
            ),
            None => {
                seen.insert(key, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Column, Parameter};
    use rust_decimal::Decimal;

    fn column(name: &str, cells: &[&str], flags: &[Option<i16>]) -> Column {
        let mut column = Column::new(Parameter::declared(name, None));
        for cell in cells {
            column.append(Value::parse_field(cell));
        }
        for (row, flag) in flags.iter().enumerate() {
            column.set_flag_woce(row, *flag);
        }
        column
    }

    fn messages(report: &CheckReport, severity: Severity) -> Vec<String> {
        report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(Issue::to_string)
            .collect()
    }

    #[test]
    fn test_clean_file() {
        let mut file = DataFile::new();
        file.insert_column(column("SALNTY", &["35.0", ""], &[Some(2), Some(9)]));
        let report = check_file(&file, &CheckOptions::default());
        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(report.summary(), "0 errors, 0 warnings, 0 notes");
    }

    #[test]
    fn test_fill_flag_consistency() {
        let mut file = DataFile::new();
        file.insert_column(column(
            "OXYGEN",
            &["200.0", "", "201.0"],
            &[Some(9), Some(2), None],
        ));
        file.insert_column(column("BTLNBR", &["", "2", "3"], &[Some(2), Some(9), Some(2)]));

        let report = check_file(&file, &CheckOptions::default());
        let warnings = messages(&report, Severity::Warning);
        assert_eq!(warnings.len(), 2, "{:?}", warnings);
        assert!(warnings[0].starts_with(
            "[warning] OXYGEN row 1: has data 200.0 but expected fill value for flag 9"
        ));
        assert!(warnings[1].starts_with("[warning] OXYGEN row 2: has unexpected fill value for flag 2"));
    }

    #[test]
    fn test_empty_columns_flag_zero_and_blanks() {
        let mut file = DataFile::new();
        file.insert_column(column("NITRAT", &["", ""], &[]));
        file.insert_column(column("SILCAT", &["1.0", "2.0"], &[Some(2), Some(0)]));
        let mut note = Column::new(Parameter::contrived("_NOTE"));
        note.append(Some(Value::Text("  ".to_string())));
        note.append(Some(Value::from("ok")));
        file.insert_column(note);

        let report = check_file(&file, &CheckOptions::default());
        assert_eq!(report.count(Severity::Info), 1);
        let note = report
            .issues
            .iter()
            .find(|i| i.severity == Severity::Info)
            .unwrap();
        assert_eq!(note.column.as_deref(), Some("NITRAT"));
        assert!(
            messages(&report, Severity::Warning)
                .contains(&"[warning] SILCAT row 2: has flag 0".to_string())
        );
        assert_eq!(
            messages(&report, Severity::Error),
            vec!["[error] _NOTE: has blank values on row(s) 1, conversions may fail".to_string()]
        );
        assert!(report.has_errors());
    }

    #[test]
    fn test_misaligned_flags() {
        let mut file = DataFile::new();
        let mut salinity = column("SALNTY", &["35.0", "35.1"], &[]);
        salinity.flags_woce = vec![Some(2)];
        file.insert_column(salinity);
        let report = check_file(&file, &CheckOptions::default());
        assert_eq!(
            messages(&report, Severity::Error),
            vec!["[error] SALNTY: has 2 values but 1 flags".to_string()]
        );
    }

    #[test]
    fn test_bounds() {
        let mut file = DataFile::new();
        let mut latitude = column("LATITUDE", &["45.0", "95.5"], &[]);
        latitude.parameter = latitude
            .parameter
            .with_bounds(Some(Decimal::from(-90)), Some(Decimal::from(90)));
        file.insert_column(latitude);

        let report = check_file(&file, &CheckOptions::default());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row, Some(2));

        let unchecked = CheckOptions {
            check_bounds: false,
            ..CheckOptions::default()
        };
        assert!(check_file(&file, &unchecked).issues.is_empty());
    }

    #[test]
    fn test_verify_unique() {
        let mut file = DataFile::new();
        file.insert_column(column("STNNBR", &["1", "1", "1"], &[]));
        file.insert_column(column("SAMPNO", &["1", "2", "1.0"], &[]));
        let options =
            CheckOptions::default().with_verify_unique(vec!["STNNBR".into(), "SAMPNO".into()]);
        let report = check_file(&file, &options);
        assert_eq!(
            messages(&report, Severity::Warning),
            vec!["[warning] row 3: duplicates (STNNBR=1, SAMPNO=1) of row 1".to_string()]
        );

        let missing = CheckOptions::default().with_verify_unique(vec!["CASTNO".into()]);
        assert!(check_file(&file, &missing).has_errors());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut file = DataFile::new();
        file.insert_column(column("SILCAT", &["1.0"], &[Some(0)]));
        let report = check_file(&file, &CheckOptions::default());
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["issues"][0]["severity"], "warning");
        assert_eq!(json["issues"][0]["column"], "SILCAT");
        assert_eq!(json["issues"][0]["row"], 1);
    }
}
