//! Test utilities for collection operations

use crate::app::models::{Column, DataFile, Parameter, Value};
use crate::constants::globals;
use rust_decimal::Decimal;
use std::str::FromStr;


pub fn dec(text: &str) -> Value {
    Value::Number(Decimal::from_str(text).unwrap())
}

/// Column of numbers; "" is null
pub fn numbers(name: &str, unit: Option<&str>, cells: &[&str]) -> Column {
    let mut column = Column::new(Parameter::declared(name, unit));
    for cell in cells {
        column.append(Value::parse_field(cell));
    }
    column
}

/// Three casts over six bottles with flagged salinity
pub fn three_casts() -> DataFile {
    let mut file = DataFile::new();
    file.globals
        .insert(globals::STAMP.to_string(), "20200101ABCDEF".to_string());
    file.insert_column(numbers("STNNBR", None, &["1", "1", "1", "2", "2", "3"]));
    file.insert_column(numbers("CASTNO", None, &["1", "1", "1", "1", "1", "2"]));
    file.insert_column(numbers("SAMPNO", None, &["3", "2", "1", "2", "1", "1"]));
    file.insert_column(numbers(
        "CTDPRS",
        Some("DBAR"),
        &["10.0", "500.0", "1000.0", "5.0", "250.0", "12.5"],
    ));
    let mut salinity = numbers(
        "SALNTY",
        Some("PSS-78"),
        &["35.1", "34.9", "", "35.0", "34.8", "34.7"],
    );
    for (row, flag) in [2, 2, 9, 2, 3, 2].into_iter().enumerate() {
        salinity.set_flag_woce(row, Some(flag));
    }
    file.insert_column(salinity);
    file
}

/// Cell values of a column as strings ("" for null)
pub fn cells(file: &DataFile, mnemonic: &str) -> Vec<String> {
    let column = file.column(mnemonic).unwrap();
    (0..column.len())
        .map(|row| column.get(row).map(Value::to_string).unwrap_or_default())
        .collect()
}
