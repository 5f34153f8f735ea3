//! Shared fixtures for unit conversion tests

use crate::app::models::{Column, DataFile, Parameter, Unit, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

mod registry_tests;

/// Build a column from raw field strings ("" is null)
pub fn column(name: &str, unit: Option<&str>, fields: &[&str]) -> Column {
    let mut parameter = Parameter::contrived(name);
    parameter.unit = unit.map(Unit::new);
    let mut column = Column::new(parameter);
    for field in fields {
        column.append(Value::parse_field(field));
    }
    column
}

/// Build a file from columns
pub fn file_with(columns: Vec<Column>) -> DataFile {
    let mut file = DataFile::new();
    for column in columns {
        file.insert_column(column);
    }
    file
}

pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn number_at(file: &DataFile, mnemonic: &str, row: usize) -> Option<Decimal> {
    file.column(mnemonic)
        .and_then(|c| c.get(row))
        .and_then(Value::as_decimal)
}
