//! Test utilities and mock lookups for parameter catalog testing

use crate::app::models::{Column, DataFile, Parameter, Unit, Value};
use crate::app::services::parameter_catalog::{ParameterLookup, ParameterTable};
use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

mod canonicalize_tests;

/// Lookup over the built-in table that counts calls and can be made to fail
pub struct MockLookup {
    table: ParameterTable,
    pub calls: AtomicUsize,
    pub failing: bool,
}

impl MockLookup {
    pub fn new() -> Self {
        Self {
            table: ParameterTable::builtin(),
            calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(Error::catalog_unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl ParameterLookup for MockLookup {
    fn find_by_name(&self, name: &str) -> Result<Option<Parameter>> {
        self.check()?;
        self.table.find_by_name(name)
    }

    fn find_by_alias(&self, name: &str) -> Result<Option<Parameter>> {
        self.check()?;
        self.table.find_by_alias(name)
    }
}

/// Column as the Exchange reader leaves it before canonicalization
pub fn declared_column(name: &str, unit: Option<&str>, fields: &[&str]) -> Column {
    let mut column = Column::new(Parameter::declared(name, unit));
    for field in fields {
        column.append(Value::parse_field(field));
    }
    column
}

pub fn file_with(columns: Vec<Column>) -> DataFile {
    let mut file = DataFile::new();
    for column in columns {
        file.insert_column(column);
    }
    file
}

pub fn unit_of(file: &DataFile, mnemonic: &str) -> Option<String> {
    file.column(mnemonic)
        .and_then(|c| c.parameter.unit.as_ref())
        .map(|u: &Unit| u.mnemonic.clone())
}
