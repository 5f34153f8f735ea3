//! Data models for hydrographic processing
//!
//! This module contains the columnar data model: parameters and units, the
//! columns holding values and quality flags, files (one station/cast or one
//! cruise's bottle data) and collections of files.

pub mod value;

pub use value::{OutOfBand, Value, is_out_of_band};

use crate::app::services::unit_conversion::ConverterRegistry;
use crate::constants::{
    CONTRIVED_FORMAT, CONTRIVED_PREFIX, DISPLAY_ORDER_UNORDERED, FLAG_IGOSS_SUFFIX,
    FLAG_WOCE_SUFFIX, globals, mnemonics,
};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

// =============================================================================
// Unit
// =============================================================================

/// Unit of measure. Two units are the same unit iff their mnemonics match.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Descriptive name (e.g. "micromole/kilogram")
    pub name: String,

    /// Mnemonic as written in Exchange files (e.g. "UMOL/KG")
    pub mnemonic: String,
}

impl Unit {
    /// Create a unit whose name is its mnemonic
    pub fn new(mnemonic: impl Into<String>) -> Self {
        let mnemonic = mnemonic.into();
        Self {
            name: mnemonic.clone(),
            mnemonic,
        }
    }

    /// Create a unit with a descriptive name
    pub fn with_name(mnemonic: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mnemonic: mnemonic.into(),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.mnemonic == other.mnemonic
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// Parameter descriptor resolved from the catalog
///
/// Equality is by `name`. Each column owns its own copy; resolving or
/// converting one file never affects another file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Canonical mnemonic
    pub name: String,

    /// Human-readable name
    pub full_name: String,

    /// printf-style template used when writing values
    pub format: String,

    /// Expected unit
    pub unit: Option<Unit>,

    /// Lowest plausible value
    pub bound_lower: Option<Decimal>,

    /// Highest plausible value
    pub bound_upper: Option<Decimal>,

    /// Canonical column position; `DISPLAY_ORDER_UNORDERED` sorts last
    pub display_order: i64,

    /// Alternative mnemonics that resolve to this parameter
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Parameter {
    /// Create a catalog parameter
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        format: impl Into<String>,
        unit: Option<Unit>,
        display_order: i64,
    ) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            format: format.into(),
            unit,
            bound_lower: None,
            bound_upper: None,
            display_order,
            aliases: Vec::new(),
        }
    }

    /// Synthesize a contrived parameter, never looked up in the catalog
    pub fn contrived(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            format: CONTRIVED_FORMAT.to_string(),
            unit: None,
            bound_lower: None,
            bound_upper: None,
            display_order: DISPLAY_ORDER_UNORDERED,
            aliases: Vec::new(),
        }
    }

    /// Placeholder for a column read from a file before resolution,
    /// carrying the unit declared in the file
    pub fn declared(name: impl Into<String>, unit: Option<&str>) -> Self {
        let mut parameter = Self::contrived(name);
        parameter.unit = unit
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(Unit::new);
        parameter
    }

    /// Set the numeric bounds
    pub fn with_bounds(mut self, lower: Option<Decimal>, upper: Option<Decimal>) -> Self {
        self.bound_lower = lower;
        self.bound_upper = upper;
        self
    }

    /// Set the aliases
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Whether the name carries the private contrived prefix
    pub fn is_contrived(&self) -> bool {
        is_contrived_mnemonic(&self.name)
    }

    /// Mnemonic of the unit, if any
    pub fn unit_mnemonic(&self) -> Option<&str> {
        self.unit
            .as_ref()
            .map(|u| u.mnemonic.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Check a value against the numeric bounds (inclusive)
    pub fn is_in_range(&self, value: Decimal) -> bool {
        if let Some(lower) = self.bound_lower {
            if value < lower {
                return false;
            }
        }
        if let Some(upper) = self.bound_upper {
            if value > upper {
                return false;
            }
        }
        true
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Whether a mnemonic names a contrived parameter
pub fn is_contrived_mnemonic(mnemonic: &str) -> bool {
    mnemonic.starts_with(CONTRIVED_PREFIX)
}

/// Kind of a column named in an Exchange header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Woce,
    Igoss,
}

/// Split a header mnemonic into its base mnemonic and flag kind
pub fn split_flag_mnemonic(mnemonic: &str) -> Option<(&str, FlagKind)> {
    if let Some(base) = mnemonic.strip_suffix(FLAG_WOCE_SUFFIX) {
        Some((base, FlagKind::Woce))
    } else {
        mnemonic
            .strip_suffix(FLAG_IGOSS_SUFFIX)
            .map(|base| (base, FlagKind::Igoss))
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column of values with optional WOCE and IGOSS flags
///
/// A non-empty flag vector always has the same length as `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub parameter: Parameter,
    pub values: Vec<Option<Value>>,
    pub flags_woce: Vec<Option<i16>>,
    pub flags_igoss: Vec<Option<i16>>,
}

impl Column {
    /// Create an empty column
    pub fn new(parameter: Parameter) -> Self {
        Self {
            parameter,
            values: Vec::new(),
            flags_woce: Vec::new(),
            flags_igoss: Vec::new(),
        }
    }

    /// Create a column of `len` null values
    pub fn filled(parameter: Parameter, len: usize) -> Self {
        Self {
            parameter,
            values: vec![None; len],
            flags_woce: Vec::new(),
            flags_igoss: Vec::new(),
        }
    }

    /// Mnemonic of the column's parameter
    pub fn mnemonic(&self) -> &str {
        &self.parameter.name
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `None` when null or past the end
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Set the value (and optionally flags) at `index`, extending with nulls
    pub fn set(
        &mut self,
        index: usize,
        value: Option<Value>,
        flag_woce: Option<i16>,
        flag_igoss: Option<i16>,
    ) {
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
            Self::align(&mut self.flags_woce, self.values.len());
            Self::align(&mut self.flags_igoss, self.values.len());
        }
        self.values[index] = value;
        if flag_woce.is_some() {
            self.set_flag_woce(index, flag_woce);
        }
        if flag_igoss.is_some() {
            self.set_flag_igoss(index, flag_igoss);
        }
    }

    /// Append a value; existing flag vectors grow with a null flag
    pub fn append(&mut self, value: Option<Value>) {
        self.values.push(value);
        Self::align(&mut self.flags_woce, self.values.len());
        Self::align(&mut self.flags_igoss, self.values.len());
    }

    /// Set the WOCE flag of an existing row, creating the flag vector if needed
    pub fn set_flag_woce(&mut self, index: usize, flag: Option<i16>) {
        Self::set_flag(&mut self.flags_woce, self.values.len(), index, flag);
    }

    /// Set the IGOSS flag of an existing row, creating the flag vector if needed
    pub fn set_flag_igoss(&mut self, index: usize, flag: Option<i16>) {
        Self::set_flag(&mut self.flags_igoss, self.values.len(), index, flag);
    }

    fn set_flag(flags: &mut Vec<Option<i16>>, len: usize, index: usize, flag: Option<i16>) {
        if index >= len {
            return;
        }
        if flags.len() != len {
            flags.resize(len, None);
        }
        flags[index] = flag;
    }

    fn align(flags: &mut Vec<Option<i16>>, len: usize) {
        if !flags.is_empty() && flags.len() != len {
            flags.resize(len, None);
        }
    }

    /// Whether the column has any kind of flag
    pub fn is_flagged(&self) -> bool {
        self.is_flagged_woce() || self.is_flagged_igoss()
    }

    pub fn is_flagged_woce(&self) -> bool {
        !self.flags_woce.is_empty()
    }

    pub fn is_flagged_igoss(&self) -> bool {
        !self.flags_igoss.is_empty()
    }

    /// Whether both flag vectors are empty or as long as the values
    pub fn flags_aligned(&self) -> bool {
        let len = self.values.len();
        (self.flags_woce.is_empty() || self.flags_woce.len() == len)
            && (self.flags_igoss.is_empty() || self.flags_igoss.len() == len)
    }

    /// Whether every value is the same (trivially true when empty)
    pub fn is_global(&self) -> bool {
        match self.values.first() {
            Some(first) => self.values.iter().all(|v| v == first),
            None => true,
        }
    }

    /// Grow the column with nulls to `len` rows
    pub fn fill_to(&mut self, len: usize) {
        while self.values.len() < len {
            self.append(None);
        }
    }

    /// Copy of the column restricted to the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Column {
        let pick_flags = |flags: &[Option<i16>]| -> Vec<Option<i16>> {
            if flags.is_empty() {
                Vec::new()
            } else {
                indices.iter().map(|&i| flags[i]).collect()
            }
        };
        Column {
            parameter: self.parameter.clone(),
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
            flags_woce: pick_flags(&self.flags_woce),
            flags_igoss: pick_flags(&self.flags_igoss),
        }
    }
}

// =============================================================================
// DataFile
// =============================================================================

/// One file's worth of columns (a station/cast or a cruise's bottle data)
///
/// All columns have the same length, which is the file's row count.
#[derive(Debug, Clone, Default)]
pub struct DataFile {
    columns: BTreeMap<String, Column>,

    /// File-scoped metadata (stamp, header comments, single-valued fields)
    pub globals: BTreeMap<String, String>,

    /// Unit converters active for this file
    pub unit_converters: Option<Arc<ConverterRegistry>>,
}

impl DataFile {
    /// Create an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.values().next().map(Column::len).unwrap_or(0)
    }

    /// Whether the file has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, mnemonic: &str) -> Option<&Column> {
        self.columns.get(mnemonic)
    }

    pub fn column_mut(&mut self, mnemonic: &str) -> Option<&mut Column> {
        self.columns.get_mut(mnemonic)
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.columns.contains_key(mnemonic)
    }

    /// Insert a column keyed by its parameter name, returning any column it replaced
    pub fn insert_column(&mut self, column: Column) -> Option<Column> {
        self.columns.insert(column.parameter.name.clone(), column)
    }

    /// Insert a column under an explicit key
    pub fn insert_column_as(&mut self, mnemonic: impl Into<String>, column: Column) -> Option<Column> {
        self.columns.insert(mnemonic.into(), column)
    }

    pub fn remove_column(&mut self, mnemonic: &str) -> Option<Column> {
        self.columns.remove(mnemonic)
    }

    /// Get a column, creating a null-filled contrived one if it is absent
    pub fn ensure_column(&mut self, mnemonic: &str) -> &mut Column {
        let len = self.len();
        self.columns
            .entry(mnemonic.to_string())
            .or_insert_with(|| Column::filled(Parameter::contrived(mnemonic), len))
    }

    /// Create empty columns for header mnemonics, skipping flag columns and
    /// names already present
    pub fn create_columns(&mut self, mnemonics: &[String], units: Option<&[String]>) {
        for (i, mnemonic) in mnemonics.iter().enumerate() {
            if split_flag_mnemonic(mnemonic).is_some() || self.columns.contains_key(mnemonic) {
                continue;
            }
            let unit = units.and_then(|u| u.get(i)).map(String::as_str);
            self.columns.insert(
                mnemonic.clone(),
                Column::new(Parameter::declared(mnemonic.as_str(), unit)),
            );
        }
    }

    /// Keys of all columns (storage order)
    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.values_mut()
    }

    /// Columns in canonical order: display order, then mnemonic
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.values().collect();
        columns.sort_by(|a, b| {
            a.parameter
                .display_order
                .cmp(&b.parameter.display_order)
                .then_with(|| a.parameter.name.cmp(&b.parameter.name))
        });
        columns
    }

    /// Parameter mnemonics in canonical order
    pub fn parameter_mnemonics(&self) -> Vec<String> {
        self.sorted_columns()
            .into_iter()
            .map(|c| c.parameter.name.clone())
            .collect()
    }

    /// Verify that every column has the file's length and aligned flags
    pub fn check_lengths(&self) -> Result<()> {
        let len = self.len();
        for (mnemonic, column) in &self.columns {
            if column.len() != len {
                return Err(Error::configuration(format!(
                    "Column '{}' has {} values but the file has {} rows",
                    mnemonic,
                    column.len(),
                    len
                )));
            }
            if !column.flags_aligned() {
                return Err(Error::configuration(format!(
                    "Column '{}' has flags that are not aligned with its values",
                    mnemonic
                )));
            }
        }
        Ok(())
    }

    /// Order-preserving unique expocodes
    pub fn expocodes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.column(mnemonics::EXPOCODE)
            .map(|c| {
                c.values
                    .iter()
                    .flatten()
                    .map(|v| v.to_string())
                    .filter(|v| seen.insert(v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stamp(&self) -> Option<&str> {
        self.globals.get(globals::STAMP).map(String::as_str)
    }

    pub fn header(&self) -> Option<&str> {
        self.globals.get(globals::HEADER).map(String::as_str)
    }

    /// Copy of the file restricted to the given rows, sharing metadata
    pub fn select_rows(&self, indices: &[usize]) -> DataFile {
        DataFile {
            columns: self
                .columns
                .iter()
                .map(|(k, c)| (k.clone(), c.select_rows(indices)))
                .collect(),
            globals: self.globals.clone(),
            unit_converters: self.unit_converters.clone(),
        }
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Ordered files sharing provenance (e.g. one cruise's casts)
#[derive(Debug, Clone, Default)]
pub struct FileCollection {
    pub files: Vec<DataFile>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: DataFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Stamps of all files
    pub fn stamps(&self) -> Vec<Option<&str>> {
        self.files.iter().map(DataFile::stamp).collect()
    }
}

impl From<Vec<DataFile>> for FileCollection {
    fn from(files: Vec<DataFile>) -> Self {
        Self { files }
    }
}

/// Either a single file or a collection, resolved once at the boundary
#[derive(Debug, Clone)]
pub enum DataSource {
    Single(DataFile),
    Collection(FileCollection),
}

impl DataSource {
    /// All files, in order
    pub fn files(&self) -> Vec<&DataFile> {
        match self {
            DataSource::Single(file) => vec![file],
            DataSource::Collection(collection) => collection.files.iter().collect(),
        }
    }

    /// All files, mutably
    pub fn files_mut(&mut self) -> Vec<&mut DataFile> {
        match self {
            DataSource::Single(file) => vec![file],
            DataSource::Collection(collection) => collection.files.iter_mut().collect(),
        }
    }

    pub fn into_files(self) -> Vec<DataFile> {
        match self {
            DataSource::Single(file) => vec![file],
            DataSource::Collection(collection) => collection.files,
        }
    }

    /// Union of parameter mnemonics over all files, first appearance first
    pub fn parameter_mnemonics(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.files()
            .into_iter()
            .flat_map(DataFile::parameter_mnemonics)
            .filter(|m| seen.insert(m.clone()))
            .collect()
    }
}
