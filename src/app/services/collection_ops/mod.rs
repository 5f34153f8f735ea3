//! Operations across rows and files
//!
//! Splitting a file into casts and joining them back, merging a derivative
//! file onto an origin file by key, and reordering columns and rows.

pub mod merge;
pub mod reorder;
pub mod split;

#[cfg(test)]
pub mod tests;

pub use merge::{ColumnDiff, MergeReport, different_columns, guess_bottle_keys, merge_by_key};
pub use reorder::{SortKey, reorder_columns, sort_rows};
pub use split::{concatenate, split_by_cast};

use crate::app::models::{DataFile, Value};
use crate::{Error, Result};

/// Comparable form of a key cell; `1` and `1.0` compare equal
pub(crate) fn key_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(d)) => d.normalize().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Key tuple of one row
pub(crate) fn row_key<S: AsRef<str>>(file: &DataFile, keys: &[S], row: usize) -> Vec<String> {
    keys.iter()
        .map(|k| key_value(file.column(k.as_ref()).and_then(|c| c.get(row))))
        .collect()
}

/// Human-readable key tuple, e.g. `(STNNBR=1, CASTNO=2)`
pub(crate) fn describe_key<S: AsRef<str>>(keys: &[S], values: &[String]) -> String {
    let parts: Vec<String> = keys
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}={}", k.as_ref(), v))
        .collect();
    format!("({})", parts.join(", "))
}

/// Fail with `MissingColumn` unless every key column exists
pub(crate) fn require_columns<S: AsRef<str>>(file: &DataFile, keys: &[S]) -> Result<()> {
    match keys.iter().find(|k| !file.contains(k.as_ref())) {
        Some(missing) => Err(Error::missing_column(missing.as_ref())),
        None => Ok(()),
    }
}
