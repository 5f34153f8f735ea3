//! Reordering and pruning columns, sorting rows

use std::cmp::Ordering;
use std::str::FromStr;
use tracing::{debug, warn};

use super::row_key;
use crate::app::models::{DataFile, Value};
use crate::constants::{CAST_KEY_COLUMNS, mnemonics};
use crate::{Error, Result};

/// Give listed columns the listed order and drop every other column
///
/// Listed mnemonics get `display_order = index - order.len()`, placing them
/// before all catalog orders. `DATE` and `TIME` entries position the fused
/// `_DATETIME` column. Returns the removed column keys.
pub fn reorder_columns<S: AsRef<str>>(file: &mut DataFile, order: &[S]) -> Vec<String> {
    let len = order.len() as i64;
    let mut keep: Vec<String> = Vec::new();

    for (index, mnemonic) in order.iter().enumerate() {
        let mnemonic = mnemonic.as_ref();
        let key = if mnemonic == mnemonics::DATE || mnemonic == mnemonics::TIME {
            mnemonics::DATETIME
        } else {
            mnemonic
        };
        if keep.iter().any(|k| k == key) {
            continue;
        }
        match file.column_mut(key) {
            Some(column) => {
                column.parameter.display_order = index as i64 - len;
                keep.push(key.to_string());
            }
            None => warn!("Cannot order '{}': no such column", mnemonic),
        }
    }

    let removed: Vec<String> = file
        .mnemonics()
        .filter(|m| !keep.iter().any(|k| k == m))
        .map(str::to_string)
        .collect();
    for mnemonic in &removed {
        file.remove_column(mnemonic);
    }
    debug!("Reordered {} columns, removed {}", keep.len(), removed.len());
    removed
}

/// A row sort criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub mnemonic: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            descending: false,
        }
    }

    pub fn descending(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            descending: true,
        }
    }

    /// Increasing pressure, then decreasing bottle number
    pub fn surface_to_bottom() -> Vec<SortKey> {
        vec![
            Self::ascending(mnemonics::CTDPRS),
            Self::descending(mnemonics::BTLNBR),
        ]
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// `CTDPRS` sorts ascending, `-BTLNBR` descending
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (mnemonic, descending) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if mnemonic.is_empty() {
            return Err(Error::configuration(format!("Invalid sort key '{}'", s)));
        }
        Ok(Self {
            mnemonic: mnemonic.to_string(),
            descending,
        })
    }
}

/// Order two cells; nulls always sort last
fn compare_cells(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    };
    if descending { ordering.reverse() } else { ordering }
}

/// Stable-sort rows within each station/cast run
///
/// Keys naming absent columns are ignored; a file without station and cast
/// columns is sorted as a single run. Returns the number of runs sorted.
pub fn sort_rows(file: &mut DataFile, keys: &[SortKey]) -> usize {
    let keys: Vec<&SortKey> = keys
        .iter()
        .filter(|k| {
            let present = file.contains(&k.mnemonic);
            if !present {
                debug!("No '{}' column to sort on", k.mnemonic);
            }
            present
        })
        .collect();
    if keys.is_empty() || file.is_empty() {
        return 0;
    }

    let by_cast = CAST_KEY_COLUMNS.iter().all(|k| file.contains(k));
    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut previous: Option<Vec<String>> = None;
    for row in 0..file.len() {
        let cast = if by_cast {
            Some(row_key(file, CAST_KEY_COLUMNS, row))
        } else {
            None
        };
        if runs.is_empty() || (by_cast && cast != previous) {
            runs.push(Vec::new());
        }
        if let Some(run) = runs.last_mut() {
            run.push(row);
        }
        previous = cast;
    }

    let mut order = Vec::with_capacity(file.len());
    for mut run in runs.iter().cloned() {
        run.sort_by(|&a, &b| {
            keys.iter().fold(Ordering::Equal, |ordering, key| {
                ordering.then_with(|| {
                    let column = file.column(&key.mnemonic);
                    compare_cells(
                        column.and_then(|c| c.get(a)),
                        column.and_then(|c| c.get(b)),
                        key.descending,
                    )
                })
            })
        });
        order.extend(run);
    }

    *file = file.select_rows(&order);
    runs.len()
}
