//! Merging a derivative file onto an origin file by key columns

use std::collections::HashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{describe_key, key_value, require_columns, row_key};
use crate::app::models::{Column, DataFile};
use crate::constants::mnemonics;
use crate::{Error, Result};

/// Outcome of a merge
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Parameters that were merged
    pub parameters: Vec<String>,

    /// Origin rows that received derivative values
    pub merged_rows: usize,

    /// Columns created in the origin
    pub created_columns: Vec<String>,

    /// Requested parameters the derivative does not have
    pub missing_in_derivative: Vec<String>,

    /// Per-row `NoMatch` and `AmbiguousKey` problems
    pub issues: Vec<Error>,
}

impl MergeReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{} parameters merged into {} rows, {} columns created, {} unmatched rows",
            self.parameters.len(),
            self.merged_rows,
            self.created_columns.len(),
            self.issues.len()
        )
    }
}

/// How two files' columns compare over rows matched by key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnDiff {
    /// In both files with differing values or flags
    pub different: Vec<String>,
    /// Only in the derivative
    pub not_in_origin: Vec<String>,
    /// Only in the origin
    pub not_in_derivative: Vec<String>,
    /// In both files with identical data
    pub common: Vec<String>,
}

impl ColumnDiff {
    /// Parameters a merge would change
    pub fn mergeable(&self) -> Vec<String> {
        self.different
            .iter()
            .chain(&self.not_in_origin)
            .cloned()
            .collect()
    }
}

/// Origin rows by key tuple
fn index_rows<S: AsRef<str>>(file: &DataFile, keys: &[S]) -> HashMap<Vec<String>, Vec<usize>> {
    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..file.len() {
        index.entry(row_key(file, keys, row)).or_default().push(row);
    }
    index
}

/// Overwrite `parameters` of origin rows with the matching derivative rows
///
/// Every derivative row must match exactly one origin row on the key
/// columns; rows that match none or several are reported and skipped.
/// Parameters missing from the origin are created null-filled. Flags are
/// overwritten when the derivative carries them.
pub fn merge_by_key<S: AsRef<str>>(
    origin: &mut DataFile,
    derivative: &DataFile,
    keys: &[S],
    parameters: &[String],
) -> Result<MergeReport> {
    require_columns(origin, keys)?;
    require_columns(derivative, keys)?;

    let mut report = MergeReport::default();
    let parameters: Vec<String> = parameters
        .iter()
        .filter(|p| !keys.iter().any(|k| k.as_ref() == p.as_str()))
        .cloned()
        .collect();

    let origin_len = origin.len();
    for parameter in &parameters {
        let Some(source) = derivative.column(parameter) else {
            warn!("Derivative has no '{}' column; not merging it", parameter);
            report.missing_in_derivative.push(parameter.clone());
            continue;
        };
        match origin.column_mut(parameter) {
            Some(target) => {
                if target.parameter.unit != source.parameter.unit {
                    warn!(
                        "Units of '{}' differ between files; using the derivative's",
                        parameter
                    );
                    target.parameter = source.parameter.clone();
                }
            }
            None => {
                debug!("Creating '{}' in origin", parameter);
                origin.insert_column_as(
                    parameter.clone(),
                    Column::filled(source.parameter.clone(), origin_len),
                );
                report.created_columns.push(parameter.clone());
            }
        }
        report.parameters.push(parameter.clone());
    }

    let index = index_rows(origin, keys);
    for row in 0..derivative.len() {
        let key = row_key(derivative, keys, row);
        let target_row = match index.get(&key).map(Vec::as_slice) {
            Some([single]) => *single,
            Some(matches) if !matches.is_empty() => {
                report.issues.push(Error::ambiguous_key(
                    row + 1,
                    describe_key(keys, &key),
                    matches.len(),
                ));
                continue;
            }
            _ => {
                report
                    .issues
                    .push(Error::no_match(row + 1, describe_key(keys, &key)));
                continue;
            }
        };

        for parameter in &report.parameters {
            let (Some(source), Some(target)) =
                (derivative.column(parameter), origin.column_mut(parameter))
            else {
                continue;
            };
            target.values[target_row] = source.values[row].clone();
            if source.is_flagged_woce() {
                target.set_flag_woce(target_row, source.flags_woce[row]);
            }
            if source.is_flagged_igoss() {
                target.set_flag_igoss(target_row, source.flags_igoss[row]);
            }
        }
        report.merged_rows += 1;
    }

    for issue in &report.issues {
        warn!("{}", issue);
    }
    info!("Merge: {}", report.summary());
    Ok(report)
}

/// Compare the non-key columns of two files over rows matched by key
///
/// Rows without a unique match in the origin are ignored.
pub fn different_columns<S: AsRef<str>>(
    origin: &DataFile,
    derivative: &DataFile,
    keys: &[S],
) -> Result<ColumnDiff> {
    require_columns(origin, keys)?;
    require_columns(derivative, keys)?;

    let is_key = |m: &str| keys.iter().any(|k| k.as_ref() == m);
    let index = index_rows(origin, keys);
    let pairs: Vec<(usize, usize)> = (0..derivative.len())
        .filter_map(|row| match index.get(&row_key(derivative, keys, row)) {
            Some(rows) if rows.len() == 1 => Some((rows[0], row)),
            _ => None,
        })
        .collect();

    let mut diff = ColumnDiff::default();
    for mnemonic in derivative.mnemonics().filter(|m| !is_key(*m)) {
        let (Some(theirs), Some(ours)) = (derivative.column(mnemonic), origin.column(mnemonic))
        else {
            diff.not_in_origin.push(mnemonic.to_string());
            continue;
        };
        let flag = |flags: &[Option<i16>], row: usize| flags.get(row).copied().flatten();
        let differs = pairs.iter().any(|&(o, d)| {
            key_value(ours.get(o)) != key_value(theirs.get(d))
                || flag(&ours.flags_woce, o) != flag(&theirs.flags_woce, d)
                || flag(&ours.flags_igoss, o) != flag(&theirs.flags_igoss, d)
        });
        if differs {
            diff.different.push(mnemonic.to_string());
        } else {
            diff.common.push(mnemonic.to_string());
        }
    }
    diff.not_in_derivative = origin
        .mnemonics()
        .filter(|m| !is_key(*m) && !derivative.contains(*m))
        .map(str::to_string)
        .collect();
    Ok(diff)
}

/// Pick bottle key columns present in both files that identify origin rows
/// uniquely
pub fn guess_bottle_keys(origin: &DataFile, derivative: &DataFile) -> Option<Vec<String>> {
    let candidates: [&[&str]; 3] = [
        &[mnemonics::STNNBR, mnemonics::CASTNO, mnemonics::SAMPNO],
        &[mnemonics::STNNBR, mnemonics::CASTNO, mnemonics::BTLNBR],
        &[
            mnemonics::STNNBR,
            mnemonics::CASTNO,
            mnemonics::SAMPNO,
            mnemonics::BTLNBR,
        ],
    ];
    for keys in candidates {
        if require_columns(origin, keys).is_err() || require_columns(derivative, keys).is_err() {
            continue;
        }
        if index_rows(origin, keys).values().all(|rows| rows.len() == 1) {
            debug!("Guessed merge keys {:?}", keys);
            return Some(keys.iter().map(|k| k.to_string()).collect());
        }
    }
    None
}
