//! Splitting a file into casts and concatenating casts back together

use std::collections::HashSet;
use tracing::{debug, warn};

use super::{describe_key, require_columns, row_key};
use crate::Result;
use crate::app::models::{Column, DataFile, FileCollection};

/// Split a file into one file per contiguous run of equal key values
///
/// Files come out in order of appearance. Globals and converters are copied
/// to every part. A key that reappears after a different one starts a new
/// file and is warned about.
pub fn split_by_cast<S: AsRef<str>>(file: &DataFile, keys: &[S]) -> Result<FileCollection> {
    require_columns(file, keys)?;

    let mut collection = FileCollection::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut run: Vec<usize> = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for row in 0..file.len() {
        let key = row_key(file, keys, row);
        if current.as_ref() != Some(&key) {
            if !run.is_empty() {
                collection.push(file.select_rows(&run));
                run.clear();
            }
            if !seen.insert(key.clone()) {
                warn!(
                    "Cast {} appears again at row {}; it is split into a separate file",
                    describe_key(keys, &key),
                    row + 1
                );
            }
            current = Some(key);
        }
        run.push(row);
    }
    if !run.is_empty() {
        collection.push(file.select_rows(&run));
    }

    debug!("Split {} rows into {} casts", file.len(), collection.len());
    Ok(collection)
}

/// Join files row-wise
///
/// The result has the union of all columns; rows of a file lacking a column
/// are null. Globals and converters come from the first file.
pub fn concatenate(collection: &FileCollection) -> DataFile {
    let mut result = DataFile::new();
    if let Some(first) = collection.files.first() {
        result.globals = first.globals.clone();
        result.unit_converters = first.unit_converters.clone();
    }

    let mut offset = 0;
    for file in &collection.files {
        for key in file.mnemonics() {
            let Some(column) = file.column(key) else {
                continue;
            };
            if !result.contains(key) {
                result.insert_column_as(key, Column::filled(column.parameter.clone(), offset));
            }
            let Some(target) = result.column_mut(key) else {
                continue;
            };
            target.fill_to(offset);
            for row in 0..column.len() {
                target.append(column.values[row].clone());
                if column.is_flagged_woce() {
                    target.set_flag_woce(offset + row, column.flags_woce[row]);
                }
                if column.is_flagged_igoss() {
                    target.set_flag_igoss(offset + row, column.flags_igoss[row]);
                }
            }
        }
        offset += file.len();
        for column in result.columns_mut() {
            column.fill_to(offset);
        }
    }

    debug!(
        "Concatenated {} files into {} rows",
        collection.len(),
        result.len()
    );
    result
}
