//! Exchange file reader

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::datetime::fuse_datetime;
use super::stamp::{parse_stamp_line, stamp_pattern};
use super::stats::{ReadResult, ReadStats};
use crate::app::models::{
    Column, DataFile, FlagKind, OutOfBand, Parameter, Value, split_flag_mnemonic,
};
use crate::app::models::value::parse_decimal;
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::app::services::unit_conversion::{
    ConversionOptions, ConversionPolicy, ConverterRegistry,
};
use crate::config::{ConversionPolicyMode, ExchangeConfig};
use crate::constants::{END_DATA, globals, mnemonics};
use crate::{Error, Result};
use rust_decimal::prelude::ToPrimitive;

/// Where a header field's values go
enum FieldTarget {
    Value(String),
    Flag(String, FlagKind),
    Skip,
}

/// Reader for bottle Exchange files
///
/// Parameters are resolved against the catalog at the end of every read;
/// mismatched units are converted only when the policy allows it.
pub struct ExchangeReader<'a> {
    catalog: &'a ParameterCatalog,
    config: &'a ExchangeConfig,
    converters: Arc<ConverterRegistry>,
    policy: ConversionPolicy,
    options: ConversionOptions,
}

impl<'a> ExchangeReader<'a> {
    /// Create a reader using the per-litre to per-kilogram converters
    pub fn new(catalog: &'a ParameterCatalog, config: &'a ExchangeConfig) -> Self {
        let policy = match config.conversion_policy {
            ConversionPolicyMode::Always => ConversionPolicy::Always,
            // Asking needs a prompt, supplied with `with_policy`
            ConversionPolicyMode::Skip | ConversionPolicyMode::Ask => ConversionPolicy::Skip,
        };
        Self {
            catalog,
            config,
            converters: Arc::new(ConverterRegistry::per_litre_to_per_kg()),
            policy,
            options: ConversionOptions::default(),
        }
    }

    /// Use a different converter registry for files read
    pub fn with_converters(mut self, converters: Arc<ConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_policy(mut self, policy: ConversionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Read a file from any buffered source
    pub fn read<R: BufRead>(&self, source: R) -> Result<DataFile> {
        self.read_with_stats(source).map(|result| result.file)
    }

    /// Read a file from disk
    pub fn read_path(&self, path: &Path) -> Result<DataFile> {
        self.read_path_with_stats(path).map(|result| result.file)
    }

    /// Read a file from disk, keeping statistics and the resolution report
    pub fn read_path_with_stats(&self, path: &Path) -> Result<ReadResult> {
        info!("Reading Exchange file: {}", path.display());
        let file = File::open(path)
            .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
        self.read_with_stats(BufReader::new(file))
    }

    /// Read a file, keeping statistics and the resolution report
    pub fn read_with_stats<R: BufRead>(&self, source: R) -> Result<ReadResult> {
        let mut stats = ReadStats::new();
        let mut file = DataFile::new();
        let mut lines = source.lines();
        let mut line_no = 0;

        let mut next_line = |line_no: &mut usize| -> Result<Option<String>> {
            match lines.next() {
                Some(line) => {
                    *line_no += 1;
                    line.map(Some)
                        .map_err(|e| Error::io(format!("Failed to read line {}", line_no), e))
                }
                None => Ok(None),
            }
        };

        // Stamp
        let pattern = stamp_pattern(&self.config.identifier)?;
        let first = next_line(&mut line_no)?.ok_or_else(|| Error::malformed_header(1, "empty file"))?;
        let stamp = parse_stamp_line(&pattern, &first).ok_or_else(|| {
            Error::malformed_header(
                1,
                format!(
                    "expected stamp line like '{},YYYYMMDDdivINSwho'",
                    self.config.identifier
                ),
            )
        })?;
        file.globals.insert(globals::STAMP.to_string(), stamp);

        // Comments, then the column header
        let mut header = String::new();
        let columns_line = loop {
            let line = next_line(&mut line_no)?
                .ok_or_else(|| Error::malformed_header(line_no + 1, "missing column header"))?;
            if line.starts_with('#') {
                header.push_str(&line);
                header.push('\n');
                stats.header_lines += 1;
            } else {
                break line;
            }
        };
        if !header.is_empty() {
            file.globals.insert(globals::HEADER.to_string(), header);
        }

        let columns: Vec<String> = columns_line.split(',').map(|c| c.trim().to_string()).collect();
        let columns_line_no = line_no;
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::duplicate_column(columns_line_no, column.clone()));
            }
        }
        check_identifiers(&seen, columns_line_no)?;

        let units_line = next_line(&mut line_no)?
            .ok_or_else(|| Error::malformed_header(line_no + 1, "missing units row"))?;
        let units: Vec<String> = units_line.split(',').map(|u| u.trim().to_string()).collect();
        if units.len() != columns.len() {
            return Err(Error::column_count_mismatch(line_no, columns.len(), units.len()));
        }

        file.create_columns(&columns, Some(&units));
        let targets: Vec<FieldTarget> = columns
            .iter()
            .map(|name| match split_flag_mnemonic(name) {
                Some((base, kind)) if file.contains(base) => {
                    FieldTarget::Flag(base.to_string(), kind)
                }
                Some(_) => {
                    warn!("Flag column '{}' has no parameter column; skipping it", name);
                    stats.orphan_flag_columns.push(name.clone());
                    FieldTarget::Skip
                }
                None => FieldTarget::Value(name.clone()),
            })
            .collect();

        // Data
        let oob = &self.config.out_of_band;
        while let Some(line) = next_line(&mut line_no)? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                stats.blank_lines += 1;
                continue;
            }
            if trimmed.starts_with(END_DATA) {
                stats.terminated = true;
                break;
            }

            let fields: Vec<&str> = line.split(',').collect();
            let row = stats.data_rows;
            if fields.len() != columns.len() {
                return Err(Error::row_count_mismatch(
                    row + 1,
                    line_no,
                    columns.len(),
                    fields.len(),
                ));
            }

            for (target, raw) in targets.iter().zip(&fields) {
                if let FieldTarget::Value(name) = target {
                    let value = Value::parse_field(raw);
                    let value = if matches!(value, Some(Value::Number(_))) && oob.is_out_of_band(value.as_ref()) {
                        stats.out_of_band_fields += 1;
                        None
                    } else {
                        value
                    };
                    if let Some(column) = file.column_mut(name) {
                        column.append(value);
                    }
                }
            }
            for (target, raw) in targets.iter().zip(&fields) {
                if let FieldTarget::Flag(base, kind) = target {
                    let flag = parse_flag(raw, oob, &mut stats, line_no);
                    if let Some(column) = file.column_mut(base) {
                        match kind {
                            FlagKind::Woce => column.set_flag_woce(row, flag),
                            FlagKind::Igoss => column.set_flag_igoss(row, flag),
                        }
                    }
                }
            }
            stats.data_rows += 1;
        }
        if !stats.terminated {
            warn!("File ended without {}", END_DATA);
        }

        self.fuse_dates(&mut file, &mut stats);
        coerce_coordinates(&mut file);
        debug!("Decoded {}", stats.summary());

        file.unit_converters = Some(Arc::clone(&self.converters));
        let report = self
            .catalog
            .check_and_replace(&mut file, &self.policy, &self.options)?;

        info!(
            "Read {} rows and {} columns",
            file.len(),
            file.column_count()
        );
        Ok(ReadResult { file, stats, report })
    }

    /// Replace DATE and TIME by a fused `_DATETIME` column
    ///
    /// The fused column is only kept when at least one row has a date.
    fn fuse_dates(&self, file: &mut DataFile, stats: &mut ReadStats) {
        file.ensure_column(mnemonics::DATE);
        file.ensure_column(mnemonics::TIME);
        let (Some(date), Some(time)) = (
            file.remove_column(mnemonics::DATE),
            file.remove_column(mnemonics::TIME),
        ) else {
            return;
        };

        let mut fused = Column::new(Parameter::contrived(mnemonics::DATETIME));
        for row in 0..date.len() {
            let value = fuse_datetime(date.get(row), time.get(row));
            if value.is_none() && date.get(row).is_some() {
                debug!("Unparsable date/time at data row {}", row + 1);
                stats.unparsable_datetimes += 1;
            }
            fused.append(value.map(Value::DateTime));
        }
        if stats.unparsable_datetimes > 0 {
            warn!(
                "{} rows have an unparsable DATE/TIME",
                stats.unparsable_datetimes
            );
        }
        if fused.values.iter().any(Option::is_some) {
            file.insert_column(fused);
        }
    }
}

/// A bottle file keyed by cruise, station and cast needs a bottle key too
fn check_identifiers(columns: &HashSet<&str>, line: usize) -> Result<()> {
    let cast_keyed = [mnemonics::EXPOCODE, mnemonics::STNNBR, mnemonics::CASTNO]
        .iter()
        .all(|c| columns.contains(c));
    if cast_keyed && !columns.contains(mnemonics::SAMPNO) && !columns.contains(mnemonics::BTLNBR)
    {
        return Err(Error::missing_identifier(line));
    }
    Ok(())
}

fn parse_flag(raw: &str, oob: &OutOfBand, stats: &mut ReadStats, line: usize) -> Option<i16> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || oob.is_out_of_band_str(trimmed) {
        return None;
    }
    let flag = parse_decimal(trimmed)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i16());
    if flag.is_none() {
        debug!("Invalid flag '{}' at line {}", trimmed, line);
        stats.invalid_flags += 1;
    }
    flag
}

fn coerce_coordinates(file: &mut DataFile) {
    for mnemonic in [mnemonics::LATITUDE, mnemonics::LONGITUDE] {
        let Some(column) = file.column_mut(mnemonic) else {
            continue;
        };
        for (row, cell) in column.values.iter_mut().enumerate() {
            if let Some(value) = cell.take() {
                let shown = value.to_string();
                *cell = value.into_numeric();
                if cell.is_none() {
                    warn!("Non-numeric {} '{}' at data row {}", mnemonic, shown, row + 1);
                }
            }
        }
    }
}
