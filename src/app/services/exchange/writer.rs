//! Exchange file writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use super::datetime::split_datetime;
use super::format::PrintFormat;
use super::stamp::generate_stamp;
use crate::app::models::{Column, DataFile, Parameter, Value};
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::config::ExchangeConfig;
use crate::constants::{
    DISPLAY_ORDER_UNORDERED, END_DATA, FLAG_FORMAT, FLAG_IGOSS_SUFFIX, FLAG_WOCE_SUFFIX,
    INTEGER_IDENTIFIER_COLUMNS, mnemonics,
};
use crate::{Error, Result};

/// One output column: a value column or a flag sub-column
struct OutputColumn<'f> {
    name: String,
    unit: String,
    format: Option<PrintFormat>,
    cells: Cells<'f>,
}

enum Cells<'f> {
    Values(&'f [Option<Value>]),
    Owned(Vec<Option<Value>>),
    Flags(&'f [Option<i16>]),
}

/// Writer for bottle Exchange files
pub struct ExchangeWriter<'a> {
    catalog: &'a ParameterCatalog,
    config: &'a ExchangeConfig,
}

impl<'a> ExchangeWriter<'a> {
    pub fn new(catalog: &'a ParameterCatalog, config: &'a ExchangeConfig) -> Self {
        Self { catalog, config }
    }

    /// Write a file to disk
    pub fn write_path(&self, file: &DataFile, path: &Path) -> Result<()> {
        info!("Writing Exchange file: {}", path.display());
        let out = File::create(path)
            .map_err(|e| Error::io(format!("Failed to create {}", path.display()), e))?;
        let mut out = BufWriter::new(out);
        self.write(file, &mut out)?;
        out.flush()
            .map_err(|e| Error::io(format!("Failed to flush {}", path.display()), e))
    }

    /// Render a file as a string
    pub fn to_string(&self, file: &DataFile) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(file, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::format("utf-8", format!("invalid output: {}", e)))
    }

    /// Write a file to any sink
    pub fn write<W: Write>(&self, file: &DataFile, mut out: W) -> Result<()> {
        let io = |e: std::io::Error| Error::io("Failed to write Exchange output", e);

        let stamp = match file.stamp() {
            Some(stamp) => stamp.to_string(),
            None => {
                let stamp =
                    generate_stamp(&self.config.stamp_institution, &self.config.stamp_person);
                warn!("File has no stamp; using {}", stamp);
                stamp
            }
        };
        writeln!(out, "{},{}", self.config.identifier, stamp).map_err(io)?;

        if let Some(header) = file.header().filter(|h| !h.is_empty()) {
            out.write_all(header.as_bytes()).map_err(io)?;
            if !header.ends_with('\n') {
                writeln!(out).map_err(io)?;
            }
        }

        let columns = self.output_columns(file);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let units: Vec<&str> = columns.iter().map(|c| c.unit.as_str()).collect();
        writeln!(out, "{}", names.join(",")).map_err(io)?;
        writeln!(out, "{}", units.join(",")).map_err(io)?;

        let fill = Value::from(self.config.fill_value);
        for row in 0..file.len() {
            let fields: Vec<String> = columns
                .iter()
                .map(|column| self.format_cell(column, row, &fill))
                .collect();
            writeln!(out, "{}", fields.join(",")).map_err(io)?;
        }
        writeln!(out, "{}", END_DATA).map_err(io)?;

        debug!("Wrote {} rows and {} columns", file.len(), columns.len());
        Ok(())
    }

    fn format_cell(&self, column: &OutputColumn<'_>, row: usize, fill: &Value) -> String {
        let cell = match &column.cells {
            Cells::Values(values) => values.get(row).cloned().flatten(),
            Cells::Owned(values) => values.get(row).cloned().flatten(),
            Cells::Flags(flags) => flags
                .get(row)
                .copied()
                .flatten()
                .map(|f| Value::from(i64::from(f))),
        };
        let value = cell.as_ref().unwrap_or(fill);
        match &column.format {
            Some(format) => format.format(value).unwrap_or_else(|e| {
                warn!("{} at row {} of '{}'; writing raw value", e, row + 1, column.name);
                value.to_string()
            }),
            None => value.to_string(),
        }
    }

    /// Columns in display order, with DATE/TIME split out of `_DATETIME`
    /// and flag sub-columns following their value column
    fn output_columns<'f>(&self, file: &'f DataFile) -> Vec<OutputColumn<'f>> {
        let mut value_columns: Vec<(i64, String, OutputColumn<'f>, Option<&'f Column>)> =
            Vec::new();

        for column in file.columns() {
            if column.parameter.name == mnemonics::DATETIME {
                continue;
            }
            let cells = if INTEGER_IDENTIFIER_COLUMNS.contains(&column.parameter.name.as_str()) {
                Cells::Owned(
                    column
                        .values
                        .iter()
                        .map(|v| v.as_ref().map(Value::truncated))
                        .collect(),
                )
            } else {
                Cells::Values(&column.values)
            };
            value_columns.push((
                column.parameter.display_order,
                column.parameter.name.clone(),
                OutputColumn {
                    name: column.parameter.name.clone(),
                    unit: column.parameter.unit_mnemonic().unwrap_or("").to_string(),
                    format: parse_format(&column.parameter),
                    cells,
                },
                Some(column),
            ));
        }

        if let Some(datetime) = file.column(mnemonics::DATETIME) {
            if datetime.values.iter().any(Option::is_some) {
                let (dates, times): (Vec<_>, Vec<_>) = datetime
                    .values
                    .iter()
                    .map(|v| match v {
                        Some(Value::DateTime(dt)) => {
                            let (date, time) = split_datetime(dt);
                            (Some(date), Some(time))
                        }
                        _ => (None, None),
                    })
                    .unzip();
                let reordered = datetime.parameter.display_order != DISPLAY_ORDER_UNORDERED;
                for (name, cells) in [(mnemonics::DATE, dates), (mnemonics::TIME, times)] {
                    let parameter = self.date_parameter(name);
                    let order = if reordered {
                        datetime.parameter.display_order
                    } else {
                        parameter.display_order
                    };
                    value_columns.push((
                        order,
                        name.to_string(),
                        OutputColumn {
                            name: name.to_string(),
                            unit: parameter.unit_mnemonic().unwrap_or("").to_string(),
                            format: parse_format(&parameter),
                            cells: Cells::Owned(cells),
                        },
                        None,
                    ));
                }
            }
        }

        value_columns.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let flag_format = FLAG_FORMAT.parse::<PrintFormat>().ok();
        let mut output = Vec::new();
        for (_, name, column, source) in value_columns {
            output.push(column);
            let Some(source) = source else {
                continue;
            };
            if source.is_flagged_woce() {
                output.push(OutputColumn {
                    name: format!("{}{}", name, FLAG_WOCE_SUFFIX),
                    unit: String::new(),
                    format: flag_format.clone(),
                    cells: Cells::Flags(&source.flags_woce),
                });
            }
            if source.is_flagged_igoss() {
                output.push(OutputColumn {
                    name: format!("{}{}", name, FLAG_IGOSS_SUFFIX),
                    unit: String::new(),
                    format: flag_format.clone(),
                    cells: Cells::Flags(&source.flags_igoss),
                });
            }
        }
        output
    }

    /// Catalog definition of DATE or TIME, or a contrived stand-in
    fn date_parameter(&self, name: &str) -> Parameter {
        self.catalog.resolve(name).unwrap_or_else(|e| {
            debug!("{}; writing {} as text", e, name);
            Parameter::contrived(name)
        })
    }
}

fn parse_format(parameter: &Parameter) -> Option<PrintFormat> {
    match parameter.format.parse::<PrintFormat>() {
        Ok(format) => Some(format),
        Err(e) => {
            warn!("{}; '{}' will be written raw", e, parameter.name);
            None
        }
    }
}
