//! Parameter lookup contract and the table-backed implementation
//!
//! The catalog only ever talks to a `ParameterLookup`. A relational or remote
//! parameter store implements the same two calls; `ParameterTable` serves the
//! built-in table and CSV parameter tables.

use crate::app::models::{Parameter, Unit, value::parse_decimal};
use crate::constants::DISPLAY_ORDER_UNORDERED;
use crate::{Error, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Read-only parameter lookup
///
/// `Ok(None)` is a definitive miss; `Err` means the backing store failed.
pub trait ParameterLookup: Send + Sync {
    /// Find a parameter by its canonical name
    fn find_by_name(&self, name: &str) -> Result<Option<Parameter>>;

    /// Find a parameter by one of its aliases
    fn find_by_alias(&self, name: &str) -> Result<Option<Parameter>>;
}

/// Statistics about loading a parameter table
#[derive(Debug, Clone, Default)]
pub struct CatalogLoadStats {
    /// Data rows read from the table
    pub rows_read: usize,

    /// Parameters loaded
    pub parameters_loaded: usize,

    /// Aliases registered
    pub aliases_loaded: usize,

    /// Rows skipped because they were malformed
    pub rows_skipped: usize,

    /// Time taken to load the table
    pub load_duration: Duration,

    /// Problems encountered while loading
    pub errors: Vec<String>,
}

impl CatalogLoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any rows were rejected
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line summary of the load
    pub fn summary(&self) -> String {
        format!(
            "Read {} rows, loaded {} parameters and {} aliases ({} skipped) in {:.2}s",
            self.rows_read,
            self.parameters_loaded,
            self.aliases_loaded,
            self.rows_skipped,
            self.load_duration.as_secs_f64()
        )
    }
}

/// In-memory parameter table indexed by name and alias
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    by_name: HashMap<String, Parameter>,
    by_alias: HashMap<String, String>,
}

/// Column order of CSV parameter tables
const CSV_HEADER: [&str; 9] = [
    "name",
    "full_name",
    "format",
    "unit",
    "unit_name",
    "bound_lower",
    "bound_upper",
    "display_order",
    "aliases",
];

impl ParameterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and its aliases, replacing any parameter of the same name
    pub fn insert(&mut self, parameter: Parameter) {
        for alias in &parameter.aliases {
            if let Some(previous) = self.by_alias.insert(alias.clone(), parameter.name.clone()) {
                if previous != parameter.name {
                    warn!(
                        "Alias '{}' moved from '{}' to '{}'",
                        alias, previous, parameter.name
                    );
                }
            }
        }
        self.by_name.insert(parameter.name.clone(), parameter);
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Number of aliases
    pub fn alias_count(&self) -> usize {
        self.by_alias.len()
    }

    /// Parameters sorted by display order
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut parameters: Vec<&Parameter> = self.by_name.values().collect();
        parameters.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        parameters
    }

    /// Load a CSV parameter table from disk
    pub fn load_csv(path: &Path) -> Result<(Self, CatalogLoadStats)> {
        info!("Loading parameter table from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| {
            Error::io(format!("Failed to open parameter table {}", path.display()), e)
        })?;
        Self::from_csv_reader(file, &path.display().to_string())
    }

    /// Load a CSV parameter table from any reader
    ///
    /// Malformed rows are skipped with a warning and counted in the stats.
    pub fn from_csv_reader<R: Read>(reader: R, source: &str) -> Result<(Self, CatalogLoadStats)> {
        let start = Instant::now();
        let mut stats = CatalogLoadStats::new();
        let mut table = Self::new();

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::csv_parsing(source, "Failed to read table header", Some(e)))?
            .clone();
        let found: Vec<&str> = headers.iter().collect();
        if found != CSV_HEADER {
            return Err(Error::csv_parsing(
                source,
                format!("Expected header '{}', found '{}'", CSV_HEADER.join(","), found.join(",")),
                None,
            ));
        }

        for (index, record) in csv_reader.records().enumerate() {
            stats.rows_read += 1;
            let row = index + 2;
            let parsed = record
                .map_err(|e| e.to_string())
                .and_then(|record| parse_parameter_record(&record));
            match parsed {
                Ok(parameter) => {
                    debug!("Loaded parameter '{}' from row {}", parameter.name, row);
                    stats.aliases_loaded += parameter.aliases.len();
                    stats.parameters_loaded += 1;
                    table.insert(parameter);
                }
                Err(message) => {
                    warn!("Skipping row {} of {}: {}", row, source, message);
                    stats.rows_skipped += 1;
                    stats.errors.push(format!("row {}: {}", row, message));
                }
            }
        }

        stats.load_duration = start.elapsed();
        info!("{}", stats.summary());
        Ok((table, stats))
    }
}

fn optional_field<'a>(record: &'a StringRecord, index: usize) -> Option<&'a str> {
    record.get(index).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse one row of a CSV parameter table
fn parse_parameter_record(record: &StringRecord) -> std::result::Result<Parameter, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let name = optional_field(record, 0).ok_or("missing name")?;
    let format = optional_field(record, 2).unwrap_or("%11s");
    if !format.starts_with('%') {
        return Err(format!("format '{}' is not a print template", format));
    }

    let bound = |index: usize| -> std::result::Result<Option<rust_decimal::Decimal>, String> {
        match optional_field(record, index) {
            None => Ok(None),
            Some(text) => parse_decimal(text)
                .map(Some)
                .ok_or_else(|| format!("bound '{}' is not a number", text)),
        }
    };
    let bound_lower = bound(5)?;
    let bound_upper = bound(6)?;

    let display_order = match optional_field(record, 7) {
        None => DISPLAY_ORDER_UNORDERED,
        Some(text) => text
            .parse::<i64>()
            .map_err(|_| format!("display order '{}' is not an integer", text))?,
    };

    let unit = optional_field(record, 3).map(|mnemonic| match optional_field(record, 4) {
        Some(unit_name) => Unit::with_name(mnemonic, unit_name),
        None => Unit::new(mnemonic),
    });

    let aliases = optional_field(record, 8)
        .map(|text| {
            text.split(';')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut parameter = Parameter::new(
        name,
        optional_field(record, 1).unwrap_or(name),
        format,
        unit,
        display_order,
    )
    .with_bounds(bound_lower, bound_upper);
    parameter.aliases = aliases;
    Ok(parameter)
}

impl ParameterLookup for ParameterTable {
    fn find_by_name(&self, name: &str) -> Result<Option<Parameter>> {
        Ok(self.by_name.get(name).cloned())
    }

    fn find_by_alias(&self, name: &str) -> Result<Option<Parameter>> {
        Ok(self
            .by_alias
            .get(name)
            .and_then(|canonical| self.by_name.get(canonical))
            .cloned())
    }
}
