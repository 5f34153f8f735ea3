//! Hydro Processor Library
//!
//! A Rust library for reading, canonicalizing, converting and writing
//! hydrographic bottle and CTD data in the WHP Exchange format.
//!
//! This library provides tools for:
//! - A columnar data model with missing-value and WOCE/IGOSS flag semantics
//! - Resolving free-form column mnemonics against a parameter catalog
//! - Precision-preserving unit conversions (e.g. ML/L oxygen to UMOL/KG)
//! - Reading and writing bit-exact Exchange files
//! - Splitting, merging and reordering casts across files
//! - Data quality checks on flags and fill values

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod collection_ops;
        pub mod exchange;
        pub mod parameter_catalog;
        pub mod quality_checks;
        pub mod unit_conversion;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod input;
}

// Re-export commonly used types
pub use app::models::{Column, DataFile, DataSource, FileCollection, Parameter, Unit, Value};
pub use config::Config;

/// Result type alias for the hydro processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for hydrographic data processing
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Stamp line missing or unparsable
    #[error("Malformed header at line {line}: {message}")]
    MalformedHeader { line: usize, message: String },

    /// Column header and units rows disagree
    #[error(
        "Expected as many columns as units at line {line}. Found {columns} columns and {units} units"
    )]
    ColumnCountMismatch {
        line: usize,
        columns: usize,
        units: usize,
    },

    /// Data row field count differs from the column count
    #[error(
        "Expected as many columns as values in file. Found {expected} columns and {found} values at data row {row} (line {line})"
    )]
    RowCountMismatch {
        row: usize,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Bottle file without a unique row key
    #[error(
        "No unique identifier found at line {line}: expected (STNNBR,CASTNO,SAMPNO,BTLNBR), (STNNBR,CASTNO,SAMPNO) or (STNNBR,CASTNO,BTLNBR)"
    )]
    MissingIdentifier { line: usize },

    /// The same mnemonic appears twice in the column header
    #[error("Duplicate column '{mnemonic}' at line {line}")]
    DuplicateColumn { line: usize, mnemonic: String },

    /// Mnemonic could not be resolved by the parameter catalog
    #[error("Unknown parameter '{mnemonic}'")]
    UnknownParameter { mnemonic: String },

    /// Declared unit differs from the catalog unit
    #[error("Mismatched units for '{parameter}'. Found '{found}' but expected '{expected}'")]
    MismatchedUnits {
        parameter: String,
        found: String,
        expected: String,
    },

    /// Converter applied to a semantically incompatible column
    #[error("Invalid conversion for '{parameter}': {message}")]
    InvalidConversion { parameter: String, message: String },

    /// No converter registered for a unit pair
    #[error("No unit converter registered for '{from}' -> '{to}'")]
    NoConverter { from: String, to: String },

    /// Derivative row has no matching origin row
    #[error("No origin row matches key {key} (derivative row {row})")]
    NoMatch { row: usize, key: String },

    /// Derivative row matches several origin rows
    #[error("Key {key} of derivative row {row} matches {matches} origin rows")]
    AmbiguousKey {
        row: usize,
        key: String,
        matches: usize,
    },

    /// A required column is absent from a file
    #[error("Column '{mnemonic}' not found")]
    MissingColumn { mnemonic: String },

    /// The external parameter lookup failed
    #[error("Parameter catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    /// Catalog used after close()
    #[error("Parameter catalog is closed")]
    CatalogClosed,

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Print template could not be applied
    #[error("Cannot format with '{template}': {message}")]
    Format { template: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a malformed header error
    pub fn malformed_header(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            line,
            message: message.into(),
        }
    }

    /// Create a column/unit count mismatch error
    pub fn column_count_mismatch(line: usize, columns: usize, units: usize) -> Self {
        Self::ColumnCountMismatch {
            line,
            columns,
            units,
        }
    }

    /// Create a row field count mismatch error
    pub fn row_count_mismatch(row: usize, line: usize, expected: usize, found: usize) -> Self {
        Self::RowCountMismatch {
            row,
            line,
            expected,
            found,
        }
    }

    /// Create a missing identifier error
    pub fn missing_identifier(line: usize) -> Self {
        Self::MissingIdentifier { line }
    }

    /// Create a duplicate column error
    pub fn duplicate_column(line: usize, mnemonic: impl Into<String>) -> Self {
        Self::DuplicateColumn {
            line,
            mnemonic: mnemonic.into(),
        }
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter(mnemonic: impl Into<String>) -> Self {
        Self::UnknownParameter {
            mnemonic: mnemonic.into(),
        }
    }

    /// Create a mismatched units error
    pub fn mismatched_units(
        parameter: impl Into<String>,
        found: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::MismatchedUnits {
            parameter: parameter.into(),
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Create an invalid conversion error
    pub fn invalid_conversion(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConversion {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a missing converter error
    pub fn no_converter(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::NoConverter {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a merge no-match error
    pub fn no_match(row: usize, key: impl Into<String>) -> Self {
        Self::NoMatch {
            row,
            key: key.into(),
        }
    }

    /// Create a merge ambiguous-key error
    pub fn ambiguous_key(row: usize, key: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousKey {
            row,
            key: key.into(),
            matches,
        }
    }

    /// Create a missing column error
    pub fn missing_column(mnemonic: impl Into<String>) -> Self {
        Self::MissingColumn {
            mnemonic: mnemonic.into(),
        }
    }

    /// Create a catalog unavailable error
    pub fn catalog_unavailable(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a formatting error
    pub fn format(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error aborts reading a file (as opposed to a per-column
    /// or per-row problem)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::MalformedHeader { .. }
                | Self::ColumnCountMismatch { .. }
                | Self::RowCountMismatch { .. }
                | Self::MissingIdentifier { .. }
                | Self::DuplicateColumn { .. }
        )
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}
