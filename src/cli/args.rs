//! Command-line argument definitions for the hydro processor
//!
//! Defines the CLI interface using the clap derive API. Options shared by
//! every subcommand live in [`GlobalArgs`] and are accepted before or after
//! the subcommand name.

use crate::app::services::collection_ops::SortKey;
use crate::app::services::unit_conversion::{ConverterPreset, OxygenMethod};
use crate::constants::{CAST_KEY_COLUMNS, MAX_PARALLEL_WORKERS};
use crate::{Error, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the hydrographic data processor
///
/// Reads, canonicalizes, converts, splits, merges and checks WHP Exchange
/// bottle files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hydro-processor",
    version,
    about = "Canonicalize, convert and merge WHP Exchange hydrographic bottle files",
    long_about = "A tool for WHP Exchange bottle data. Resolves column mnemonics against a \
                  parameter catalog, converts per-litre concentrations to per-kilogram with \
                  precision preserved, splits and merges casts across files and checks flags \
                  and fill values."
)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Read files, resolve parameters against the catalog and write them back
    Canon(CanonArgs),
    /// Convert per-litre columns to per-kilogram units
    ConvertPerKg(ConvertArgs),
    /// Split a file into one file per station/cast
    Split(SplitArgs),
    /// Merge columns of a derivative file into an origin file
    Merge(MergeArgs),
    /// Reorder columns and sort rows
    Reorder(ReorderArgs),
    /// Run data quality checks
    Check(CheckArgs),
}

/// Options shared by all subcommands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Configuration file path
    ///
    /// Defaults to hydro-processor/config.toml under the user config directory
    /// when that file exists.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Configuration file path"
    )]
    pub config_file: Option<PathBuf>,

    /// CSV parameter table used instead of the built-in catalog
    #[arg(
        long = "catalog",
        value_name = "FILE",
        global = true,
        help = "CSV parameter table used instead of the built-in catalog"
    )]
    pub catalog: Option<PathBuf>,

    /// Accept unknown mnemonics as contrived parameters
    #[arg(
        long = "allow-contrived",
        global = true,
        help = "Accept unknown mnemonics as contrived parameters"
    )]
    pub allow_contrived: bool,

    /// Number of files processed concurrently
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "N",
        global = true,
        help = "Number of files processed concurrently"
    )]
    pub workers: Option<usize>,

    /// Overwrite existing output files
    #[arg(long = "force", global = true, help = "Overwrite existing output files")]
    pub force_overwrite: bool,

    /// Disable progress bars
    #[arg(long = "no-progress", global = true, help = "Disable progress bars")]
    pub no_progress: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
    pub verbose: u8,

    /// Only log errors
    #[arg(
        short = 'q',
        long = "quiet",
        conflicts_with = "verbose",
        global = true,
        help = "Only log errors"
    )]
    pub quiet: bool,
}

/// Arguments for the canon command
#[derive(Debug, Clone, Parser)]
pub struct CanonArgs {
    /// Input files, directories or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the rewritten files
    ///
    /// Without it, a single input is written to stdout.
    #[arg(short = 'o', long = "output", value_name = "DIR", help = "Output directory")]
    pub output_dir: Option<PathBuf>,

    /// Convert mismatched units whenever a converter exists
    #[arg(long = "convert", help = "Convert mismatched units without asking")]
    pub convert: bool,

    /// Ask before every unit conversion
    #[arg(long = "ask", conflicts_with = "convert", help = "Ask before every unit conversion")]
    pub ask: bool,
}

/// Arguments for the convert-per-kg command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Input files, directories or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the converted files
    #[arg(short = 'o', long = "output", value_name = "DIR", help = "Output directory")]
    pub output_dir: Option<PathBuf>,

    /// Converter sets to register (defaults to the configured presets)
    #[arg(
        long = "preset",
        value_name = "PRESET",
        value_delimiter = ',',
        help = "Converter sets to register"
    )]
    pub presets: Vec<PresetArg>,

    /// Bottle oxygen sampling method
    #[arg(long = "oxygen-method", value_name = "METHOD", help = "Bottle oxygen sampling method")]
    pub oxygen_method: Option<OxygenMethodArg>,
}

/// Arguments for the split command
#[derive(Debug, Clone, Parser)]
pub struct SplitArgs {
    /// File to split
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving one file per cast
    #[arg(short = 'o', long = "output", value_name = "DIR", help = "Output directory")]
    pub output_dir: PathBuf,

    /// Columns identifying a cast
    #[arg(
        short = 'k',
        long = "key",
        value_name = "LIST",
        help = "Comma-separated columns identifying a cast (default STNNBR,CASTNO)"
    )]
    pub keys: Option<ColumnList>,
}

/// Arguments for the merge command
#[derive(Debug, Clone, Parser)]
pub struct MergeArgs {
    /// File receiving the merged columns
    #[arg(value_name = "ORIGIN")]
    pub origin: PathBuf,

    /// File providing the merged columns
    #[arg(value_name = "DERIVATIVE")]
    pub derivative: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE", help = "Output file")]
    pub output: Option<PathBuf>,

    /// Columns matching rows across the files
    ///
    /// Guessed from the bottle identifiers when omitted.
    #[arg(
        short = 'k',
        long = "key",
        value_name = "LIST",
        help = "Comma-separated columns matching rows across the files"
    )]
    pub keys: Option<ColumnList>,

    /// Columns to merge
    #[arg(
        short = 'p',
        long = "parameters",
        value_name = "LIST",
        help = "Comma-separated columns to merge"
    )]
    pub parameters: Option<ColumnList>,

    /// Merge every column whose values differ
    #[arg(
        long = "merge-different",
        conflicts_with = "parameters",
        help = "Merge every column whose values differ"
    )]
    pub merge_different: bool,
}

/// Arguments for the reorder command
#[derive(Debug, Clone, Parser)]
pub struct ReorderArgs {
    /// File to reorder
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE", help = "Output file")]
    pub output: Option<PathBuf>,

    /// Columns to keep, in output order; all others are dropped
    #[arg(
        long = "order",
        value_name = "LIST",
        help = "Comma-separated columns to keep, in output order"
    )]
    pub order: Option<ColumnList>,

    /// Row sort keys, prefix with '-' for descending
    #[arg(
        long = "sort",
        value_name = "KEY",
        value_delimiter = ',',
        allow_hyphen_values = true,
        help = "Row sort keys, '-' prefix for descending"
    )]
    pub sort: Vec<SortKey>,

    /// Sort each cast by increasing pressure
    #[arg(
        long = "surface-to-bottom",
        conflicts_with = "sort",
        help = "Sort each cast by increasing pressure"
    )]
    pub surface_to_bottom: bool,
}

/// Arguments for the check command
#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Input files, directories or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Columns whose combination must be unique
    #[arg(
        long = "verify-unique",
        value_name = "LIST",
        help = "Comma-separated columns whose combination must be unique"
    )]
    pub verify_unique: Option<ColumnList>,

    /// Skip the parameter bounds check
    #[arg(long = "no-bounds", help = "Skip the parameter bounds check")]
    pub no_bounds: bool,

    /// Output format for the reports
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        default_value = "human",
        help = "Output format for the reports"
    )]
    pub output_format: OutputFormat,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured text
    Human,
    /// One JSON document
    Json,
}

/// Converter set names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    PerLitre,
    CtdOxygen,
    NobleGas,
}

impl From<PresetArg> for ConverterPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::PerLitre => ConverterPreset::PerLitreToPerKg,
            PresetArg::CtdOxygen => ConverterPreset::CtdOxygen,
            PresetArg::NobleGas => ConverterPreset::NobleGas,
        }
    }
}

/// Oxygen sampling methods accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OxygenMethodArg {
    Whole,
    Aliquot,
}

impl From<OxygenMethodArg> for OxygenMethod {
    fn from(arg: OxygenMethodArg) -> Self {
        match arg {
            OxygenMethodArg::Whole => OxygenMethod::Whole,
            OxygenMethodArg::Aliquot => OxygenMethod::Aliquot,
        }
    }
}

/// Comma-separated column mnemonics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnList {
    pub columns: Vec<String>,
}

impl FromStr for ColumnList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let columns: Vec<String> = s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if columns.is_empty() {
            return Err(Error::configuration("Column list cannot be empty"));
        }
        if let Some(bad) = columns.iter().find(|c| c.contains(char::is_whitespace)) {
            return Err(Error::configuration(format!(
                "Column mnemonic '{}' contains whitespace",
                bad
            )));
        }
        Ok(ColumnList { columns })
    }
}

impl GlobalArgs {
    /// Log level chosen by -v/-q, if any
    pub fn get_log_level(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            match self.verbose {
                0 => None,
                1 => Some("info"),
                2 => Some("debug"),
                _ => Some("trace"),
            }
        }
    }

    /// Validate the shared arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(Error::configuration(
                    "Number of workers must be greater than 0",
                ));
            }
            if workers > MAX_PARALLEL_WORKERS {
                return Err(Error::configuration(format!(
                    "Number of workers cannot exceed {}",
                    MAX_PARALLEL_WORKERS
                )));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if let Some(catalog) = &self.catalog {
            if !catalog.is_file() {
                return Err(Error::configuration(format!(
                    "Catalog table does not exist: {}",
                    catalog.display()
                )));
            }
        }

        Ok(())
    }
}

impl CanonArgs {
    /// Validate the canon command arguments
    pub fn validate(&self) -> Result<()> {
        validate_output_dir(self.output_dir.as_ref(), self.inputs.len())
    }
}

impl ConvertArgs {
    /// Validate the convert-per-kg command arguments
    pub fn validate(&self) -> Result<()> {
        validate_output_dir(self.output_dir.as_ref(), self.inputs.len())
    }

    /// Requested presets, if any were given
    pub fn get_presets(&self) -> Option<Vec<ConverterPreset>> {
        if self.presets.is_empty() {
            None
        } else {
            Some(self.presets.iter().map(|&p| p.into()).collect())
        }
    }
}

impl SplitArgs {
    /// Cast key columns, defaulting to station and cast number
    pub fn get_keys(&self) -> Vec<String> {
        match &self.keys {
            Some(list) => list.columns.clone(),
            None => CAST_KEY_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MergeArgs {
    /// Validate the merge command arguments
    pub fn validate(&self) -> Result<()> {
        for path in [&self.origin, &self.derivative] {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "Input file does not exist: {}",
                    path.display()
                )));
            }
        }
        if self.origin == self.derivative {
            return Err(Error::configuration(
                "Origin and derivative must be different files",
            ));
        }
        Ok(())
    }
}

impl ReorderArgs {
    /// Sort keys to apply, if any
    pub fn get_sort_keys(&self) -> Vec<SortKey> {
        if self.surface_to_bottom {
            SortKey::surface_to_bottom()
        } else {
            self.sort.clone()
        }
    }

    /// Whether the command only lists the columns
    pub fn is_listing(&self) -> bool {
        self.order.is_none() && self.sort.is_empty() && !self.surface_to_bottom
    }
}

impl CheckArgs {
    /// Unique key columns, if requested
    pub fn get_unique_columns(&self) -> Vec<String> {
        self.verify_unique
            .as_ref()
            .map(|list| list.columns.clone())
            .unwrap_or_default()
    }
}

fn validate_output_dir(output_dir: Option<&PathBuf>, inputs: usize) -> Result<()> {
    match output_dir {
        Some(dir) if dir.exists() && !dir.is_dir() => Err(Error::configuration(format!(
            "Output path is not a directory: {}",
            dir.display()
        ))),
        None if inputs > 1 => Err(Error::configuration(
            "An output directory is required for more than one input",
        )),
        _ => Ok(()),
    }
}
