//! Shared components for CLI commands
//!
//! Logging and configuration setup, input discovery, reader/writer
//! construction and the statistics every command reports.

use crate::app::models::DataFile;
use crate::app::services::exchange::{ExchangeReader, ExchangeWriter, ReadResult};
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::app::services::unit_conversion::{ConversionPolicy, ConversionPrompt, ConverterRegistry};
use crate::cli::args::GlobalArgs;
use crate::config::Config;
use crate::constants::EXCHANGE_EXTENSION;
use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Processing statistics reported by every command
#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    /// Files read successfully
    pub files_processed: usize,
    /// Files written
    pub files_written: usize,
    /// Data rows read
    pub rows_processed: usize,
    /// Column conversions applied
    pub conversions_applied: usize,
    /// Files left with units other than the catalog's
    pub unresolved_unit_files: usize,
    /// Quality issues at error severity
    pub check_errors: usize,
    /// Files that could not be processed, with the reason
    pub failures: Vec<(PathBuf, String)>,
    /// Total processing time
    pub processing_time: Duration,
}

impl CommandStats {
    /// Statistics of one successfully read file
    pub fn from_read(result: &ReadResult) -> Self {
        Self {
            files_processed: 1,
            rows_processed: result.stats.data_rows,
            conversions_applied: result.report.converted.len(),
            unresolved_unit_files: usize::from(result.report.has_unresolved_units()),
            ..Self::default()
        }
    }

    /// Fold another file's statistics into these
    pub fn absorb(&mut self, other: CommandStats) {
        self.files_processed += other.files_processed;
        self.files_written += other.files_written;
        self.rows_processed += other.rows_processed;
        self.conversions_applied += other.conversions_applied;
        self.unresolved_unit_files += other.unresolved_unit_files;
        self.check_errors += other.check_errors;
        self.failures.extend(other.failures);
    }

    pub fn record_failure(&mut self, path: PathBuf, message: impl Into<String>) {
        self.failures.push((path, message.into()));
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether the command should exit successfully
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.check_errors == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files read, {} written, {} failed, {} rows, {} conversions",
            self.files_processed,
            self.files_written,
            self.files_failed(),
            self.rows_processed,
            self.conversions_applied
        )
    }
}

/// Set up structured logging
///
/// `-v`/`-q` take precedence over the configured level; `RUST_LOG` over both.
pub fn setup_logging(global: &GlobalArgs, config: &Config) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = global
        .get_log_level()
        .map(str::to_string)
        .unwrap_or_else(|| config.logging.level.to_lowercase());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hydro_processor={}", log_level)));

    let installed = if global.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(io::stderr),
            )
            .try_init()
    };
    if installed.is_err() {
        debug!("Logging already initialized, keeping the existing subscriber");
        return Ok(());
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration: defaults, then the config file, then CLI overrides
pub fn load_configuration(global: &GlobalArgs) -> Result<Config> {
    global.validate()?;

    let mut config =
        Config::load(global.config_file.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, global);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(workers) = global.workers {
        config.processing.workers = workers;
    }
    if let Some(catalog) = &global.catalog {
        config.catalog.table_path = Some(catalog.clone());
    }
    if global.allow_contrived {
        config.catalog.allow_contrived = true;
    }
    if global.force_overwrite {
        config.processing.overwrite = true;
    }
    if global.no_progress || global.quiet {
        config.processing.show_progress = false;
    }
}

/// Open the configured parameter catalog
pub fn open_catalog(config: &Config) -> Result<Arc<ParameterCatalog>> {
    let catalog =
        ParameterCatalog::from_config(&config.catalog).context("Failed to open parameter catalog")?;
    Ok(Arc::new(catalog))
}

/// Build a reader with the configured converters and options
///
/// A prompt switches the reader to asking before every conversion.
pub fn build_reader<'a>(
    catalog: &'a ParameterCatalog,
    config: &'a Config,
    prompt: Option<Arc<dyn ConversionPrompt>>,
) -> ExchangeReader<'a> {
    let converters = ConverterRegistry::from_presets(&config.conversion.presets);
    let reader = ExchangeReader::new(catalog, &config.exchange)
        .with_converters(Arc::new(converters))
        .with_options(config.conversion.options.clone());
    match prompt {
        Some(prompt) => reader.with_policy(ConversionPolicy::Ask(prompt)),
        None => reader,
    }
}

/// Read one Exchange file with statistics
pub fn read_file(reader: &ExchangeReader<'_>, path: &Path) -> Result<ReadResult> {
    let result = reader
        .read_path_with_stats(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("{}: {}", path.display(), result.stats.summary());
    Ok(result)
}

/// Expand files, directories and glob patterns into a sorted file list
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let text = input.to_string_lossy();
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Failed to scan directory {}", input.display()))?;
                if entry.file_type().is_file() && is_exchange_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            files.push(input.clone());
        } else if text.contains(['*', '?', '[']) {
            let paths =
                glob::glob(&text).with_context(|| format!("Invalid glob pattern: {}", text))?;
            for path in paths {
                let path = path.context("Failed to read glob match")?;
                if path.is_file() {
                    files.push(path);
                }
            }
        } else {
            bail!("Input does not exist: {}", input.display());
        }
    }

    files.sort();
    files.dedup();
    if files.is_empty() {
        bail!("No Exchange files found in the given inputs");
    }
    info!("Found {} input files", files.len());
    Ok(files)
}

fn is_exchange_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXCHANGE_EXTENSION))
}

/// Path of an input's counterpart in the output directory
pub fn output_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("Input has no file name: {}", input.display()))?;
    Ok(output_dir.join(name))
}

/// Create the output directory if needed
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Refuse to replace an existing file unless overwriting is allowed
pub fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!(
            "Output file already exists (use --force to overwrite): {}",
            path.display()
        );
    }
    Ok(())
}

/// Write a file to `output`, or to stdout when no path is given
pub fn write_output(
    writer: &ExchangeWriter<'_>,
    file: &DataFile,
    output: Option<&Path>,
    overwrite: bool,
) -> Result<()> {
    match output {
        Some(path) => {
            ensure_writable(path, overwrite)?;
            writer
                .write_path(file, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            writer
                .write(file, &mut lock)
                .context("Failed to write to stdout")?;
            lock.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Create a progress bar, hidden when progress is disabled
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Print the final summary of a command to stderr
pub fn print_summary(title: &str, stats: &CommandStats) {
    eprintln!();
    eprintln!("{}", title.bold());
    eprintln!("  {:<22} {}", "Files read:", stats.files_processed);
    eprintln!("  {:<22} {}", "Files written:", stats.files_written);
    eprintln!("  {:<22} {}", "Rows:", stats.rows_processed);
    if stats.conversions_applied > 0 {
        eprintln!(
            "  {:<22} {}",
            "Conversions:",
            stats.conversions_applied.to_string().green()
        );
    }
    if stats.unresolved_unit_files > 0 {
        eprintln!(
            "  {:<22} {}",
            "Unresolved units:",
            stats.unresolved_unit_files.to_string().yellow()
        );
    }
    eprintln!(
        "  {:<22} {}",
        "Time:",
        HumanDuration(stats.processing_time)
    );

    if stats.failures.is_empty() {
        eprintln!("{}", "Completed successfully".green());
    } else {
        eprintln!(
            "{}",
            format!("{} files failed:", stats.files_failed()).red().bold()
        );
        for (path, message) in &stats.failures {
            eprintln!("  {} {}", path.display().to_string().red(), message);
        }
        warn!("{} files failed", stats.files_failed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stats_absorb() {
        let mut total = CommandStats::default();
        total.absorb(CommandStats {
            files_processed: 1,
            files_written: 1,
            rows_processed: 10,
            conversions_applied: 2,
            ..CommandStats::default()
        });
        total.absorb(CommandStats {
            files_processed: 1,
            rows_processed: 5,
            ..CommandStats::default()
        });
        total.record_failure(PathBuf::from("bad.csv"), "malformed");

        assert_eq!(total.files_processed, 2);
        assert_eq!(total.rows_processed, 15);
        assert_eq!(total.files_failed(), 1);
        assert!(!total.is_success());
        assert!(total.summary().contains("2 files read"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();
        let global = GlobalArgs {
            workers: Some(7),
            allow_contrived: true,
            force_overwrite: true,
            quiet: true,
            ..GlobalArgs::default()
        };
        apply_cli_overrides(&mut config, &global);
        assert_eq!(config.processing.workers, 7);
        assert!(config.catalog.allow_contrived);
        assert!(config.processing.overwrite);
        assert!(!config.processing.show_progress);
    }

    #[test]
    fn test_expand_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("cruise");
        fs::create_dir(&nested).unwrap();
        fs::write(temp_dir.path().join("b_hy1.csv"), "").unwrap();
        fs::write(nested.join("a_hy1.csv"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let files = expand_inputs(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "csv"));

        let pattern = temp_dir.path().join("*.csv");
        let files = expand_inputs(&[pattern]).unwrap();
        assert_eq!(files, vec![temp_dir.path().join("b_hy1.csv")]);

        assert!(expand_inputs(&[temp_dir.path().join("missing.csv")]).is_err());
        assert!(expand_inputs(&[temp_dir.path().join("*.nc")]).is_err());
    }

    #[test]
    fn test_output_paths() {
        let temp_dir = TempDir::new().unwrap();
        let output = output_path(Path::new("/data/a_hy1.csv"), temp_dir.path()).unwrap();
        assert_eq!(output, temp_dir.path().join("a_hy1.csv"));

        assert!(ensure_writable(&output, false).is_ok());
        fs::write(&output, "").unwrap();
        assert!(ensure_writable(&output, false).is_err());
        assert!(ensure_writable(&output, true).is_ok());
    }
}
