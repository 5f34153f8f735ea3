//! Check command: data quality checks over many files

use super::CommandContext;
use super::batch;
use super::shared::{CommandStats, build_reader, create_progress_bar, expand_inputs, read_file};
use crate::app::services::exchange::ReadStats;
use crate::app::services::parameter_catalog::CanonicalizationReport;
use crate::app::services::quality_checks::{CheckOptions, CheckReport, Severity, check_file};
use crate::cli::args::{CheckArgs, OutputFormat};
use crate::config::ConversionPolicyMode;
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Findings for one file
#[derive(Debug, Serialize)]
pub struct FileCheck {
    pub file: PathBuf,
    pub read: ReadStats,
    pub canonicalization: CanonicalizationReport,
    pub report: CheckReport,
}

/// Run the check command
pub async fn run_check(args: CheckArgs, context: CommandContext) -> Result<CommandStats> {
    // Data is checked as stored
    let mut config = (*context.config).clone();
    config.exchange.conversion_policy = ConversionPolicyMode::Skip;
    let config = Arc::new(config);

    let options = Arc::new(CheckOptions {
        verify_unique: args.get_unique_columns(),
        check_bounds: !args.no_bounds,
    });

    let files = expand_inputs(&args.inputs)?;
    let progress = create_progress_bar(
        files.len() as u64,
        "Checking",
        config.processing.show_progress && args.output_format == OutputFormat::Human,
    );

    let catalog = context.catalog;
    let workers = config.processing.workers;
    let outcome = batch::process_files(files, workers, progress, move |path| {
        let reader = build_reader(&catalog, &config, None);
        let result = read_file(&reader, &path)?;
        let report = check_file(&result.file, &options);
        Ok(FileCheck {
            file: path,
            read: result.stats,
            canonicalization: result.report,
            report,
        })
    })
    .await;

    let checks: Vec<&FileCheck> = outcome.results.iter().map(|(_, check)| check).collect();
    match args.output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&checks).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            for check in &checks {
                print_file_check(check);
            }
        }
    }

    let mut stats = CommandStats::default();
    for check in &checks {
        stats.files_processed += 1;
        stats.rows_processed += check.read.data_rows;
        stats.check_errors += check.report.count(Severity::Error);
        stats.unresolved_unit_files += usize::from(check.canonicalization.has_unresolved_units());
    }
    for (path, message) in outcome.failures {
        stats.record_failure(path, message);
    }
    stats.processing_time = outcome.elapsed;
    Ok(stats)
}

fn print_file_check(check: &FileCheck) {
    let summary = check.report.summary();
    let summary = if check.report.has_errors() {
        summary.red()
    } else if check.report.is_clean() {
        summary.green()
    } else {
        summary.yellow()
    };
    println!("{}: {}", check.file.display().to_string().bold(), summary);
    println!("  {}", check.read.summary().dimmed());

    for mismatch in &check.canonicalization.mismatched {
        println!(
            "  {} {} is in {}, catalog unit is {}",
            "[units]".yellow(),
            mismatch.column,
            mismatch.found,
            mismatch.expected
        );
    }
    for issue in &check.report.issues {
        let line = issue.to_string();
        let line = match issue.severity {
            Severity::Error => line.red(),
            Severity::Warning => line.yellow(),
            Severity::Info => line.normal(),
        };
        println!("  {}", line);
    }
}
