//! Merge command: copy columns of a derivative file onto an origin file

use super::CommandContext;
use super::shared::{CommandStats, build_reader, read_file, write_output};
use crate::app::services::collection_ops::{
    ColumnDiff, different_columns, guess_bottle_keys, merge_by_key,
};
use crate::app::services::exchange::ExchangeWriter;
use crate::cli::args::MergeArgs;
use anyhow::{Context, Result};
use colored::*;
use std::time::Instant;
use tracing::{info, warn};

/// Run the merge command
///
/// Without `--parameters` or `--merge-different` the column comparison is
/// printed and nothing is written.
pub async fn run_merge(args: MergeArgs, context: CommandContext) -> Result<CommandStats> {
    args.validate()?;
    let start = Instant::now();
    let config = &context.config;

    let reader = build_reader(&context.catalog, config, None);
    let mut origin = read_file(&reader, &args.origin)?;
    let derivative = read_file(&reader, &args.derivative)?;

    let keys = match &args.keys {
        Some(list) => list.columns.clone(),
        None => guess_bottle_keys(&origin.file, &derivative.file)
            .context("Cannot guess merge keys from the bottle identifiers, pass --key")?,
    };
    info!("Matching rows on {}", keys.join(","));

    let mut stats = CommandStats::from_read(&origin);
    stats.absorb(CommandStats::from_read(&derivative));

    let parameters = match (&args.parameters, args.merge_different) {
        (Some(list), _) => list.columns.clone(),
        (None, merge_different) => {
            let diff = different_columns(&origin.file, &derivative.file, &keys)
                .context("Failed to compare files")?;
            if !merge_different {
                print_column_diff(&diff);
                stats.processing_time = start.elapsed();
                return Ok(stats);
            }
            diff.mergeable()
        }
    };
    if parameters.is_empty() {
        warn!("No columns to merge");
    }

    let report = merge_by_key(&mut origin.file, &derivative.file, &keys, &parameters)
        .context("Merge failed")?;
    for issue in &report.issues {
        warn!("{}", issue);
    }
    info!("{}", report.summary());

    let writer = ExchangeWriter::new(&context.catalog, &config.exchange);
    write_output(
        &writer,
        &origin.file,
        args.output.as_deref(),
        config.processing.overwrite,
    )?;
    stats.files_written = 1;
    stats.processing_time = start.elapsed();
    Ok(stats)
}

fn print_column_diff(diff: &ColumnDiff) {
    let sections = [
        ("Different", &diff.different, Color::Yellow),
        ("Only in derivative", &diff.not_in_origin, Color::Green),
        ("Only in origin", &diff.not_in_derivative, Color::Blue),
        ("Identical", &diff.common, Color::White),
    ];
    for (title, columns, color) in sections {
        if columns.is_empty() {
            continue;
        }
        println!("{}", format!("{}:", title).color(color).bold());
        println!("  {}", columns.join(" "));
    }
    if diff.mergeable().is_empty() {
        println!("{}", "Nothing to merge".green());
    }
}
