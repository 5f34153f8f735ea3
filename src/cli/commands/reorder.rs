//! Reorder command: choose and order columns, sort rows within casts

use super::CommandContext;
use super::shared::{CommandStats, build_reader, read_file, write_output};
use crate::app::services::collection_ops::{reorder_columns, sort_rows};
use crate::app::services::exchange::ExchangeWriter;
use crate::cli::args::ReorderArgs;
use anyhow::Result;
use std::time::Instant;
use tracing::info;

/// Run the reorder command
///
/// With neither an order nor sort keys, lists the file's parameters in
/// their current output order.
pub async fn run_reorder(args: ReorderArgs, context: CommandContext) -> Result<CommandStats> {
    let start = Instant::now();
    let config = &context.config;

    let reader = build_reader(&context.catalog, config, None);
    let mut result = read_file(&reader, &args.input)?;
    let mut stats = CommandStats::from_read(&result);

    if args.is_listing() {
        for mnemonic in result.file.parameter_mnemonics() {
            println!("{}", mnemonic);
        }
        stats.processing_time = start.elapsed();
        return Ok(stats);
    }

    if let Some(order) = &args.order {
        let removed = reorder_columns(&mut result.file, &order.columns);
        if !removed.is_empty() {
            info!("Dropped columns: {}", removed.join(", "));
        }
    }

    let keys = args.get_sort_keys();
    if !keys.is_empty() {
        let runs = sort_rows(&mut result.file, &keys);
        info!("Sorted {} station/cast runs", runs);
    }

    let writer = ExchangeWriter::new(&context.catalog, &config.exchange);
    write_output(
        &writer,
        &result.file,
        args.output.as_deref(),
        config.processing.overwrite,
    )?;
    stats.files_written = 1;
    stats.processing_time = start.elapsed();
    Ok(stats)
}
