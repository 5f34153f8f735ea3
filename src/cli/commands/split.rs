//! Split command: one output file per cast

use super::CommandContext;
use super::shared::{
    CommandStats, build_reader, create_progress_bar, prepare_output_dir, read_file, write_output,
};
use crate::app::models::DataFile;
use crate::app::services::collection_ops::{row_key, split_by_cast};
use crate::app::services::exchange::ExchangeWriter;
use crate::cli::args::SplitArgs;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Run the split command
pub async fn run_split(args: SplitArgs, context: CommandContext) -> Result<CommandStats> {
    let start = Instant::now();
    let config = &context.config;
    let keys = args.get_keys();

    let reader = build_reader(&context.catalog, config, None);
    let result = read_file(&reader, &args.input)?;
    let casts = split_by_cast(&result.file, &keys)
        .with_context(|| format!("Failed to split {}", args.input.display()))?;
    info!(
        "Split {} into {} casts by {}",
        args.input.display(),
        casts.len(),
        keys.join(",")
    );

    prepare_output_dir(&args.output_dir)?;
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cast".to_string());

    let writer = ExchangeWriter::new(&context.catalog, &config.exchange);
    let progress = create_progress_bar(
        casts.len() as u64,
        "Writing casts",
        config.processing.show_progress,
    );

    let mut stats = CommandStats::from_read(&result);
    let mut used = HashSet::new();
    for cast in &casts.files {
        let name = cast_file_name(&stem, cast, &keys, &mut used);
        let path = args.output_dir.join(name);
        write_output(&writer, cast, Some(path.as_path()), config.processing.overwrite)?;
        stats.files_written += 1;
        progress.inc(1);
    }
    progress.finish_and_clear();

    stats.processing_time = start.elapsed();
    Ok(stats)
}

/// `<stem>_<key values>.csv`, numbered when a key reappears
fn cast_file_name(stem: &str, cast: &DataFile, keys: &[String], used: &mut HashSet<String>) -> String {
    let values: Vec<String> = row_key(cast, keys, 0)
        .into_iter()
        .map(|v| sanitize(&v))
        .collect();
    let base = format!("{}_{}", stem, values.join("_"));

    let mut name = base.clone();
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{}-{}", base, n);
        n += 1;
    }
    used.insert(name.clone());
    format!("{}.csv", name)
}

fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    if cleaned.is_empty() { "NA".to_string() } else { cleaned }
}
