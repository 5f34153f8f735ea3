//! Canon command: read, resolve against the catalog, write back

use super::CommandContext;
use super::batch;
use super::shared::{
    CommandStats, build_reader, create_progress_bar, ensure_writable, expand_inputs, output_path,
    prepare_output_dir, read_file, write_output,
};
use crate::app::services::exchange::ExchangeWriter;
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::app::services::unit_conversion::ConversionPrompt;
use crate::cli::args::CanonArgs;
use crate::cli::input::StdinPrompt;
use crate::config::{Config, ConversionPolicyMode};
use anyhow::{Result, bail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Run the canon command
pub async fn run_canon(args: CanonArgs, context: CommandContext) -> Result<CommandStats> {
    args.validate()?;

    let mut config = (*context.config).clone();
    if args.convert {
        config.exchange.conversion_policy = ConversionPolicyMode::Always;
    } else if args.ask {
        config.exchange.conversion_policy = ConversionPolicyMode::Ask;
    }
    info!(
        "Canonicalizing with conversion policy {:?}",
        config.exchange.conversion_policy
    );

    let files = expand_inputs(&args.inputs)?;
    rewrite_files(
        files,
        args.output_dir,
        Arc::new(config),
        context.catalog,
        "Canonicalizing",
    )
    .await
}

/// Read every file and write it back canonicalized
///
/// Without an output directory the single input goes to stdout.
pub async fn rewrite_files(
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    config: Arc<Config>,
    catalog: Arc<ParameterCatalog>,
    message: &str,
) -> Result<CommandStats> {
    let prompt: Option<Arc<dyn ConversionPrompt>> = match config.exchange.conversion_policy {
        ConversionPolicyMode::Ask => Some(Arc::new(StdinPrompt::new())),
        ConversionPolicyMode::Always | ConversionPolicyMode::Skip => None,
    };

    let Some(output_dir) = output_dir else {
        let [path] = files.as_slice() else {
            bail!("An output directory is required for more than one input");
        };
        let start = Instant::now();
        let reader = build_reader(&catalog, &config, prompt);
        let result = read_file(&reader, path)?;
        let writer = ExchangeWriter::new(&catalog, &config.exchange);
        write_output(&writer, &result.file, None, false)?;

        let mut stats = CommandStats::from_read(&result);
        stats.files_written = 1;
        stats.processing_time = start.elapsed();
        return Ok(stats);
    };

    prepare_output_dir(&output_dir)?;

    // Prompts share one terminal
    let interactive = prompt.is_some();
    let workers = if interactive {
        1
    } else {
        config.processing.workers
    };
    let progress = create_progress_bar(
        files.len() as u64,
        message,
        config.processing.show_progress && !interactive,
    );

    let outcome = batch::process_files(files, workers, progress, move |path| {
        let output = output_path(&path, &output_dir)?;
        ensure_writable(&output, config.processing.overwrite)?;

        let reader = build_reader(&catalog, &config, prompt.clone());
        let result = read_file(&reader, &path)?;
        let writer = ExchangeWriter::new(&catalog, &config.exchange);
        write_output(&writer, &result.file, Some(output.as_path()), true)?;

        let mut stats = CommandStats::from_read(&result);
        stats.files_written = 1;
        Ok(stats)
    })
    .await;

    Ok(outcome.into_stats())
}
