//! Convert-per-kg command: per-litre concentrations to per-kilogram

use super::CommandContext;
use super::canon::rewrite_files;
use super::shared::{CommandStats, expand_inputs};
use crate::app::services::unit_conversion::ConverterRegistry;
use crate::cli::args::ConvertArgs;
use crate::config::ConversionPolicyMode;
use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the convert-per-kg command
pub async fn run_convert(args: ConvertArgs, context: CommandContext) -> Result<CommandStats> {
    args.validate()?;

    let mut config = (*context.config).clone();
    config.exchange.conversion_policy = ConversionPolicyMode::Always;
    if let Some(presets) = args.get_presets() {
        config.conversion.presets = presets;
    }
    if let Some(method) = args.oxygen_method {
        config.conversion.options.oxygen_method = method.into();
    }

    let registry = ConverterRegistry::from_presets(&config.conversion.presets);
    if registry.is_empty() {
        bail!("No converters registered; pass --preset or configure conversion.presets");
    }
    for (from, to) in registry.pairs() {
        info!("Converter registered: {} -> {}", from, to);
    }

    let files = expand_inputs(&args.inputs)?;
    let stats = rewrite_files(
        files,
        args.output_dir,
        Arc::new(config),
        context.catalog,
        "Converting",
    )
    .await?;

    if stats.conversions_applied == 0 {
        warn!("No column needed a unit conversion");
    }
    Ok(stats)
}
