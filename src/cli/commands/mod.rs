//! Command implementations for the hydro processor CLI
//!
//! Each subcommand lives in its own module; `shared` holds setup and
//! reporting used by all of them and `batch` runs per-file work
//! concurrently.

pub mod batch;
pub mod canon;
pub mod check;
pub mod convert;
pub mod merge;
pub mod reorder;
pub mod shared;
pub mod split;

pub use shared::CommandStats;

use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::cli::args::{Args, Commands};
use crate::config::Config;
use anyhow::{Result, bail};
use shared::{load_configuration, open_catalog, print_summary, setup_logging};
use std::sync::Arc;
use tracing::debug;

/// Configuration and catalog handed to every command
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub catalog: Arc<ParameterCatalog>,
}

/// Main command runner
///
/// Loads configuration, installs logging, opens the parameter catalog and
/// dispatches to the subcommand. The catalog is closed once the command
/// finishes.
pub async fn run(args: Args) -> Result<CommandStats> {
    let Some(command) = args.command else {
        bail!("No command given");
    };

    let config = load_configuration(&args.global)?;
    setup_logging(&args.global, &config)?;
    debug!("Configuration: {:?}", config);

    let catalog = open_catalog(&config)?;
    let context = CommandContext {
        config: Arc::new(config),
        catalog: Arc::clone(&catalog),
    };

    let (title, result) = match command {
        Commands::Canon(canon_args) => ("Canonicalization", canon::run_canon(canon_args, context).await),
        Commands::ConvertPerKg(convert_args) => {
            ("Unit conversion", convert::run_convert(convert_args, context).await)
        }
        Commands::Split(split_args) => ("Split", split::run_split(split_args, context).await),
        Commands::Merge(merge_args) => ("Merge", merge::run_merge(merge_args, context).await),
        Commands::Reorder(reorder_args) => {
            ("Reorder", reorder::run_reorder(reorder_args, context).await)
        }
        Commands::Check(check_args) => ("Quality check", check::run_check(check_args, context).await),
    };

    debug!("Catalog resolved {} mnemonics", catalog.lookup_count());
    catalog.close();

    let stats = result?;
    if !args.global.quiet {
        print_summary(title, &stats);
    }
    Ok(stats)
}
