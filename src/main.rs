use clap::Parser;
use hydro_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Processing interrupted by user"))
            }
        }
    });

    match result {
        Ok(stats) if stats.is_success() => process::exit(0),
        // Failures have already been reported by the command
        Ok(_) => process::exit(1),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Hydro Processor - WHP Exchange Bottle Data Toolkit");
    println!("==================================================");
    println!();
    println!("Canonicalize, convert, split, merge and check hydrographic bottle");
    println!("data stored in WHP Exchange files.");
    println!();
    println!("USAGE:");
    println!("    hydro-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    canon           Resolve parameters against the catalog and rewrite files");
    println!("    convert-per-kg  Convert per-litre concentrations to per-kilogram");
    println!("    split           Write one file per station/cast");
    println!("    merge           Merge columns of a derivative file into an origin file");
    println!("    reorder         Choose and order columns, sort rows within casts");
    println!("    check           Check flags, fill values, bounds and unique keys");
    println!("    help            Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Convert bottle oxygen and nutrients to per-kilogram units:");
    println!("    hydro-processor convert-per-kg cruise/ -o converted/");
    println!();
    println!("    # Canonicalize one file to stdout, asking before conversions:");
    println!("    hydro-processor canon 33RR20090320_hy1.csv --ask");
    println!();
    println!("    # Merge a corrected salinity column back into the bottle file:");
    println!("    hydro-processor merge bottle_hy1.csv salts_hy1.csv -p SALNTY -o merged_hy1.csv");
    println!();
    println!("    # Machine-readable quality report:");
    println!("    hydro-processor check cruise/ --format json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    hydro-processor <COMMAND> --help");
}
