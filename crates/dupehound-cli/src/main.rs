mod commands;
mod interact;
mod logging;
mod progress;
mod report;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

use dupehound_core::{
    CancelToken, HashComponents, RunOutcome, ScanEngine, ScanOptions,
};

/// Unix convention for SIGINT: 128 + 2.
const EXIT_CODE_INTERRUPTED: i32 = 130;

fn main() {
    dotenv().ok();
    let _guard = logging::init_logger();

    let args = Cli::parse();

    let file_config = match dupehound_core::config::load_configuration() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let mut components = HashComponents::default();
    for (toggle, component) in [
        (args.content, HashComponents::CONTENT),
        (args.size, HashComponents::SIZE),
        (args.mtime, HashComponents::MODIFIED),
        (args.ctime, HashComponents::CREATED),
        (args.name, HashComponents::FILE_NAME),
    ] {
        if let Some(enabled) = toggle {
            components.set(component, enabled);
        }
    }

    let mut ignore_patterns = file_config.ignore_patterns;
    ignore_patterns.extend(args.ignore);

    let options = ScanOptions {
        root: args.path,
        db_path: args
            .db
            .or_else(|| file_config.db_path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(".dups.db")),
        components,
        workers: args
            .workers
            .or(file_config.workers)
            .unwrap_or_else(num_cpus::get)
            .max(1),
        full_scan: args.full_scan,
        ignore_patterns,
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("\nInterrupted. Finishing in-flight work...");
            cancel.cancel();
        }) {
            error!("failed to install Ctrl+C handler: {e}");
        }
    }

    let engine = ScanEngine::new(options);
    let reporter = CliReporter::new();

    let result = engine.run(&reporter, &cancel, |total, groups| match args.report {
        Some(format) => report::run(format, total, groups),
        None => interact::run(total, groups, &cancel),
    });

    match result {
        Ok(summary) => {
            info!(
                "{} files scanned, {} updated, {} cached, {} skipped on error",
                format!("{}", summary.totals.scanned).green(),
                format!("{}", summary.totals.updated).green(),
                format!("{}", summary.totals.skipped).green(),
                format!("{}", summary.totals.errors).yellow(),
            );
            match summary.outcome {
                RunOutcome::Completed | RunOutcome::Quit => process::exit(0),
                RunOutcome::Cancelled => process::exit(EXIT_CODE_INTERRUPTED),
            }
        }
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    }
}
