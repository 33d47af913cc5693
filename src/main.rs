//! parfind - a parallel, simplified find(1)
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use parfind::config::{CliArgs, WalkConfig, VERSION};
use parfind::progress::{print_header, print_summary, ProgressReporter};
use parfind::walker::ParallelWalker;
use std::io;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status of a walk stopped by SIGINT (128 + signal number)
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = CliArgs::parse();

    if args.version {
        println!("{}", VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    setup_logging(args.verbose)?;

    let config = WalkConfig::from_args(args);

    if config.show_progress {
        print_header(&config.root.display().to_string(), config.worker_count);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(walk(config))
}

async fn walk(config: WalkConfig) -> Result<ExitCode> {
    let walker = ParallelWalker::new(config.clone());

    // Setup signal handler for graceful shutdown
    let shutdown_flag = walker.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let result = if config.show_progress {
        let reporter = Arc::new(ProgressReporter::new());
        reporter.set_status("Walking...");

        let ticker = Arc::clone(&reporter);
        let result = walker
            .run_with_progress(io::stdout(), move |p| ticker.update(&p))
            .await;

        match &result {
            Ok(r) if r.completed => reporter.finish("Walk completed"),
            Ok(_) => reporter.finish("Walk interrupted"),
            Err(_) => reporter.finish_and_clear(),
        }
        result
    } else {
        walker.run(io::stdout()).await
    };

    let result = result.context("Walk failed")?;

    if config.show_progress {
        print_summary(&result, config.worker_count);
    }

    if result.errors > 0 {
        info!(errors = result.errors, "Walk completed with errors");
    }

    if !result.completed {
        warn!(
            entries = result.entries_written,
            skipped = result.skipped,
            "Walk was interrupted before completion"
        );
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr; `RUST_LOG` overrides the default filter
fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "parfind=debug" } else { "parfind=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
