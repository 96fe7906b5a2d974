//! engine-compat - Runtime engine compatibility checker for Node.js projects
//!
//! Reads the dependency tree of a project, intersects every package's
//! `engines` declaration against the released engine versions, and reports
//! the range the whole graph supports.

use clap::Parser;
use engine_compat::cli::CliArgs;
use engine_compat::orchestrator::{Orchestrator, ResolveOptions};
use engine_compat::output::{create_formatter, OutputConfig};
use engine_compat::progress::Progress;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    args.validate()?;

    if args.verbose {
        eprintln!("engine-compat v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Target: {}", args.path.display());
        if args.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let options = ResolveOptions::from_cli(&args);
    let orchestrator = Orchestrator::new(options)?;
    let progress = Progress::new(!args.quiet && !args.json);
    let result = orchestrator.run_with_progress(progress).await?;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.dry_run);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::from(result.exit_code()))
}
