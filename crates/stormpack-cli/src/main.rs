use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "stormpack",
    about = "Stormpack — dry-run resource estimator for streaming jobs",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the containers and resources a job would occupy if scheduled.
    ///
    /// Nothing is launched. The report is printed to stdout as JSON; logs
    /// go to stderr.
    Resources(commands::resources::ResourcesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Resources(args) => args.verbose,
    };
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .finish();

    // The subscriber lives for this run only; nothing is installed globally.
    tracing::subscriber::with_default(subscriber, || {
        let result = match &cli.command {
            Commands::Resources(args) => {
                commands::resources::run(args, &mut std::io::stdout().lock())
            }
        };
        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        }
    })
}

/// `RUST_LOG` when it is set and parses, otherwise the default filter.
/// An unparseable `RUST_LOG` is reported on stderr rather than dropped.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let default = if verbose {
        "warn,stormpack=debug"
    } else {
        "warn,stormpack=info"
    };

    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!(
                "ignoring invalid {}={directives:?}: {e}; using {default:?}",
                EnvFilter::DEFAULT_ENV
            ),
        }
    }
    EnvFilter::new(default)
}
