//! Parley
//!
//! Resolve a provider from a discovery fixture the way a consumer would at runtime.

use clap::{Parser, Subcommand};
use parley_arbitration::observability::{init_metrics, init_tracing, TracingConfig};
use parley_arbitration::ArbitrationConfig;
use parley_cli::{resolve, version, Fixture, ResolveArgs};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Provider arbitration over a discovery fixture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arbitrate one provider and print it as JSON
    Resolve(ResolveArgs),
    /// Print an example fixture to stdout
    Fixture,
    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fixture => {
            print!("{}", Fixture::example_yaml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("{}", version::build_info());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve(args) => run_resolve(args).await,
    }
}

async fn run_resolve(args: ResolveArgs) -> anyhow::Result<ExitCode> {
    init_tracing(TracingConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;
    info!(version = %version::full_version(), "Starting parley");

    let metrics = if args.metrics {
        Some(init_metrics().map_err(|e| anyhow::anyhow!(e))?)
    } else {
        None
    };

    let fixture = Fixture::load(&args.fixture)?;
    let config = ArbitrationConfig::from_env();
    let outcome = resolve(&args, fixture, &config).await;

    if let Some(metrics) = metrics {
        eprint!("{}", metrics.render());
    }

    match outcome {
        Ok(entry) => {
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            warn!(error = %error, "Arbitration failed");
            eprintln!("error: {error}");
            Ok(ExitCode::FAILURE)
        }
    }
}
