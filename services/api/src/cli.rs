use crate::infra::build_store;
use crate::server;
use appraisal_desk::config::{AppConfig, StoreConfig};
use appraisal_desk::error::AppError;
use appraisal_desk::seed::SeedSummary;
use appraisal_desk::{seed, telemetry};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "Appraisal Desk",
    about = "Serve and administer appraisal records from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Write the development fixture set into the configured store
    Seed,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the fixture set into the in-memory store before serving
    #[arg(long)]
    pub(crate) seed: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed => run_seed().await,
    }
}

async fn run_seed() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(summary) = seed_store(&config.store).await? {
        info!(
            locations = summary.locations,
            appraisals = summary.appraisals,
            utility_items = summary.utility_items,
            logs = summary.logs,
            "fixture set written"
        );
    }
    Ok(())
}

/// Seeds persistent backends only; an in-process store would be dropped on exit.
async fn seed_store(store_config: &StoreConfig) -> Result<Option<SeedSummary>, AppError> {
    if *store_config == StoreConfig::Memory {
        warn!("seed skipped: the in-memory store does not outlive this command");
        warn!("use `serve --seed` to load fixtures into a running in-memory desk");
        return Ok(None);
    }

    let summary = seed::seed(build_store(store_config)).await?;
    Ok(Some(summary))
}
