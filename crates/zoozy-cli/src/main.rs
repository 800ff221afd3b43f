use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zoozy_core::{db, logging, migrations};
use zoozy_sync::{SyncRequest, SyncService};

const SERVICE_NAME: &str = "zoozy-cli";

#[derive(Parser)]
#[command(name = "zoozy")]
#[command(about = "Zoozy pet-care marketplace backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Apply pending database migrations
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Reconcile a sync payload file into the database
    Sync {
        /// JSON file with `pets`, `providers` and `requests` arrays
        #[arg(long)]
        file: PathBuf,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => zoozy_api::run(zoozy_api::load_config()?).await?,
        Commands::Migrate { database_url } => run_migrate(&database_url).await?,
        Commands::Sync { file, database_url } => run_sync(&file, &database_url).await?,
    }

    Ok(())
}

async fn run_migrate(database_url: &str) -> Result<()> {
    logging::init(SERVICE_NAME);
    let pool = db::connect(database_url).await?;
    migrations::run(&pool).await?;
    info!("migrations applied");
    Ok(())
}

async fn run_sync(file: &Path, database_url: &str) -> Result<()> {
    logging::init(SERVICE_NAME);

    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let request: SyncRequest = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid sync payload", file.display()))?;

    let pool = db::connect(database_url).await?;
    migrations::run(&pool).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling sync");
            on_interrupt.cancel();
        }
    });

    let service = SyncService::new(pool, SERVICE_NAME);
    let report = service.sync(request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
