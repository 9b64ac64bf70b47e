//! Keystone verifier: automated compliance document verification.

mod setup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keystone_core::Config;
use keystone_infra::{init_telemetry, shutdown_telemetry};
use keystone_worker::{listen_for_uploads, VerificationOrchestrator};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "keystone-verifier", about = "Compliance document verification worker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep pending documents, then verify new uploads until interrupted
    Serve,
    /// Run one forced verification attempt and print the outcome
    Reverify {
        /// Compliance document UUID
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_telemetry(&config.telemetry, &config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let pool = setup::setup_database(&config).await?;

    let result = match cli.command {
        Commands::Serve => serve(&config, pool).await,
        Commands::Reverify { id } => reverify(&config, pool, id).await,
    };

    shutdown_telemetry().await;
    result
}

async fn serve(config: &Config, pool: sqlx::PgPool) -> Result<()> {
    let orchestrator = setup::build_orchestrator(config, &pool, None)?;

    let queued = orchestrator
        .initialize()
        .await
        .context("Startup verification sweep failed")?;
    tracing::info!(
        queued,
        environment = %config.environment,
        "Verifier started"
    );

    tokio::select! {
        _ = listen_for_uploads(pool, &orchestrator) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutdown signal received");
        }
    }

    orchestrator.shutdown().await;
    Ok(())
}

async fn reverify(config: &Config, pool: sqlx::PgPool, id: Uuid) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(1);
    let orchestrator: VerificationOrchestrator =
        setup::build_orchestrator(config, &pool, Some(tx))?;

    if !orchestrator.reverify_document(id) {
        anyhow::bail!("Verification for {} could not be queued", id);
    }

    let (document_id, outcome) = rx
        .recv()
        .await
        .context("Verifier stopped before the attempt finished")?;
    println!("{} {}", document_id, outcome);

    orchestrator.shutdown().await;
    Ok(())
}
