//! Database and component wiring

use anyhow::{Context, Result};
use keystone_core::Config;
use keystone_db::{ComplianceDocumentRepository, NotificationRepository};
use keystone_infra::VerificationMetrics;
use keystone_processing::{
    HttpDocumentSource, PdftoppmRasterizer, PageRasterizer, TesseractOcr, TextExtractionDriver,
};
use keystone_services::{
    ChannelNotifier, EmailService, FieldExtractionProvider, OllamaProvider, OpenAiProvider,
    ProviderChain,
};
use keystone_worker::{
    OrchestratorConfig, PipelineSettings, VerificationFinishedSender, VerificationOrchestrator,
    VerificationPipeline,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Connect to PostgreSQL and apply pending migrations.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

fn build_providers(config: &Config) -> Result<ProviderChain> {
    let timeout = Duration::from_secs(config.llm_timeout_secs);
    let mut providers: Vec<Arc<dyn FieldExtractionProvider>> = Vec::new();

    if let Some(base_url) = config.ollama_base_url.as_deref() {
        providers.push(Arc::new(OllamaProvider::new(
            base_url,
            &config.ollama_model,
            timeout,
        )?));
    }
    if let Some(api_key) = config.openai_api_key.as_deref() {
        providers.push(Arc::new(OpenAiProvider::new(
            &config.openai_base_url,
            api_key,
            &config.openai_model,
            timeout,
        )?));
    }

    let chain = ProviderChain::new(providers, config.llm_max_chars);
    if chain.is_empty() {
        tracing::info!("No language-model provider configured, using regex extraction only");
    } else {
        tracing::info!(
            providers = chain.len(),
            max_chars = config.llm_max_chars,
            "Language-model providers configured"
        );
    }
    Ok(chain)
}

/// Build the orchestrator and everything it depends on.
pub fn build_orchestrator(
    config: &Config,
    pool: &PgPool,
    finished_tx: Option<VerificationFinishedSender>,
) -> Result<VerificationOrchestrator> {
    let source = HttpDocumentSource::new(Duration::from_secs(config.fetch_timeout_secs))
        .context("Failed to create document HTTP client")?;
    let rasterizer = PdftoppmRasterizer::detect(config.pdftoppm_path.as_deref(), config.raster_dpi)
        .map(|r| Arc::new(r) as Arc<dyn PageRasterizer>);
    let extractor = TextExtractionDriver::new(
        Arc::new(source),
        Arc::new(TesseractOcr::new(config.tesseract_path.clone())),
        rasterizer,
        config.min_page_chars,
    );

    let notifier = ChannelNotifier::new(
        EmailService::from_config(&config.email),
        Some(NotificationRepository::new(pool.clone())),
    );

    let pipeline = VerificationPipeline::new(
        Arc::new(ComplianceDocumentRepository::new(pool.clone())),
        Arc::new(extractor),
        build_providers(config)?,
        Arc::new(notifier),
        VerificationMetrics::from_global(),
        PipelineSettings::from_config(config),
    );

    Ok(VerificationOrchestrator::new(
        Arc::new(pipeline),
        OrchestratorConfig {
            max_workers: config.verification_concurrency,
        },
        finished_tx,
    ))
}
