//! Configuration module
//!
//! Verifier configuration loaded from the environment: database, worker pool,
//! text extraction tools, language-model providers, decision constants,
//! email delivery and telemetry.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 10;

/// Scoring constants used by the decision engine.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionPolicy {
    pub base_confidence: f64,
    pub max_confidence: f64,
    /// Confidence an auto-approved document is raised to.
    pub approve_floor: f64,
    /// Minimum confidence for the user-facing status to become APPROVED.
    pub approve_threshold: f64,
    pub policy_number_weight: f64,
    pub issuer_weight: f64,
    pub dates_weight: f64,
    pub window_weight: f64,
    pub coverage_weight: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            base_confidence: 0.30,
            max_confidence: 0.98,
            approve_floor: 0.82,
            approve_threshold: 0.80,
            policy_number_weight: 0.25,
            issuer_weight: 0.20,
            dates_weight: 0.15,
            window_weight: 0.15,
            coverage_weight: 0.10,
        }
    }
}

/// SMTP settings for owner notifications.
#[derive(Clone, Debug, Default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    /// Base URL used to link to the document page in emails.
    pub frontend_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub service_name: String,
    pub service_version: String,
    pub protocol: String,
    pub sampler: String,
    pub sample_ratio: f64,
    pub metrics_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            service_name: "keystone-verifier".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol: "grpc".to_string(),
            sampler: "always_on".to_string(),
            sample_ratio: 1.0,
            metrics_interval_secs: 30,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub environment: String,
    pub db_max_connections: u32,
    // Worker pool
    pub verification_concurrency: usize,
    // Text extraction
    pub fetch_timeout_secs: u64,
    pub min_page_chars: usize,
    pub tesseract_path: String,
    /// Explicit rasterizer binary. When unset, `pdftoppm` is looked up on PATH.
    pub pdftoppm_path: Option<String>,
    pub raster_dpi: u32,
    // Language-model providers
    pub llm_max_chars: usize,
    pub llm_timeout_secs: u64,
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    // Extraction and decision
    pub policy_number_min_len: usize,
    pub decision: DecisionPolicy,
    pub email: EmailConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const VERIFICATION_CONCURRENCY: usize = 2;
        const FETCH_TIMEOUT_SECS: u64 = 20;
        const MIN_PAGE_CHARS: usize = 20;
        const RASTER_DPI: u32 = 200;
        const LLM_MAX_CHARS: usize = 6000;
        const LLM_TIMEOUT_SECS: u64 = 30;
        const POLICY_NUMBER_MIN_LEN: usize = 4;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let defaults = DecisionPolicy::default();
        let decision = DecisionPolicy {
            base_confidence: env::var("VERIFICATION_BASE_CONFIDENCE")
                .unwrap_or_else(|_| defaults.base_confidence.to_string())
                .parse()
                .unwrap_or(defaults.base_confidence),
            max_confidence: env::var("VERIFICATION_MAX_CONFIDENCE")
                .unwrap_or_else(|_| defaults.max_confidence.to_string())
                .parse()
                .unwrap_or(defaults.max_confidence),
            approve_floor: env::var("VERIFICATION_APPROVE_FLOOR")
                .unwrap_or_else(|_| defaults.approve_floor.to_string())
                .parse()
                .unwrap_or(defaults.approve_floor),
            approve_threshold: env::var("VERIFICATION_APPROVE_THRESHOLD")
                .unwrap_or_else(|_| defaults.approve_threshold.to_string())
                .parse()
                .unwrap_or(defaults.approve_threshold),
            ..defaults
        };

        let email = EmailConfig {
            enabled: env::var("EMAIL_NOTIFICATIONS_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            smtp_host: env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0),
            smtp_user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_from: env::var("SMTP_FROM").ok().filter(|s| !s.is_empty()),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|s| !s.is_empty()),
        };

        let telemetry = TelemetryConfig {
            enabled: env::var("OTEL_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "keystone-verifier".to_string()),
            service_version: env::var("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            protocol: env::var("OTEL_EXPORTER_OTLP_PROTOCOL")
                .unwrap_or_else(|_| "grpc".to_string()),
            sampler: env::var("OTEL_SAMPLER")
                .unwrap_or_else(|_| "always_on".to_string())
                .to_lowercase(),
            sample_ratio: env::var("OTEL_SAMPLE_RATIO")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .unwrap_or(1.0),
            metrics_interval_secs: env::var("OTEL_METRICS_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        };

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            environment,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            verification_concurrency: env::var("VERIFICATION_CONCURRENCY")
                .unwrap_or_else(|_| VERIFICATION_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(VERIFICATION_CONCURRENCY),
            fetch_timeout_secs: env::var("VERIFICATION_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            min_page_chars: env::var("VERIFICATION_MIN_PAGE_CHARS")
                .unwrap_or_else(|_| MIN_PAGE_CHARS.to_string())
                .parse()
                .unwrap_or(MIN_PAGE_CHARS),
            tesseract_path: env::var("TESSERACT_PATH")
                .unwrap_or_else(|_| "tesseract".to_string()),
            pdftoppm_path: env::var("PDFTOPPM_PATH").ok().filter(|s| !s.is_empty()),
            raster_dpi: env::var("RASTER_DPI")
                .unwrap_or_else(|_| RASTER_DPI.to_string())
                .parse()
                .unwrap_or(RASTER_DPI),
            llm_max_chars: env::var("VERIFICATION_LLM_MAX_CHARS")
                .unwrap_or_else(|_| LLM_MAX_CHARS.to_string())
                .parse()
                .unwrap_or(LLM_MAX_CHARS),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| LLM_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(LLM_TIMEOUT_SECS),
            ollama_base_url: env::var("OLLAMA_BASE_URL").ok().filter(|s| !s.is_empty()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.1".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            policy_number_min_len: env::var("POLICY_NUMBER_MIN_LEN")
                .unwrap_or_else(|_| POLICY_NUMBER_MIN_LEN.to_string())
                .parse()
                .unwrap_or(POLICY_NUMBER_MIN_LEN),
            decision,
            email,
            telemetry,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.verification_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "VERIFICATION_CONCURRENCY must be at least 1"
            ));
        }

        let policy = &self.decision;
        for (name, value) in [
            ("VERIFICATION_BASE_CONFIDENCE", policy.base_confidence),
            ("VERIFICATION_MAX_CONFIDENCE", policy.max_confidence),
            ("VERIFICATION_APPROVE_FLOOR", policy.approve_floor),
            ("VERIFICATION_APPROVE_THRESHOLD", policy.approve_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow::anyhow!("{} must be between 0.0 and 1.0", name));
            }
        }

        if policy.approve_floor > policy.max_confidence {
            return Err(anyhow::anyhow!(
                "VERIFICATION_APPROVE_FLOOR cannot exceed VERIFICATION_MAX_CONFIDENCE"
            ));
        }

        if self.email.enabled && (self.email.smtp_host.is_none() || self.email.smtp_from.is_none())
        {
            return Err(anyhow::anyhow!(
                "EMAIL_NOTIFICATIONS_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        Ok(())
    }
}
