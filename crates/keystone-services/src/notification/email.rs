//! SMTP delivery for owner notifications.

use anyhow::{Context, Result};
use keystone_core::EmailConfig;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Sends multipart (plain text + HTML) emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailService {
    /// Returns `None` when email is disabled or SMTP is not configured.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        if !config.enabled {
            tracing::debug!("Email notifications disabled (EMAIL_NOTIFICATIONS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from: Mailbox = match config.smtp_from.as_deref()?.parse() {
            Ok(from) => from,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid SMTP_FROM, email notifications disabled");
                return None;
            }
        };
        let port = config.smtp_port.unwrap_or(587);
        let credentials = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        };

        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            starttls = config.smtp_tls,
            "Email service initialized"
        );

        Some(Self {
            mailer: Arc::new(builder.build()),
            from,
        })
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))
            .context("Failed to build email")?;

        self.mailer
            .send(email)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}
