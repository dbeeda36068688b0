//! Outbound account emails: verification and password reset.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{EmailConfig, EmailProvider};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email provider rejected the message: {status}")]
    Rejected { status: reqwest::StatusCode },

    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Link the user follows to verify their address.
#[must_use]
pub fn verification_link(public_url: &str, token: &str) -> String {
    format!(
        "{}/auth/verify?token={}",
        public_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

#[must_use]
pub fn password_reset_link(public_url: &str, token: &str) -> String {
    format!(
        "{}/auth/reset-password?token={}",
        public_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), EmailError>;

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError>;
}

/// Writes links to the log. For development and self-hosting without mail.
pub struct LogMailer {
    public_url: String,
}

impl LogMailer {
    #[must_use]
    pub const fn new(public_url: String) -> Self {
        Self { public_url }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), EmailError> {
        info!(
            event = "verification_email",
            to = %email,
            link = %verification_link(&self.public_url, token),
            "Verification email (log provider)"
        );
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError> {
        info!(
            event = "password_reset_email",
            to = %email,
            link = %password_reset_link(&self.public_url, token),
            "Password reset email (log provider)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Sends through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
    public_url: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig, api_key: String, public_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("Tsundoku/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.resend_url.clone(),
            api_key,
            from: config.from.clone(),
            public_url,
        })
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), EmailError> {
        let message = ResendMessage {
            from: &self.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Resend rejected email");
            return Err(EmailError::Rejected { status });
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), EmailError> {
        let link = verification_link(&self.public_url, token);
        let html = format!(
            "<p>Welcome to Tsundoku!</p>\
             <p><a href=\"{link}\">Verify your email address</a></p>\
             <p>This link expires in 24 hours.</p>"
        );
        self.send(email, "Verify your email", html).await
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<(), EmailError> {
        let link = password_reset_link(&self.public_url, token);
        let html = format!(
            "<p>Someone asked to reset your Tsundoku password.</p>\
             <p><a href=\"{link}\">Choose a new password</a></p>\
             <p>This link expires in 1 hour. If it wasn't you, ignore this email.</p>"
        );
        self.send(email, "Reset your password", html).await
    }
}

/// Builds the mailer selected by `email.provider`.
pub fn build_mailer(config: &EmailConfig, public_url: &str) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.provider {
        EmailProvider::Log => Ok(Arc::new(LogMailer::new(public_url.to_string()))),
        EmailProvider::Resend => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Resend provider selected without an API key"))?;
            Ok(Arc::new(ResendMailer::new(
                config,
                api_key,
                public_url.to_string(),
            )?))
        }
    }
}
