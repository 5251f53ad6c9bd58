//! Mail delivery for invitations.
//!
//! Supported providers:
//! - `console`: logs the message (development)
//! - `sendgrid`: SendGrid v3 mail API

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::MailConfig;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to send mail: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// A plain-text mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Sends mail. Handlers only see this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Builds the mail telling an invited user how to log in.
pub fn invitation_message(
    app_title: &str,
    to: &str,
    password: &str,
    site_url: Option<&str>,
) -> MailMessage {
    let login = match site_url {
        Some(url) => format!("Log in at {}/login with:", url),
        None => "Log in with:".to_string(),
    };

    MailMessage {
        to: to.to_string(),
        subject: format!("Invitation to {}", app_title),
        body_text: format!(
            r#"Hello,

You have been invited to {title}.

{login}

  Email:    {to}
  Password: {password}

Please change the password after your first login.

{title}"#,
            title = app_title,
            login = login,
            to = to,
            password = password,
        ),
    }
}

/// Provider-backed [`Mailer`].
#[derive(Clone)]
pub struct MailService {
    config: Arc<MailConfig>,
    client: reqwest::Client,
}

impl MailService {
    pub fn new(config: MailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    async fn send_console(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail (console provider)"
        );
        debug!(body_length = message.body_text.len(), "Mail body");
        Ok(())
    }

    async fn send_sendgrid(&self, message: MailMessage) -> Result<(), MailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(MailError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.body_text }]
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            info!(to = %message.to, subject = %message.subject, "Mail sent via SendGrid");
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, error = %error_body, "SendGrid API error");
        Err(MailError::ProviderError(format!(
            "SendGrid returned {}: {}",
            status, error_body
        )))
    }
}

#[async_trait]
impl Mailer for MailService {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if !self.config.enabled {
            debug!(to = %message.to, subject = %message.subject, "Mail disabled, skipping send");
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => Err(MailError::NotConfigured(format!(
                "unknown provider {}",
                provider
            ))),
        }
    }
}
