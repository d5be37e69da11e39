//! HTTP mail relay client.
//!
//! Posts rendered messages as JSON to `{api_url}/v1/messages` with a bearer
//! key. Transient failures are retried with exponential backoff; 4xx
//! responses fail immediately.

use crate::config::MailConfig;
use crate::mailer::{MailError, MailResult, Mailer};
use crate::message::EmailMessage;
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Relay endpoint path.
const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, Serialize)]
struct RelayAddress<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: RelayAddress<'a>,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    tag: &'a str,
}

/// Mailer backed by an HTTP relay.
#[derive(Clone)]
pub struct HttpMailer {
    /// HTTP client instance.
    client: Client,

    /// Relay configuration.
    config: MailConfig,

    /// Backoff policy.
    retry: RetryConfig,
}

impl std::fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailer")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish()
    }
}

impl HttpMailer {
    /// Create a relay mailer.
    ///
    /// The attempt budget comes from `config.max_retries`.
    pub fn new(config: MailConfig) -> MailResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MailError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let retry = RetryConfig::with_attempts(config.max_retries);

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Override the backoff policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Relay configuration.
    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    async fn post_once(&self, message: &EmailMessage) -> MailResult<()> {
        let body = RelayMessage {
            from: RelayAddress {
                email: &self.config.from_email,
                name: &self.config.from_name,
            },
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
            text: &message.text_body,
            tag: &message.kind,
        };

        let mut request = self.client.post(self.config.url(MESSAGES_PATH)).json(&body);
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> MailResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("Mail relay error ({}): {}", status.as_u16(), message);

        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Err(MailError::InvalidRecipient(message));
        }
        Err(MailError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, message), fields(to = %message.to, kind = %message.kind))]
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        debug!("Posting message to mail relay");
        with_retry_if(&self.retry, || self.post_once(message), MailError::is_retryable).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
