//! Mail transports
//!
//! This module provides the mailer abstraction and the in-process
//! implementations. The HTTP relay lives in [`crate::http`].

use crate::message::EmailMessage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Mail delivery error types.
#[derive(Debug, Error)]
pub enum MailError {
    /// The relay refused the message
    #[error("Relay rejected message ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the relay.
        message: String,
    },

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Recipient address unusable
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Mailer misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

impl MailError {
    /// Whether a later attempt might succeed.
    ///
    /// Transport failures, rate limiting and 5xx responses are retried;
    /// other rejections are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            MailError::Transport(_) => true,
            MailError::Rejected { status, .. } => *status >= 500 || *status == 429,
            MailError::InvalidRecipient(_) | MailError::Config(_) => false,
        }
    }
}

/// Sends rendered messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> MailResult<()>;

    /// Transport name for logs.
    fn name(&self) -> &'static str;
}

/// Mailer statistics.
#[derive(Debug, Clone, Default)]
pub struct MailerStats {
    /// Messages accepted
    pub sent: u64,
    /// Messages refused
    pub failed: u64,
}

/// In-memory mailer.
///
/// Keeps every delivered message in an outbox. Recipients registered with
/// [`MemoryMailer::fail_for`] are refused, which lets tests exercise the
/// best-effort paths.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Arc<RwLock<Vec<EmailMessage>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    stats: Arc<RwLock<MailerStats>>,
}

impl std::fmt::Debug for MemoryMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMailer").finish_non_exhaustive()
    }
}

impl MemoryMailer {
    /// Create an empty mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every message addressed to `recipient`.
    pub async fn fail_for(&self, recipient: impl Into<String>) {
        self.failing.write().await.insert(recipient.into());
    }

    /// Everything delivered so far.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.outbox.read().await.clone()
    }

    /// Messages delivered to one recipient.
    pub async fn sent_to(&self, recipient: &str) -> Vec<EmailMessage> {
        self.outbox
            .read()
            .await
            .iter()
            .filter(|m| m.to == recipient)
            .cloned()
            .collect()
    }

    /// Most recent message for a recipient.
    pub async fn last_to(&self, recipient: &str) -> Option<EmailMessage> {
        self.outbox
            .read()
            .await
            .iter()
            .rev()
            .find(|m| m.to == recipient)
            .cloned()
    }

    /// Empty the outbox.
    pub async fn clear(&self) {
        self.outbox.write().await.clear();
    }

    /// Get mailer stats.
    pub async fn stats(&self) -> MailerStats {
        self.stats.read().await.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        if self.failing.read().await.contains(&message.to) {
            self.stats.write().await.failed += 1;
            return Err(MailError::Rejected {
                status: 550,
                message: format!("mailbox unavailable: {}", message.to),
            });
        }

        self.outbox.write().await.push(message.clone());
        self.stats.write().await.sent += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Mailer that only logs.
///
/// Useful in development when no relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        info!(
            to = %message.to,
            kind = %message.kind,
            subject = %message.subject,
            "Mail relay not configured; logging message instead"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
