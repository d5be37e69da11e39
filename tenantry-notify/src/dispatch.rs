//! Best-effort delivery
//!
//! The dispatcher renders notifications and hands them to a mailer. A
//! failed send is logged and turned into a [`DeliveryWarning`]; it is never
//! returned as an error.

use crate::mailer::Mailer;
use crate::message::Notification;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A delivery that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWarning {
    /// Intended recipient
    pub recipient: String,
    /// Notification kind
    pub kind: String,
    /// What went wrong
    pub error: String,
}

impl std::fmt::Display for DeliveryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to deliver {} email to {}: {}",
            self.kind, self.recipient, self.error
        )
    }
}

/// Outcome of one or more deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Recipients that were reached
    pub delivered: Vec<String>,
    /// Recipients that were not
    pub warnings: Vec<DeliveryWarning>,
}

impl DeliveryReport {
    /// Whether every delivery succeeded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered.extend(other.delivered);
        self.warnings.extend(other.warnings);
    }
}

/// Renders and sends notifications.
#[derive(Clone)]
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mailer", &self.mailer.name())
            .field("frontend_url", &self.frontend_url)
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher whose links point at `frontend_url`.
    pub fn new(mailer: Arc<dyn Mailer>, frontend_url: impl Into<String>) -> Self {
        Self {
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    /// Frontend base URL used in links.
    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    /// Send one notification to one recipient.
    pub async fn deliver(&self, recipient: &str, notification: &Notification) -> DeliveryReport {
        let message = notification.render(recipient, &self.frontend_url);
        let mut report = DeliveryReport::default();

        match self.mailer.send(&message).await {
            Ok(()) => {
                debug!(to = %recipient, kind = notification.kind(), "Email delivered");
                report.delivered.push(recipient.to_string());
            }
            Err(e) => {
                warn!(
                    to = %recipient,
                    kind = notification.kind(),
                    mailer = self.mailer.name(),
                    error = %e,
                    "Email delivery failed"
                );
                report.warnings.push(DeliveryWarning {
                    recipient: recipient.to_string(),
                    kind: notification.kind().to_string(),
                    error: e.to_string(),
                });
            }
        }
        report
    }

    /// Send the same notification to many recipients concurrently.
    ///
    /// Duplicate recipients receive one copy. Each send is independent.
    pub async fn fan_out(
        &self,
        recipients: impl IntoIterator<Item = String>,
        notification: &Notification,
    ) -> DeliveryReport {
        let mut seen = HashSet::new();
        let unique: Vec<String> = recipients
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();

        let results = join_all(unique.iter().map(|r| self.deliver(r, notification))).await;

        results
            .into_iter()
            .fold(DeliveryReport::default(), |mut acc, report| {
                acc.merge(report);
                acc
            })
    }
}
