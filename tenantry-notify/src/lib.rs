//! # Tenantry Notifications
//!
//! Email notifications sent as side effects of membership changes.
//!
//! ## Overview
//!
//! Delivery is always best-effort: a failed send is logged and reported as a
//! [`DeliveryWarning`], never as an error of the operation that triggered it.
//!
//! - **Messages**: [`Notification`] renders the four emails the system sends
//! - **Mailers**: the [`Mailer`] trait, with in-memory, logging and HTTP relay
//!   implementations
//! - **Dispatch**: [`Dispatcher`] delivers one message or fans one out to many
//!   recipients concurrently
//!
//! ## Features
//!
//! - `http` (default): [`HttpMailer`] posting to a mail relay with reqwest
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenantry_notify::{Dispatcher, MemoryMailer, Notification};
//!
//! async fn example() {
//!     let mailer = Arc::new(MemoryMailer::new());
//!     let dispatcher = Dispatcher::new(mailer.clone(), "https://app.example.com");
//!
//!     let report = dispatcher
//!         .fan_out(
//!             vec!["a@example.com".to_string(), "b@example.com".to_string()],
//!             &Notification::JoinRequestReceived {
//!                 organization_name: "Acme".into(),
//!                 requester_name: "Carol".into(),
//!             },
//!         )
//!         .await;
//!
//!     assert!(report.warnings.is_empty());
//!     assert_eq!(mailer.sent().await.len(), 2);
//! }
//! ```

pub mod config;
pub mod dispatch;
#[cfg(feature = "http")]
pub mod http;
pub mod mailer;
pub mod message;
pub mod retry;

pub use config::{ConfigError, MailConfig};
pub use dispatch::{DeliveryReport, DeliveryWarning, Dispatcher};
pub use mailer::{LogMailer, MailError, MailResult, Mailer, MailerStats, MemoryMailer};
pub use message::{EmailMessage, Notification};
pub use retry::RetryConfig;

#[cfg(feature = "http")]
pub use http::HttpMailer;
