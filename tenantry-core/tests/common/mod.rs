//! Shared fixture for service-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use tenantry_auth::Argon2Hasher;
use tenantry_core::{NewAccount, NewOrganization, Provisioned, Settings, Tenantry};
use tenantry_notify::MemoryMailer;
use tenantry_org::User;

pub const PASSWORD: &str = "correct horse battery";

/// A service over an empty store, with an in-memory mailer and a fast hasher.
pub struct TestFixture {
    pub service: Tenantry,
    pub mailer: Arc<MemoryMailer>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let mailer = Arc::new(MemoryMailer::new());
        let service = Tenantry::new(settings, mailer.clone())
            .expect("service")
            .with_hasher(Arc::new(Argon2Hasher::fast()));
        Self { service, mailer }
    }

    /// Register an active user with the shared test password.
    pub async fn user(&self, email: &str) -> User {
        self.service
            .register(NewAccount::new(email, PASSWORD))
            .await
            .expect("register")
    }

    pub async fn named_user(&self, email: &str, name: &str) -> User {
        self.service
            .register(NewAccount::new(email, PASSWORD).with_full_name(name))
            .await
            .expect("register")
    }

    pub async fn superuser(&self, email: &str) -> User {
        self.service
            .create_superuser(NewAccount::new(email, PASSWORD))
            .await
            .expect("superuser")
    }

    pub async fn org(&self, owner: &User, name: &str) -> Provisioned {
        self.service
            .create_organization(owner.id, NewOrganization::new(name))
            .await
            .expect("create organization")
    }

    /// Text body of the last email sent to `to`.
    pub async fn last_email_text(&self, to: &str) -> String {
        self.mailer
            .last_to(to)
            .await
            .map(|m| m.text_body)
            .expect("email sent")
    }
}

/// Value of `token=` in an email body.
pub fn token_from(text: &str) -> String {
    let start = text.find("token=").expect("token in email") + "token=".len();
    text[start..]
        .split_whitespace()
        .next()
        .expect("token value")
        .to_string()
}

/// Temporary password from an invitation email body.
pub fn temp_password_from(text: &str) -> String {
    let marker = "temporary password is: ";
    let start = text.find(marker).expect("temp password in email") + marker.len();
    text[start..]
        .split_whitespace()
        .next()
        .expect("password value")
        .to_string()
}
