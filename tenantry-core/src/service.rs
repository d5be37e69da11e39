//! Service facade
//!
//! [`Tenantry`] bundles the store with its collaborators: settings, the
//! credential hasher, the token service and the email dispatcher. The
//! operations themselves live in the sibling modules as `impl Tenantry`
//! blocks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tenantry_auth::{Argon2Hasher, CredentialHasher, JwtConfig, JwtService, PasswordPolicy};
use tenantry_notify::{DeliveryReport, DeliveryWarning, Dispatcher, Mailer};
use tenantry_rbac::{Decision, PermissionSet};
use uuid::Uuid;

use crate::authz;
use crate::config::Settings;
use crate::error::CoreResult;
use crate::store::EntityStore;

/// A successful result plus any non-fatal delivery warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// The operation's result
    pub value: T,
    /// Emails that could not be delivered
    pub warnings: Vec<DeliveryWarning>,
}

impl<T> Outcome<T> {
    /// An outcome without warnings.
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Attach the warnings of a delivery report.
    pub fn with_report(mut self, report: DeliveryReport) -> Self {
        self.warnings.extend(report.warnings);
        self
    }

    /// Whether every email went out.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drop the warnings.
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// The organization-management service.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tenantry_core::{NewAccount, NewOrganization, Settings, Tenantry};
/// use tenantry_notify::LogMailer;
///
/// async fn example() -> tenantry_core::CoreResult<()> {
///     let service = Tenantry::new(Settings::from_env()?, Arc::new(LogMailer))?;
///
///     let alice = service
///         .register(NewAccount::new("alice@acme.test", "correct horse battery"))
///         .await?;
///     let acme = service
///         .create_organization(alice.id, NewOrganization::new("Acme"))
///         .await?;
///
///     assert!(service.is_admin(alice.id, acme.organization.id).await);
///     Ok(())
/// }
/// ```
pub struct Tenantry {
    pub(crate) store: EntityStore,
    pub(crate) settings: Settings,
    pub(crate) hasher: Arc<dyn CredentialHasher>,
    pub(crate) jwt: JwtService,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) password_policy: PasswordPolicy,
}

impl std::fmt::Debug for Tenantry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tenantry")
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Tenantry {
    /// Create a service over an empty store.
    ///
    /// # Arguments
    ///
    /// * `settings` - Service settings
    /// * `mailer` - Transport for outgoing email
    ///
    /// # Returns
    ///
    /// The service, or an internal error if the signing secret or a
    /// lifetime is unusable
    pub fn new(settings: Settings, mailer: Arc<dyn Mailer>) -> CoreResult<Self> {
        settings.validate()?;
        let jwt = JwtService::new(JwtConfig::new(settings.secret_key.clone()))?;
        let dispatcher = Dispatcher::new(mailer, settings.frontend_url.clone());
        let password_policy = PasswordPolicy::new(settings.min_password_length);

        Ok(Self {
            store: EntityStore::new(),
            settings,
            hasher: Arc::new(Argon2Hasher::default()),
            jwt,
            dispatcher,
            password_policy,
        })
    }

    /// Use a different credential hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Use an existing store.
    pub fn with_store(mut self, store: EntityStore) -> Self {
        self.store = store;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Active settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decide whether a user may exercise a permission in an organization.
    ///
    /// Never errors: unknown users and organizations are simply denied.
    pub async fn authorize(&self, user_id: Uuid, org_id: Uuid, permission: &str) -> Decision {
        self.store
            .read(|t| authz::decide(t, user_id, org_id, permission))
            .await
    }

    /// Whether a user has admin standing in an organization.
    pub async fn is_admin(&self, user_id: Uuid, org_id: Uuid) -> bool {
        self.store
            .read(|t| authz::is_admin(t, user_id, org_id))
            .await
    }

    /// The permission names the caller holds in an organization.
    pub async fn effective_permissions(
        &self,
        actor: Uuid,
        org_id: Uuid,
    ) -> CoreResult<PermissionSet> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                Ok(authz::effective_permissions(t, actor, org_id))
            })
            .await
    }
}
