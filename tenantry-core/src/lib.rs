//! # Tenantry Core
//!
//! Organization-scoped RBAC and membership lifecycle services.
//!
//! ## Overview
//!
//! The tenantry-core crate ties the model, auth and notification crates
//! together behind one service, [`Tenantry`]:
//! - **Authorization**: allow/deny for (user, organization, permission),
//!   plus admin standing from admin-flagged roles
//! - **Provisioning**: organization creation with a seeded permission
//!   catalog, an `Admin` role and a default member role
//! - **Catalog**: permission and role CRUD scoped to one organization
//! - **Members**: listing, role assignment, bulk updates and removal
//! - **Invitations**: issue, accept, resend, retarget, cancel
//! - **Join Requests**: request, approve/reject, withdraw
//! - **Accounts**: registration, sign-in, bearer tokens, password reset
//!
//! ## Architecture
//!
//! ```text
//! caller ──→ Tenantry ──→ authz (resolver) ──→ EntityStore::transaction
//!                 │                                     │
//!                 │                           commit or roll back
//!                 │                                     │
//!                 └────────── Dispatcher (email, after commit) ←┘
//! ```
//!
//! Every mutating operation runs inside a single store transaction; email
//! goes out only after the commit, and delivery failures come back as
//! [`Outcome::warnings`] instead of errors.
//!
//! ## Errors
//!
//! Operations return [`CoreError`]. Entities that exist in another
//! organization are reported as `NotFound`, never `Forbidden`; `Forbidden`
//! means the caller lacks membership, a permission or admin standing.

pub mod accounts;
pub mod authz;
pub mod catalog;
pub mod config;
pub mod error;
pub mod invitations;
pub mod join_requests;
pub mod members;
pub mod organizations;
pub mod provisioning;
pub mod service;
pub mod store;

// Re-export main types for convenience
pub use accounts::{AccessToken, NewAccount, BEARER};
pub use catalog::{NewPermission, NewRole, PermissionUpdate, RoleDetail, RoleUpdate};
pub use config::{ConfigError, Settings};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use invitations::{InvitationPreview, InvitationView, IssuedInvitation, NewInvitation};
pub use join_requests::JoinRequestView;
pub use members::{BulkAction, BulkOutcome, MemberFilter, MemberSort, MemberView, RoleRef};
pub use organizations::PlatformStats;
pub use provisioning::{ensure_default_permissions, NewOrganization, Provisioned};
pub use service::{Outcome, Tenantry};
pub use store::{EntityStore, StoreError, StoreResult, Tables};

#[cfg(feature = "http-mailer")]
pub use tenantry_notify::HttpMailer;
