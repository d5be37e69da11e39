//! # Tenantry Organization Models
//!
//! Entity models for multi-tenant organization management.
//!
//! ## Overview
//!
//! The tenantry-org crate defines:
//! - **Users**: Accounts that can belong to many organizations
//! - **Organizations**: Tenants, with system-wide unique names
//! - **Roles**: Named sets of permissions scoped to one organization
//! - **Permissions**: Named capabilities scoped to one organization
//! - **Memberships**: One row per (user, organization) with a set of roles
//! - **Invitations**: Admin-issued, token-redeemed offers to join
//! - **Join Requests**: Self-service requests to join, resolved by admins
//!
//! ## Architecture
//!
//! Entities reference each other by ID only; nothing owns anything else.
//!
//! ```text
//! User ─┬─ Membership ──→ Organization
//!       │     └─ {role_id} ──→ Role ──→ {permission_id} ──→ Permission
//!       ├─ JoinRequest ──→ Organization
//!       └─ (email) ← Invitation ──→ Organization, Role
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tenantry_org::{Membership, Organization, Role, User};
//!
//! let owner = User::new("owner@acme.test", "$argon2id$...", Some("Owner".into()));
//! let org = Organization::new("Acme", owner.id);
//! let admin = Role::admin(org.id);
//!
//! let membership = Membership::new(org.id, owner.id).with_role(admin.id);
//! assert!(membership.has_role(admin.id));
//! ```

pub mod invitation;
pub mod join_request;
pub mod membership;
pub mod organization;
pub mod permission;
pub mod roles;
pub mod user;

// Re-export main types for convenience
pub use invitation::{Invitation, InvitationStatus, INVITATION_TTL_DAYS};
pub use join_request::{JoinRequest, JoinRequestStatus};
pub use membership::Membership;
pub use organization::{Organization, OrganizationSummary, OrganizationUpdate};
pub use permission::Permission;
pub use roles::{Role, ADMIN_ROLE_NAME, MEMBER_ROLE_NAME};
pub use user::{User, UserStatus};

/// Normalize a name for case-insensitive uniqueness comparisons.
///
/// Trims surrounding whitespace and lowercases.
///
/// ```
/// assert_eq!(tenantry_org::name_key("  Acme Corp "), "acme corp");
/// ```
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
