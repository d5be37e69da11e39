//! # Tenantry RBAC
//!
//! Permission vocabulary shared by every Tenantry crate.
//!
//! ## Overview
//!
//! Permissions in Tenantry are plain names scoped to an organization
//! (`invite_members`, `manage_roles`, ...). Roles hold sets of them, and a
//! membership holds a set of roles. This crate provides:
//!
//! - **Catalog**: The default permissions seeded into every organization,
//!   grouped into categories
//! - **Permission Sets**: The union of permission names granted to a member
//! - **Decisions**: Allow/deny outcomes carrying the reason for a denial
//!
//! ## Architecture
//!
//! ```text
//! Membership ─→ {Role} ─→ {Permission name}
//!                              │
//!                     PermissionSet (union)
//!                              │
//!                 Decision::Allow | Decision::Deny(reason)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tenantry_rbac::{names, Decision, PermissionSet};
//!
//! let mut granted = PermissionSet::new();
//! granted.extend([names::VIEW_MEMBERS, names::INVITE_MEMBERS]);
//!
//! assert!(granted.has(names::INVITE_MEMBERS));
//! assert!(granted.decide(names::MANAGE_BILLING).is_denied());
//! assert_eq!(Decision::allow(), granted.decide(names::VIEW_MEMBERS));
//! ```

pub mod catalog;
pub mod decision;
pub mod permissions;

// Re-export main types for convenience
pub use catalog::{names, DefaultPermission, PermissionCategory, DEFAULT_PERMISSIONS};
pub use decision::{Decision, DenyReason};
pub use permissions::PermissionSet;
