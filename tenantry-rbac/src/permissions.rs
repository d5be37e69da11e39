//! # Permissions
//!
//! The set of permission names granted to a member within one organization.
//! A member's effective permissions are the union over every role attached
//! to their membership.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::decision::{Decision, DenyReason};

/// A set of permission names.
///
/// Names are compared exactly; permission names are stored normalized by the
/// catalog, so no case folding happens here.
///
/// # Example
///
/// ```
/// use tenantry_rbac::PermissionSet;
///
/// let mut set = PermissionSet::new();
/// set.insert("view_members");
/// set.insert("manage_roles");
///
/// assert!(set.has("view_members"));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: BTreeSet<String>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: BTreeSet::new(),
        }
    }

    /// Add a permission name. Returns `true` if it was not already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.permissions.insert(name.into())
    }

    /// Remove a permission name. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.permissions.remove(name)
    }

    /// Check if the set grants a permission.
    pub fn has(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Resolve a permission check against this set.
    ///
    /// The caller is assumed to be a member; membership and superuser checks
    /// happen before a set is built.
    pub fn decide(&self, name: &str) -> Decision {
        if self.has(name) {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::MissingPermission(name.to_string()))
        }
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Iterate over the names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Check if this set grants every permission of another set.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        other.permissions.is_subset(&self.permissions)
    }
}

impl<S: Into<String>> Extend<S> for PermissionSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for name in iter {
            self.insert(name);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        set.extend(iter);
        set
    }
}
