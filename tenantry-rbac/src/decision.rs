//! Authorization decisions.

use serde::{Deserialize, Serialize};

/// Why an authorization check was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DenyReason {
    /// The user has no membership in the organization
    NotAMember,
    /// The user is a member, but none of their roles grants the permission
    MissingPermission(String),
    /// The user is a member, but holds no admin role
    NotAnAdmin,
    /// The user account is deactivated
    Inactive,
}

impl DenyReason {
    /// Caller-facing message for this reason.
    pub fn message(&self) -> String {
        match self {
            Self::NotAMember => "user does not belong to this organization".to_string(),
            Self::MissingPermission(name) => {
                format!("user does not have the required permission: {}", name)
            }
            Self::NotAnAdmin => "only organization admins can perform this action".to_string(),
            Self::Inactive => "user account is inactive".to_string(),
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The action is permitted
    Allow,
    /// The action is refused
    Deny(DenyReason),
}

impl Decision {
    /// Shorthand for [`Decision::Allow`].
    pub fn allow() -> Self {
        Self::Allow
    }

    /// Shorthand for a denial.
    pub fn deny(reason: DenyReason) -> Self {
        Self::Deny(reason)
    }

    /// Check if the decision allows the action.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Check if the decision denies the action.
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Get the denial reason, if any.
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }

    /// Combine two decisions, allowing if either allows.
    ///
    /// When both deny, the first reason wins.
    pub fn or(self, other: Decision) -> Decision {
        match (self, other) {
            (Self::Allow, _) | (_, Self::Allow) => Self::Allow,
            (deny, _) => deny,
        }
    }
}
