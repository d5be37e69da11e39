//! Notification messages
//!
//! Each [`Notification`] renders into an [`EmailMessage`] with an HTML and a
//! plain-text body. Links point at the frontend given at render time.

use serde::{Deserialize, Serialize};

/// A rendered email ready for a [`Mailer`](crate::Mailer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html_body: String,
    /// Plain-text body
    pub text_body: String,
    /// Notification kind, for logs and warnings
    pub kind: String,
}

/// The notifications the system sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Invitation to join an organization
    Invitation {
        /// Organization name
        organization_name: String,
        /// Who sent the invitation
        inviter_name: String,
        /// Plaintext invitation token
        token: String,
        /// Temporary password for a provisioned account
        temp_password: Option<String>,
    },
    /// Sent to each admin when someone asks to join
    JoinRequestReceived {
        /// Organization name
        organization_name: String,
        /// Requester's display name
        requester_name: String,
    },
    /// Sent to the requester once a decision is made
    JoinRequestResolved {
        /// Organization name
        organization_name: String,
        /// `approved` or `rejected`
        status: String,
    },
    /// Password reset link
    PasswordReset {
        /// Signed reset token
        token: String,
    },
}

impl Notification {
    /// Short kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invitation { .. } => "invitation",
            Self::JoinRequestReceived { .. } => "join_request_received",
            Self::JoinRequestResolved { .. } => "join_request_resolved",
            Self::PasswordReset { .. } => "password_reset",
        }
    }

    /// Subject line.
    pub fn subject(&self) -> String {
        match self {
            Self::Invitation {
                organization_name, ..
            } => format!("Invitation to join {}", organization_name),
            Self::JoinRequestReceived {
                organization_name, ..
            } => format!("New join request for {}", organization_name),
            Self::JoinRequestResolved {
                organization_name, ..
            } => format!("Update on your join request for {}", organization_name),
            Self::PasswordReset { .. } => "Password Reset Request".to_string(),
        }
    }

    /// Call-to-action link for this notification.
    pub fn link(&self, frontend_url: &str) -> String {
        let base = frontend_url.trim_end_matches('/');
        match self {
            Self::Invitation { token, .. } => format!("{}/join?token={}", base, token),
            Self::JoinRequestReceived { .. } => format!("{}/dashboard/members?tab=requests", base),
            Self::JoinRequestResolved { .. } => format!("{}/login", base),
            Self::PasswordReset { token } => format!("{}/reset-password?token={}", base, token),
        }
    }

    /// Render the plain-text body.
    fn text(&self, link: &str) -> String {
        match self {
            Self::Invitation {
                organization_name,
                inviter_name,
                temp_password,
                ..
            } => {
                let mut body = format!(
                    "Hello,\n\n{} has invited you to join {}.\n\nAccept the invitation here:\n{}\n",
                    inviter_name, organization_name, link
                );
                if let Some(password) = temp_password {
                    body.push_str(&format!(
                        "\nAn account was created for you. Your temporary password is: {}\n\
                         Please change it after your first login.\n",
                        password
                    ));
                }
                body.push_str("\nThis invitation expires in 7 days.\n");
                body
            }
            Self::JoinRequestReceived {
                organization_name,
                requester_name,
            } => format!(
                "{} has asked to join {}.\n\nReview pending requests:\n{}\n",
                requester_name, organization_name, link
            ),
            Self::JoinRequestResolved {
                organization_name,
                status,
            } => format!(
                "Your request to join {} has been {}.\n\nSign in:\n{}\n",
                organization_name, status, link
            ),
            Self::PasswordReset { .. } => format!(
                "We received a request to reset your password.\n\n\
                 Reset it here (valid for 24 hours):\n{}\n\n\
                 If you did not ask for this, you can ignore this email.\n",
                link
            ),
        }
    }

    /// Render for a recipient.
    pub fn render(&self, to: impl Into<String>, frontend_url: &str) -> EmailMessage {
        let link = self.link(frontend_url);
        let text_body = self.text(&link);
        let html_body = format!(
            "<html><body>{}<p><a href=\"{}\">{}</a></p></body></html>",
            text_body
                .split("\n\n")
                .filter(|p| !p.trim().is_empty())
                .map(|p| format!("<p>{}</p>", escape_html(p.trim()).replace('\n', "<br>")))
                .collect::<String>(),
            escape_html(&link),
            escape_html(&link),
        );

        EmailMessage {
            to: to.into(),
            subject: self.subject(),
            html_body,
            text_body,
            kind: self.kind().to_string(),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTEND: &str = "https://app.example.com/";

    #[test]
    fn test_invitation_rendering() {
        let msg = Notification::Invitation {
            organization_name: "Acme".into(),
            inviter_name: "Alice".into(),
            token: "tok123".into(),
            temp_password: None,
        }
        .render("b@x.com", FRONTEND);

        assert_eq!(msg.to, "b@x.com");
        assert_eq!(msg.subject, "Invitation to join Acme");
        assert_eq!(msg.kind, "invitation");
        assert!(msg.text_body.contains("https://app.example.com/join?token=tok123"));
        assert!(!msg.text_body.contains("temporary password"));
    }

    #[test]
    fn test_invitation_with_temp_password() {
        let msg = Notification::Invitation {
            organization_name: "Acme".into(),
            inviter_name: "Alice".into(),
            token: "tok".into(),
            temp_password: Some("Xy12".into()),
        }
        .render("b@x.com", FRONTEND);

        assert!(msg.text_body.contains("temporary password is: Xy12"));
    }

    #[test]
    fn test_join_request_links() {
        let received = Notification::JoinRequestReceived {
            organization_name: "Acme".into(),
            requester_name: "Carol".into(),
        };
        assert_eq!(received.subject(), "New join request for Acme");
        assert_eq!(
            received.link(FRONTEND),
            "https://app.example.com/dashboard/members?tab=requests"
        );

        let resolved = Notification::JoinRequestResolved {
            organization_name: "Acme".into(),
            status: "approved".into(),
        };
        assert_eq!(resolved.subject(), "Update on your join request for Acme");
        assert_eq!(resolved.link(FRONTEND), "https://app.example.com/login");
    }

    #[test]
    fn test_password_reset() {
        let msg = Notification::PasswordReset { token: "jwt".into() }.render("a@x.com", FRONTEND);
        assert_eq!(msg.subject, "Password Reset Request");
        assert!(msg.text_body.contains("https://app.example.com/reset-password?token=jwt"));
    }

    #[test]
    fn test_html_is_escaped() {
        let msg = Notification::JoinRequestReceived {
            organization_name: "A&B".into(),
            requester_name: "<script>".into(),
        }
        .render("admin@x.com", FRONTEND);

        assert!(msg.html_body.contains("&lt;script&gt;"));
        assert!(msg.html_body.contains("A&amp;B"));
        assert!(!msg.html_body.contains("<script>"));
    }
}
