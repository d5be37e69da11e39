//! Opaque random tokens
//!
//! Invitation tokens are 32 random bytes, URL-safe base64 encoded. Only
//! the hex SHA-256 digest is ever persisted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes in an invitation token.
pub const TOKEN_BYTES: usize = 32;

/// Length of generated temporary passwords.
pub const TEMP_PASSWORD_LEN: usize = 16;

/// A freshly issued token: the plaintext to hand out and the digest to store.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Plaintext token, shown once
    pub plaintext: String,
    /// Hex SHA-256 digest of the plaintext
    pub digest: String,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"[REDACTED]")
            .field("digest", &self.digest)
            .finish()
    }
}

/// Generate a new invitation token.
pub fn issue_invitation_token() -> IssuedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = URL_SAFE_NO_PAD.encode(bytes);
    let digest = hash_token(&plaintext);
    IssuedToken { plaintext, digest }
}

/// Hex SHA-256 digest of a token.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Random alphanumeric password for accounts provisioned on invitation.
pub fn generate_temp_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = issue_invitation_token();
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.plaintext.len(), 43);
        assert!(!token.plaintext.contains('+'));
        assert!(!token.plaintext.contains('/'));
        assert_eq!(token.digest.len(), 64);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = issue_invitation_token();
        let b = issue_invitation_token();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let token = issue_invitation_token();
        let debug = format!("{:?}", token);
        assert!(!debug.contains(&token.plaintext));
    }

    #[test]
    fn test_temp_password() {
        let password = generate_temp_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
