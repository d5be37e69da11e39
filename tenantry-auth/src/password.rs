//! Password hashing with Argon2id.

use crate::error::{AuthError, AuthResult};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand::rngs::OsRng;

/// Minimum password length accepted by default.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes and verifies credentials.
///
/// The services only ever see encoded hashes; swapping the algorithm means
/// swapping this implementation.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into an encoded string.
    fn hash(&self, password: &str) -> AuthResult<String>;

    /// Check a plaintext password against an encoded hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors mean the hash is unusable.
    fn verify(&self, password: &str, encoded: &str) -> AuthResult<bool>;
}

/// Argon2id hasher with a configurable memory cost.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_cost_log2: u32,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost_log2: 16,
        }
    }
}

impl Argon2Hasher {
    /// Create a hasher using `2^memory_cost_log2` KiB of memory.
    ///
    /// 12 (~4MB) suits tests; 16 (~64MB) suits production.
    pub fn with_memory_cost(memory_cost_log2: u32) -> Self {
        Self {
            memory_cost_log2: memory_cost_log2.min(22),
        }
    }

    /// Cheap parameters for test suites.
    pub fn fast() -> Self {
        Self::with_memory_cost(10)
    }

    fn argon2(&self) -> AuthResult<Argon2<'static>> {
        let params = Params::new(1u32 << self.memory_cost_log2, 3, 1, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(encoded).map_err(|e| AuthError::Hashing(e.to_string()))?;
        // Parameters come from the encoded hash.
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}

/// Password acceptance rules.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum length in characters
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Policy with the given minimum length.
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Validate a candidate password.
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        Ok(())
    }
}
