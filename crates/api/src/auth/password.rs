//! Argon2id credential hashing and verification.
//!
//! The salt is generated per credential and stored next to the hash. The hash
//! itself is a PHC string, so it also embeds the salt and the Argon2
//! parameters; [`CredentialHasher::verify`] insists that both salts agree.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Opaque failure of the underlying hashing primitive.
///
/// Deliberately carries no plaintext or hash material.
#[derive(Debug, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct HashError(argon2::password_hash::Error);

/// Salts, hashes, and verifies plaintext credentials.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Argon2id with the crate's default cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh random salt (B64-encoded, 16 bytes of OS entropy).
    pub fn generate_salt(&self) -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    /// Hash `plaintext` with `salt`, returning the PHC-formatted hash.
    ///
    /// Deterministic for a given `(plaintext, salt)` pair.
    pub fn hash(&self, plaintext: &str, salt: &str) -> Result<String, HashError> {
        let salt = SaltString::from_b64(salt).map_err(HashError)?;
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(HashError)?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored `hash` produced with `salt`.
    ///
    /// The final digest comparison is constant-time. A hash whose embedded
    /// salt differs from `salt` never verifies.
    pub fn verify(&self, plaintext: &str, hash: &str, salt: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(HashError)?;
        if parsed.salt.map(|s| s.as_str()) != Some(salt) {
            return Ok(false);
        }
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let hash = hasher
            .hash("correct-horse-battery-staple", &salt)
            .expect("hashing should succeed");

        assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(!hash.contains("correct-horse"), "hash must not embed plaintext");

        let verified = hasher
            .verify("correct-horse-battery-staple", &hash, &salt)
            .expect("verify should succeed");
        assert!(verified, "correct password should verify as true");
    }

    #[test]
    fn test_wrong_password_fails() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let hash = hasher.hash("real-password", &salt).unwrap();

        let verified = hasher.verify("wrong-password", &hash, &salt).unwrap();
        assert!(!verified, "wrong password should verify as false");
    }

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        assert_eq!(
            hasher.hash("same", &salt).unwrap(),
            hasher.hash("same", &salt).unwrap()
        );
    }

    #[test]
    fn test_distinct_plaintexts_distinct_hashes() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        assert_ne!(
            hasher.hash("password-one", &salt).unwrap(),
            hasher.hash("password-two", &salt).unwrap()
        );
    }

    #[test]
    fn test_generated_salts_differ() {
        let hasher = CredentialHasher::new();
        assert_ne!(hasher.generate_salt(), hasher.generate_salt());
    }

    #[test]
    fn test_mismatched_salt_fails() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let other = hasher.generate_salt();
        let hash = hasher.hash("password", &salt).unwrap();

        assert!(!hasher.verify("password", &hash, &other).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_error() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        assert!(hasher.verify("password", "not-a-phc-string", &salt).is_err());
    }
}
