//! Authentication primitives.
//!
//! - [`password`] -- Argon2id credential hashing and verification.
//! - [`jwt`] -- signed token issuance and verification.
//! - [`verifier`] -- token usability (signature, expiry, revocation).

pub mod jwt;
pub mod password;
pub mod verifier;
