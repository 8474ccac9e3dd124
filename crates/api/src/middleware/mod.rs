//! Authentication middleware and extractors.
//!
//! - [`auth::AuthGate`] -- the per-request authorization state machine.
//! - [`auth::require_auth`] -- route layer that runs the gate.
//! - [`auth::AuthorizedIdentity`] -- extractor for the authenticated caller.

pub mod auth;
