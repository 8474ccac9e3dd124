//! Domain primitives shared by the keygate crates.
//!
//! - [`error`] -- the domain error taxonomy every store and service returns.
//! - [`types`] -- id and timestamp aliases used across crates.

pub mod error;
pub mod types;
