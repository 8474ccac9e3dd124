//! Shared response envelope types for API handlers.
//!
//! Resource reads use a `{ "data": ... }` envelope; state-changing account
//! actions add a human-readable `message`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": "..." }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `{ "message": "...", "data": T }` acknowledgement with a payload.
#[derive(Debug, Serialize)]
pub struct MessageDataResponse<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}
