//! Request handlers.
//!
//! [`auth`] covers account lifecycle (sign-up, sign-in, logout); [`user`]
//! covers profile reads and writes for the authenticated caller. Handlers
//! delegate to the stores held in [`AppState`](crate::state::AppState) and map
//! errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod user;

use validator::ValidationError;

/// Phone numbers may contain digits plus `+`, `-`, spaces and parentheses.
pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')');
    if phone.chars().all(allowed) && phone.chars().any(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Invalid phone number".into());
        Err(err)
    }
}
