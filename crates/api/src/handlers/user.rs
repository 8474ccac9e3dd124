//! Handlers for the caller's own profile.

use axum::extract::{Path, State};
use axum::Json;
use keygate_core::error::CoreError;
use keygate_core::types::DbId;
use keygate_db::models::user::{UpdateUser, UserResponse};
use keygate_db::stores::USER_ENTITY;
use serde::Deserialize;
use validator::Validate;

use super::validate_phone;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthorizedIdentity;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Request body for `PUT /user/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, message = "First name must be at least 3 characters long"))]
    pub first_name: Option<String>,
    #[validate(length(min = 3, message = "Last name must be at least 3 characters long"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(
        length(min = 10, message = "Phone number must be at least 10 characters long"),
        custom(function = "validate_phone")
    )]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUser {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
        }
    }
}

/// Profile routes only act on the caller's own record.
fn ensure_self(identity: &AuthorizedIdentity, id: DbId) -> AppResult<()> {
    if identity.user_id != id {
        tracing::warn!(
            user_id = identity.user_id,
            target_id = id,
            "Rejected access to another user's profile"
        );
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot access another user's profile".into(),
        )));
    }
    Ok(())
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: USER_ENTITY,
        id,
    })
}

/// GET /api/v1/user/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    identity: AuthorizedIdentity,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    ensure_self(&identity, id)?;
    let user = state.users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/user/{id}
///
/// Partial update of profile fields. Changing the email to one already in
/// use is a 409.
pub async fn update_profile(
    State(state): State<AppState>,
    identity: AuthorizedIdentity,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    ensure_self(&identity, id)?;

    let update = UpdateUser::from(input);
    if update.is_empty() {
        return Err(AppError::BadRequest("No valid update data provided".into()));
    }

    let user = state
        .users
        .update(id, &update)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(user_id = id, "User profile updated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/user/{id}
///
/// Tokens already issued to the deleted user stop authorizing because the
/// gate can no longer resolve their subject.
pub async fn delete_profile(
    State(state): State<AppState>,
    identity: AuthorizedIdentity,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure_self(&identity, id)?;

    if !state.users.delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(user_id = id, "User deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
