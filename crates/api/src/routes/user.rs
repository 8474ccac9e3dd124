//! Route definitions for the `/user` resource.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, user};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// POST   /signup  -> signup
/// POST   /login   -> login
/// POST   /logout  -> logout          (requires auth)
/// GET    /{id}    -> get_profile     (requires auth)
/// PUT    /{id}    -> update_profile  (requires auth)
/// DELETE /{id}    -> delete_profile  (requires auth)
/// ```
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route(
            "/{id}",
            get(user::get_profile)
                .put(user::update_profile)
                .delete(user::delete_profile),
        )
        .route_layer(from_fn_with_state(state, require_auth));

    public.merge(protected)
}
