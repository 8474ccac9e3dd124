pub mod health;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /user/signup                                     register (public)
/// /user/login                                      sign in (public)
/// /user/logout                                     revoke current token
/// /user/{id}                                       get, update, delete own profile
/// ```
///
/// Everything except sign-up and sign-in passes through
/// [`require_auth`](crate::middleware::auth::require_auth).
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new().nest("/user", user::router(state))
}
