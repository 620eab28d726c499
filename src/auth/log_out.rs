//! Log-out route handler that invalidates the auth cookie.

use axum::{extract::State, http::StatusCode};
use axum_extra::extract::PrivateCookieJar;

use crate::auth::{invalidate_auth_cookie, middleware::AuthState};

/// Invalidate the auth cookie.
pub async fn post_log_out(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, StatusCode) {
    (
        invalidate_auth_cookie(jar, state.cookie_same_site),
        StatusCode::NO_CONTENT,
    )
}
