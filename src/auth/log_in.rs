//! This file defines the route for handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Key, SameSite},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{Account, get_user_by_email, set_auth_cookie},
    db::acquire_lock,
    extract::AppJson,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The `SameSite` attribute of the auth cookie.
    pub cookie_same_site: SameSite,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            cookie_same_site: state.cookie_same_site,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
    /// Whether to extend the initial auth cookie duration to one week.
    #[serde(default, alias = "rememberMe")]
    pub remember_me: bool,
}

/// Handler for log-in requests.
///
/// On a successful log-in request, the auth cookie is set and the user's account is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email is not registered or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    AppJson(user_data): AppJson<LogInData>,
) -> Result<(PrivateCookieJar, Json<Account>), Error> {
    let user = {
        let connection = acquire_lock(&state.db_connection)?;

        match get_user_by_email(&user_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return Err(error);
            }
        }
    };

    if !user.password_hash.verify(&user_data.password)? {
        tracing::debug!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration, state.cookie_same_site)
        .inspect_err(|error| tracing::error!("Error setting auth cookie: {error}"))?;

    Ok((jar, Json(user.account())))
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::COOKIE_TOKEN,
        endpoints,
        test_utils::{TEST_EMAIL, TEST_NAME, TEST_PASSWORD, get_test_server, get_test_state},
    };

    async fn register(server: &axum_test::TestServer) {
        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": TEST_EMAIL,
                "password": TEST_PASSWORD,
                "name": TEST_NAME,
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server(get_test_state());
        register(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], TEST_EMAIL);
        assert_eq!(body["name"], TEST_NAME);
        assert!(body.get("password").is_none());
        let _ = response.cookie(COOKIE_TOKEN);
    }

    #[tokio::test]
    async fn log_in_ignores_email_case() {
        let server = get_test_server(get_test_state());
        register(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": TEST_EMAIL.to_uppercase(),
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server(get_test_state());
        register(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL, "password": "wrongpassword" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid email or password" }));
        assert!(response.cookies().get(COOKIE_TOKEN).is_none());
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid email or password" }));
    }

    #[tokio::test]
    async fn remember_me_extends_cookie_to_one_week() {
        let server = get_test_server(get_test_state());
        register(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": TEST_EMAIL,
                "password": TEST_PASSWORD,
                "rememberMe": true,
            }))
            .await;

        response.assert_status_ok();
        let expiry = response
            .cookie(COOKIE_TOKEN)
            .expires_datetime()
            .unwrap();
        let want = OffsetDateTime::now_utc() + Duration::days(7);
        assert!(
            (expiry - want).abs() < Duration::seconds(5),
            "got expiry {expiry:?}, want {want:?}"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": TEST_EMAIL }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("missing field `password`")
        );
    }
}
