//! Shared configuration and resources handed to every route handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Key, SameSite};
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, PasswordHash, auth::DEFAULT_COOKIE_DURATION, db::initialize,
    pagination::PaginationConfig,
};

/// Everything the API needs to serve a request.
///
/// Handlers usually ask for a narrower sub-state (see the `FromRef` impls in the auth module)
/// rather than the whole struct.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts and authenticates the session cookie.
    pub cookie_key: Key,
    /// Session length after the most recent request.
    pub cookie_duration: Duration,
    /// `SameSite` attribute of the session cookie.
    ///
    /// [SameSite::Strict] when the dashboard is served from the same site as the API. Set it to
    /// [SameSite::None] for a dashboard hosted elsewhere, otherwise the browser never sends the
    /// cookie back. The cookie is always `Secure`, which browsers require for `None`.
    pub cookie_same_site: SameSite,
    /// bcrypt cost for new password hashes.
    pub password_hash_cost: u32,
    /// Canonical timezone name used to bucket dates, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Page size limits for transaction lists.
    pub pagination_config: PaginationConfig,
    /// The SQLite database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Open the app over `db_connection`, creating any missing tables first.
    ///
    /// The cookie key is derived from `cookie_secret`, so restarting with the same secret keeps
    /// existing sessions valid.
    ///
    /// # Errors
    /// Returns an error if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: derive_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            cookie_same_site: SameSite::Strict,
            password_hash_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// `Key` needs 64 bytes, so stretch secrets of any length with SHA-512.
fn derive_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
