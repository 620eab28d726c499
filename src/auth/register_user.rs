//! Defines the route handler for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{Account, PasswordHash, ValidatedPassword, create_user},
    db::acquire_lock,
    extract::AppJson,
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used to hash new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The details sent by the client to create an account.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email to log in with.
    pub email: String,
    /// The password to log in with.
    pub password: String,
    /// The name to greet the user with.
    pub name: String,
}

/// Check the registration details, returning the validated password on success.
///
/// # Errors
///
/// Returns a [Error::ValidationError] describing the first problem found:
/// - the name or email is empty after trimming whitespace,
/// - the email does not contain an '@',
/// - the password is too short.
pub fn validate_registration(form: &RegisterForm) -> Result<ValidatedPassword, Error> {
    if form.name.trim().is_empty() {
        return Err(Error::ValidationError("Name is required".to_owned()));
    }

    let email = form.email.trim();

    if email.is_empty() {
        return Err(Error::ValidationError("Email is required".to_owned()));
    }

    if !email.contains('@') {
        return Err(Error::ValidationError(
            "Please enter a valid email address".to_owned(),
        ));
    }

    ValidatedPassword::new(&form.password)
}

/// A route handler for registering a new user.
///
/// Returns the new account with the status code 201 Created. The user still
/// needs to log in afterwards.
///
/// # Errors
///
/// Returns a [Error::ValidationError] if the details are invalid, or a
/// [Error::DuplicateEmail] if the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    AppJson(user_data): AppJson<RegisterForm>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let validated_password = validate_registration(&user_data)?;

    let password_hash = PasswordHash::new(validated_password, state.password_hash_cost)
        .inspect_err(|error| {
            tracing::error!("an error occurred while hashing a password: {error}")
        })?;

    let connection = acquire_lock(&state.db_connection)?;
    let user = create_user(
        &user_data.email,
        &user_data.name,
        password_hash,
        &connection,
    )?;

    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user.account())))
}
