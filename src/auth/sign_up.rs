//! The endpoint for registering a new user with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        JwtKeys, PasswordHash, ValidatedPassword,
        token::encode_token,
        user::{NewUser, create_user},
    },
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct SignUpState {
    /// The keys for signing the new user's first token.
    pub jwt_keys: JwtKeys,
    /// The duration for which issued tokens are valid.
    pub token_duration: Duration,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body of a sign-up request.
#[derive(Debug, Deserialize)]
pub struct SignUpData {
    /// The user's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// The email address to log in with.
    #[serde(default)]
    pub email: Option<String>,
    /// The raw password, hashed before storage.
    #[serde(default)]
    pub password: Option<String>,
}

/// The response to a successful sign-up.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    /// A human readable confirmation.
    pub message: String,
    /// A bearer token for the new user.
    pub token: String,
}

/// Handler for registering a new user.
///
/// On success the user is logged in straight away and the response carries
/// their first bearer token.
///
/// # Errors
///
/// This function will return an error if:
/// - a field is missing or the email address is invalid,
/// - the password is too weak,
/// - the email address is already registered,
/// - or an internal error occurred while hashing the password or writing the user.
pub async fn sign_up(
    State(state): State<SignUpState>,
    payload: Result<Json<SignUpData>, JsonRejection>,
) -> Result<(StatusCode, Json<SignUpResponse>), Error> {
    let Json(data) = payload?;

    let name = required(data.name, "name")?;
    let email = required(data.email, "email")?;
    let password = data
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingField("password"))?;

    if !EmailAddress::is_valid(&email) {
        return Err(Error::InvalidEmail(email));
    }

    let validated_password = ValidatedPassword::new(&password, &[&name, &email])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(
            NewUser {
                name,
                email,
                password_hash: Some(password_hash),
                google_id: None,
            },
            &connection,
        )?
    };

    tracing::info!("Registered user {}", user.id);
    let token = encode_token(user.id, state.token_duration, &state.jwt_keys)?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "User registered successfully!".to_owned(),
            token,
        }),
    ))
}

/// Trim `value` and reject it if it is absent or empty.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, Error> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingField(field))
}
