//! Handles log-in requests with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{JwtKeys, sign_up::required, token::encode_token, user::get_user_by_email},
};

/// The state needed to process a log-in request.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The keys for signing issued tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body of a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email address the user registered with.
    #[serde(default)]
    pub email: Option<String>,
    /// The user's raw password.
    #[serde(default)]
    pub password: Option<String>,
}

/// The response to a successful log-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInResponse {
    /// A bearer token for the user.
    pub token: String,
}

/// Handler for log-in requests.
///
/// Unknown emails and wrong passwords get the same response so that callers
/// cannot discover which emails are registered.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing.
/// - The credentials do not match a registered user.
/// - The account was created through Google and has no password.
/// - An internal error occurred when verifying the password.
pub async fn log_in(
    State(state): State<LoginState>,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<Json<LogInResponse>, Error> {
    let Json(data) = payload?;
    let email = required(data.email, "email")?;
    let password = data
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingField("password"))?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_user_by_email(&email, &connection)?
    };

    let user = user.ok_or(Error::InvalidCredentials)?;
    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(Error::FederatedAccountOnly)?;

    let is_password_valid = password_hash.verify(&password).map_err(|error| {
        tracing::error!("Unhandled error while verifying credentials: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(user.id, state.token_duration, &state.jwt_keys)?;

    Ok(Json(LogInResponse { token }))
}

#[cfg(test)]
mod log_in_tests {
    use axum::{Router, extract::FromRef, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        auth::{
            PasswordHash, ValidatedPassword,
            log_in::{LogInResponse, LoginState, log_in},
            token::decode_token,
            user::{NewUser, create_user},
        },
        test_utils::get_test_app_state,
    };

    const TEST_PASSWORD: &str = "correct-horse-battery-staple-42";

    fn get_test_server() -> (TestServer, LoginState) {
        let state = LoginState::from_ref(&get_test_app_state());

        {
            let connection = state.db_connection.lock().unwrap();
            let password = ValidatedPassword::new(TEST_PASSWORD, &[]).unwrap();
            create_user(
                NewUser {
                    name: "Jane".to_owned(),
                    email: "jane@example.com".to_owned(),
                    password_hash: Some(PasswordHash::new(password, 4).unwrap()),
                    google_id: None,
                },
                &connection,
            )
            .unwrap();
            create_user(
                NewUser {
                    name: "Gus".to_owned(),
                    email: "gus@example.com".to_owned(),
                    password_hash: None,
                    google_id: Some("google-gus".to_owned()),
                },
                &connection,
            )
            .unwrap();
        }

        let app = Router::new()
            .route("/login", post(log_in))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (server, state) = get_test_server();

        let response = server
            .post("/login")
            .json(&json!({"email": "jane@example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let token = response.json::<LogInResponse>().token;
        assert!(decode_token(&token, &state.jwt_keys).is_ok());
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let (server, _) = get_test_server();

        let response = server
            .post("/login")
            .json(&json!({"email": "jane@example.com", "password": "wrongpassword"}))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "Invalid Credentials"
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let (server, _) = get_test_server();

        let response = server
            .post("/login")
            .json(&json!({"email": "nobody@example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "Invalid Credentials"
        );
    }

    #[tokio::test]
    async fn log_in_fails_for_google_only_account() {
        let (server, _) = get_test_server();

        let response = server
            .post("/login")
            .json(&json!({"email": "gus@example.com", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "Please login with Google"
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_password() {
        let (server, _) = get_test_server();

        server
            .post("/login")
            .json(&json!({"email": "jane@example.com"}))
            .await
            .assert_status_bad_request();
    }
}
