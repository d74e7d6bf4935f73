use rusqlite::Connection;

use crate::{
    AppState,
    auth::{NewUser, PasswordHash, UserID, create_user, encode_token},
};

pub(crate) const TEST_FRONTEND_URL: &str = "http://localhost:5173";

const TEST_JWT_SECRET: &str = "a-secret-only-used-in-tests";

/// An application state backed by a fresh in-memory database.
pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(connection, TEST_JWT_SECRET, TEST_FRONTEND_URL, None)
        .expect("Could not create app state")
}

pub(crate) struct TestUser {
    pub id: UserID,
    pub token: String,
}

/// Insert a user with `email` and issue them a bearer token.
#[track_caller]
pub(crate) fn create_test_user(state: &AppState, email: &str) -> TestUser {
    let user = create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: Some(PasswordHash::new_unchecked("not-a-real-hash")),
            google_id: None,
        },
        &state.db_connection.lock().unwrap(),
    )
    .expect("Could not create test user");

    let token = encode_token(user.id, state.token_duration, &state.jwt_keys)
        .expect("Could not create token");

    TestUser { id: user.id, token }
}
