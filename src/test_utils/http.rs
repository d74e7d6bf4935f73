use axum_test::{TestResponse, TestServer};

use crate::{AppState, routing::build_router};

/// A test server for the full router along with the state behind it.
pub(crate) fn get_test_server(state: &AppState) -> TestServer {
    TestServer::new(build_router(state.clone())).expect("Could not create test server")
}

#[track_caller]
pub(crate) fn assert_json_message(response: &TestResponse, message: &str) {
    let body = response.json::<serde_json::Value>();

    assert_eq!(
        body["message"], message,
        "want message {message:?}, got body {body}"
    );
}
