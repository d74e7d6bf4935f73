//! The fallback for requests that match no route.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::MessageResponse;

/// Respond with a JSON 404 for any unknown path.
pub async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("API endpoint not found")),
    )
        .into_response()
}
