//! JSON bodies shared by several endpoints.

use serde::{Deserialize, Serialize};

use crate::database_id::DatabaseId;

/// A body holding only a human readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// A human readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Create a response carrying `message`.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// The response to a successful delete by ID.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    /// A human readable confirmation.
    pub message: String,
    /// The ID of the deleted record.
    pub deleted_id: DatabaseId,
}
