//! Defines the endpoint for deleting a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::UserID, database_id::TransactionId, response::DeletedResponse,
    transaction::core::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the logged in user's transactions.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the transaction does not
/// exist or belongs to another user.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<DeletedResponse>, Error> {
    let Path(transaction_id) = transaction_id?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_transaction(user_id, transaction_id, &connection)? {
        0 => Err(Error::DeleteMissingTransaction),
        _ => {
            tracing::debug!("User {user_id} deleted transaction {transaction_id}");
            Ok(Json(DeletedResponse {
                message: "Transaction deleted".to_owned(),
                deleted_id: transaction_id,
            }))
        }
    }
}
