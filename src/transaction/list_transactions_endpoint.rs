//! Defines the read-only endpoints for a user's transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    summary::{CategoryTotal, category_totals, get_categorized_amounts},
    transaction::{Transaction, core::get_transactions},
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the logged in user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(user_id, &connection).map(Json)
}

/// A route handler for the signed total of each of the logged in user's
/// transaction categories.
pub async fn get_category_totals_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_categorized_amounts(user_id, &connection)?
    };

    Ok(Json(category_totals(&transactions)))
}
