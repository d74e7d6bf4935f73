//! HTTP handler for the dashboard summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::get_budget_goals,
    summary::{Summary, get_categorized_amounts, summarize},
};

/// The state needed for the summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions and goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handler for the dashboard summary of the logged in user.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Summary>, Error> {
    let (transactions, goals) = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        (
            get_categorized_amounts(user_id, &connection)?,
            get_budget_goals(user_id, &connection)?,
        )
    };

    Ok(Json(summarize(&transactions, &goals)))
}
