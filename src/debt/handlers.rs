//! Endpoints for recording, listing and deleting debts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::DebtId,
    debt::core::{Debt, NewDebt, create_debt, delete_debt, get_debts},
    response::MessageResponse,
};

/// The state needed for the debt endpoints.
#[derive(Debug, Clone)]
pub struct DebtState {
    /// The database connection for managing debts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DebtState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for recording a debt.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DebtData {
    /// Who or what the debt is owed to.
    pub name: Option<String>,
    /// The outstanding amount.
    pub amount: Option<f64>,
    /// Optional details about the debt.
    pub description: Option<String>,
}

/// Handle recording a new debt for the logged in user.
pub async fn create_debt_endpoint(
    State(state): State<DebtState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<DebtData>, JsonRejection>,
) -> Result<(StatusCode, Json<Debt>), Error> {
    let Json(data) = payload?;
    let new_debt = NewDebt {
        name: data.name.ok_or(Error::MissingField("name"))?,
        amount: data.amount.ok_or(Error::MissingField("amount"))?,
        description: data
            .description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty()),
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let debt = create_debt(user_id, new_debt, &connection)?;

    Ok((StatusCode::CREATED, Json(debt)))
}

/// Handle listing the logged in user's debts.
pub async fn get_debts_endpoint(
    State(state): State<DebtState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Debt>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_debts(user_id, &connection).map(Json)
}

/// Handle deleting one of the logged in user's debts.
pub async fn delete_debt_endpoint(
    State(state): State<DebtState>,
    Extension(user_id): Extension<UserID>,
    debt_id: Result<Path<DebtId>, PathRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Path(debt_id) = debt_id?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_debt(user_id, debt_id, &connection)?;

    Ok(Json(MessageResponse::new("Debt deleted successfully")))
}
