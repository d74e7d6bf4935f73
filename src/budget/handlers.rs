//! Endpoints for setting, listing and deleting category budget goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        CategoryBudgetGoal,
        db::{delete_budget_goal, get_budget_goals, upsert_budget_goals},
        domain::parse_category_goals,
    },
    category::CategoryName,
    response::MessageResponse,
};

/// The state needed for the budget goal endpoints.
#[derive(Debug, Clone)]
pub struct BudgetGoalState {
    /// The database connection for managing budget goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The list of goals sent to and returned by the budget endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGoals {
    /// One goal per category.
    pub category_goals: Vec<CategoryBudgetGoal>,
}

/// Handle setting a batch of category budget goals.
///
/// The whole batch is validated before anything is written, and is written
/// atomically.
pub async fn set_budget_goals_endpoint(
    State(state): State<BudgetGoalState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(body) = payload?;
    let goals = parse_category_goals(body.get("categoryGoals"))?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    upsert_budget_goals(user_id, &goals, &connection)?;
    tracing::debug!("User {user_id} set {} budget goals", goals.len());

    Ok(Json(MessageResponse::new("Budget goals saved")))
}

/// Handle listing the logged in user's budget goals.
pub async fn get_budget_goals_endpoint(
    State(state): State<BudgetGoalState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<CategoryGoals>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let category_goals = get_budget_goals(user_id, &connection)?;

    Ok(Json(CategoryGoals { category_goals }))
}

/// Handle deleting the goal of one category.
pub async fn delete_budget_goal_endpoint(
    State(state): State<BudgetGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(category): Path<String>,
) -> Result<Json<MessageResponse>, Error> {
    let category = CategoryName::new(&category).map_err(|_| Error::DeleteMissingBudgetGoal)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_budget_goal(user_id, &category, &connection)?;

    Ok(Json(MessageResponse::new("Budget goal deleted")))
}
