//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryName,
    transaction::{
        Transaction, TransactionType,
        core::{TransactionBuilder, create_transaction},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a transaction.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionData {
    /// A short description of what the transaction was for.
    pub title: Option<String>,
    /// The signed amount, positive for income and negative for expenses.
    pub amount: Option<f64>,
    /// The category the transaction counts towards.
    pub category: Option<String>,
    /// An optional free-form note.
    pub note: Option<String>,
    /// Optional labels, duplicates are dropped.
    pub tags: Option<Vec<String>>,
    /// When the transaction happened, defaults to now.
    #[serde(with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    /// An explicit classification, which must agree with the sign of `amount`.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
}

impl TransactionData {
    fn into_builder(self) -> Result<TransactionBuilder, Error> {
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or(Error::MissingField("title"))?;
        let amount = self.amount.ok_or(Error::MissingField("amount"))?;
        let category = self.category.ok_or(Error::MissingField("category"))?;
        let category = CategoryName::new(&category)?;

        if let Some(transaction_type) = self.transaction_type {
            if amount != 0.0 && transaction_type != TransactionType::from_amount(amount) {
                return Err(Error::MismatchedTransactionType(
                    transaction_type.to_string(),
                ));
            }
        }

        let note = self
            .note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty());

        let builder = Transaction::build(&title, amount, category)
            .note(note)
            .tags(self.tags.unwrap_or_default());

        Ok(match self.date {
            Some(date) => builder.date(date),
            None => builder,
        })
    }
}

/// A route handler for creating a new transaction for the logged in user.
///
/// Responds with 201 and the created transaction.
///
/// # Errors
///
/// Returns a validation error if a required field is missing, the amount is
/// zero, or the explicit type disagrees with the amount.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<TransactionData>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(data) = payload?;
    let builder = data.into_builder()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        auth::{NewUser, PasswordHash, UserID, create_user},
        db::initialize,
        transaction::{
            Transaction, TransactionType,
            core::{count_transactions, get_transactions},
            create_transaction_endpoint::{CreateTransactionState, create_transaction_endpoint},
        },
    };

    fn get_test_server() -> (TestServer, CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_user(
            NewUser {
                name: "Test".to_owned(),
                email: "test@example.com".to_owned(),
                password_hash: Some(PasswordHash::new_unchecked("hash")),
                google_id: None,
            },
            &conn,
        )
        .unwrap()
        .id;

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let app = Router::new()
            .route("/transactions", post(create_transaction_endpoint))
            .layer(Extension(user_id))
            .with_state(state.clone());

        (TestServer::new(app).unwrap(), state, user_id)
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (server, state, user_id) = get_test_server();

        let response = server
            .post("/transactions")
            .json(&json!({
                "title": "Groceries",
                "amount": -42.5,
                "category": "Food",
                "tags": ["weekly", "weekly", "home"],
                "date": "2025-03-01T10:00:00Z",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created = response.json::<Transaction>();
        assert_eq!(created.amount, -42.5);
        assert_eq!(created.transaction_type, TransactionType::Expense);
        assert_eq!(created.date, datetime!(2025-03-01 10:00 UTC));
        assert_eq!(created.tags.len(), 2);

        let stored = get_transactions(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(stored, vec![created]);
    }

    #[tokio::test]
    async fn type_is_derived_from_amount() {
        let (server, _, _) = get_test_server();

        let response = server
            .post("/transactions")
            .json(&json!({"title": "Salary", "amount": 5000, "category": "Salary"}))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(response.json::<serde_json::Value>()["type"], "income");
    }

    #[tokio::test]
    async fn matching_explicit_type_is_accepted() {
        let (server, _, _) = get_test_server();

        server
            .post("/transactions")
            .json(&json!({
                "title": "Rent",
                "amount": -1200,
                "category": "Housing",
                "type": "expense",
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn contradicting_explicit_type_is_rejected() {
        let (server, state, _) = get_test_server();

        server
            .post("/transactions")
            .json(&json!({
                "title": "Rent",
                "amount": 1200,
                "category": "Housing",
                "type": "expense",
            }))
            .await
            .assert_status_bad_request();

        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let (server, _, _) = get_test_server();

        for body in [
            json!({"amount": 10, "category": "Food"}),
            json!({"title": "Lunch", "category": "Food"}),
            json!({"title": "Lunch", "amount": 10}),
            json!({"title": "Lunch", "amount": 10, "category": "  "}),
        ] {
            server
                .post("/transactions")
                .json(&body)
                .await
                .assert_status_bad_request();
        }
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let (server, _, _) = get_test_server();

        server
            .post("/transactions")
            .json(&json!({"title": "Nothing", "amount": 0, "category": "Food"}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn amount_above_maximum_is_rejected() {
        let (server, state, _) = get_test_server();

        for amount in [1e17, -1e17] {
            server
                .post("/transactions")
                .json(&json!({"title": "Windfall", "amount": amount, "category": "Luck"}))
                .await
                .assert_status_bad_request();
        }

        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn non_numeric_amount_is_rejected() {
        let (server, _, _) = get_test_server();

        server
            .post("/transactions")
            .json(&json!({"title": "Lunch", "amount": "ten", "category": "Food"}))
            .await
            .assert_status_bad_request();
    }
}
