//! Endpoints for creating, listing and deleting reminders.

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
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryName,
    database_id::ReminderId,
    reminder::core::{
        DEFAULT_REMINDER_CATEGORY, NewReminder, Reminder, create_reminder, delete_reminder,
        get_reminders,
    },
    response::DeletedResponse,
};

/// The state needed for the reminder endpoints.
#[derive(Debug, Clone)]
pub struct ReminderState {
    /// The database connection for managing reminders.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReminderState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a reminder.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReminderData {
    /// What the payment is for.
    pub title: Option<String>,
    /// The expected amount of the payment.
    pub amount: Option<f64>,
    /// The category, "Others" if absent or blank.
    pub category: Option<String>,
    /// The day the payment is due, as `YYYY-MM-DD`.
    pub date: Option<Date>,
    /// Whether the payment repeats, false if absent.
    pub is_recurring: Option<bool>,
}

impl ReminderData {
    fn into_new_reminder(self) -> Result<NewReminder, Error> {
        let category = self
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REMINDER_CATEGORY.to_owned());

        Ok(NewReminder {
            title: self.title.ok_or(Error::MissingField("title"))?,
            amount: self.amount.ok_or(Error::MissingField("amount"))?,
            category: CategoryName::new(&category)?,
            date: self.date.ok_or(Error::MissingField("date"))?,
            is_recurring: self.is_recurring.unwrap_or(false),
        })
    }
}

/// Handle creating a reminder for the logged in user.
pub async fn create_reminder_endpoint(
    State(state): State<ReminderState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<ReminderData>, JsonRejection>,
) -> Result<(StatusCode, Json<Reminder>), Error> {
    let Json(data) = payload?;
    let new_reminder = data.into_new_reminder()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let reminder = create_reminder(user_id, new_reminder, &connection)?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Handle listing the logged in user's reminders, soonest first.
pub async fn get_reminders_endpoint(
    State(state): State<ReminderState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Reminder>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_reminders(user_id, &connection).map(Json)
}

/// Handle deleting one of the logged in user's reminders.
pub async fn delete_reminder_endpoint(
    State(state): State<ReminderState>,
    Extension(user_id): Extension<UserID>,
    reminder_id: Result<Path<ReminderId>, PathRejection>,
) -> Result<Json<DeletedResponse>, Error> {
    let Path(reminder_id) = reminder_id?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_reminder(user_id, reminder_id, &connection)?;

    Ok(Json(DeletedResponse {
        message: "Reminder deleted".to_owned(),
        deleted_id: reminder_id,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        reminder::core::Reminder,
        response::DeletedResponse,
        test_utils::{
            assert_json_message, create_test_user, get_test_app_state, get_test_server,
        },
    };

    #[tokio::test]
    async fn create_reminder_with_defaults() {
        let state = get_test_app_state();
        let user = create_test_user(&state, "alice@example.com");
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::CREATE_REMINDER)
            .authorization_bearer(&user.token)
            .json(&json!({"title": "Rent", "amount": 1500, "date": "2025-12-01"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["category"], "Others");
        assert_eq!(body["isRecurring"], false);
        assert_eq!(body["date"], "2025-12-01");
    }

    #[tokio::test]
    async fn list_reminders_soonest_first() {
        let state = get_test_app_state();
        let user = create_test_user(&state, "alice@example.com");
        let server = get_test_server(&state);
        for (title, date) in [("Rent", "2025-12-01"), ("Phone", "2025-11-15")] {
            server
                .post(endpoints::CREATE_REMINDER)
                .authorization_bearer(&user.token)
                .json(&json!({
                    "title": title,
                    "amount": 50,
                    "category": "Bills",
                    "date": date,
                    "isRecurring": true,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let reminders = server
            .get(endpoints::REMINDERS)
            .authorization_bearer(&user.token)
            .await
            .json::<Vec<Reminder>>();

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].title, "Phone");
        assert_eq!(reminders[0].date, date!(2025 - 11 - 15));
        assert!(reminders[0].is_recurring);
    }

    #[tokio::test]
    async fn missing_date_is_rejected() {
        let state = get_test_app_state();
        let user = create_test_user(&state, "alice@example.com");
        let server = get_test_server(&state);

        server
            .post(endpoints::CREATE_REMINDER)
            .authorization_bearer(&user.token)
            .json(&json!({"title": "Rent", "amount": 1500}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn delete_reminder_reports_deleted_id() {
        let state = get_test_app_state();
        let user = create_test_user(&state, "alice@example.com");
        let server = get_test_server(&state);
        let reminder = server
            .post(endpoints::CREATE_REMINDER)
            .authorization_bearer(&user.token)
            .json(&json!({"title": "Rent", "amount": 1500, "date": "2025-12-01"}))
            .await
            .json::<Reminder>();

        let response = server
            .delete(&format_endpoint(endpoints::REMINDER, reminder.id))
            .authorization_bearer(&user.token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<DeletedResponse>().deleted_id, reminder.id);
    }

    #[tokio::test]
    async fn non_numeric_id_gets_json_error() {
        let state = get_test_app_state();
        let user = create_test_user(&state, "alice@example.com");
        let server = get_test_server(&state);

        let response = server
            .delete(&format_endpoint(endpoints::REMINDER, "next-week"))
            .authorization_bearer(&user.token)
            .await;

        response.assert_status_bad_request();
        assert_json_message(&response, "Invalid request");
    }

    #[tokio::test]
    async fn cannot_delete_other_users_reminder() {
        let state = get_test_app_state();
        let alice = create_test_user(&state, "alice@example.com");
        let bob = create_test_user(&state, "bob@example.com");
        let server = get_test_server(&state);
        let reminder = server
            .post(endpoints::CREATE_REMINDER)
            .authorization_bearer(&alice.token)
            .json(&json!({"title": "Rent", "amount": 1500, "date": "2025-12-01"}))
            .await
            .json::<Reminder>();

        let response = server
            .delete(&format_endpoint(endpoints::REMINDER, reminder.id))
            .authorization_bearer(&bob.token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_json_message(&response, "Reminder not found");
    }
}
