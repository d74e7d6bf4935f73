//! ExpenSync is a web service for tracking personal finances.
//!
//! Users record income and expense transactions, set per-category budget
//! goals, keep track of debts and upcoming payment reminders, and get a
//! dashboard summary of their finances.
//!
//! This library provides a JSON REST API authenticated with bearer tokens.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod budget;
mod category;
mod database_id;
mod db;
mod debt;
mod endpoints;
mod logging;
mod not_found;
mod reminder;
mod response;
mod routing;
mod summary;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, DEFAULT_TOKEN_DURATION};
pub use auth::{GoogleOAuth, OAuthConfig, PasswordHash, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or empty in the request body.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The request body could not be parsed as the expected JSON document.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// A path parameter, such as a record ID, could not be parsed.
    #[error("invalid path parameter: {0}")]
    InvalidPathParameter(String),

    /// A monetary amount was not a finite number, or was zero where a
    /// non-zero amount is needed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A budget goal was negative, not a finite number, or too large.
    #[error("goal must be a non-negative number up to {max}, got {0}", max = amount::MAX_AMOUNT)]
    InvalidGoal(f64),

    /// An empty string was used as a category name.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// The explicit transaction type disagreed with the sign of the amount.
    #[error("transaction type \"{0}\" does not match the sign of the amount")]
    MismatchedTransactionType(String),

    /// The category goals payload was not a list of category-goal pairs.
    #[error("invalid data format")]
    InvalidGoalFormat,

    /// The email address is not syntactically valid.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The user provided an unknown email or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account was created through Google and has no password.
    #[error("the account has no password, log in with Google instead")]
    FederatedAccountOnly,

    /// The email address is already registered to another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The request did not include a bearer token.
    #[error("no bearer token in the request")]
    MissingToken,

    /// The bearer token is malformed, was not signed by this server, or has expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// An error occurred while signing a new token.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The Google OAuth client has not been configured on this server.
    #[error("Google log in is not configured")]
    FederatedLoginDisabled,

    /// The OAuth handshake with Google failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a transaction that does not exist or belongs to another user.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a debt that does not exist or belongs to another user.
    #[error("tried to delete a debt that is not in the database")]
    DeleteMissingDebt,

    /// Tried to delete a reminder that does not exist or belongs to another user.
    #[error("tried to delete a reminder that is not in the database")]
    DeleteMissingReminder,

    /// Tried to delete a budget goal for a category that has no goal.
    #[error("tried to delete a budget goal that is not in the database")]
    DeleteMissingBudgetGoal,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidPathParameter(rejection.body_text())
    }
}

/// The JSON body sent to clients when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn error_response(status: StatusCode, message: &str, detail: Option<String>) -> Response {
    let body = ErrorBody {
        message: message.to_owned(),
        detail,
    };

    (status, Json(body)).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MissingField(_)
            | Error::InvalidJson(_)
            | Error::InvalidPathParameter(_)
            | Error::InvalidAmount(_)
            | Error::InvalidGoal(_)
            | Error::EmptyCategory
            | Error::MismatchedTransactionType(_)
            | Error::InvalidEmail(_)
            | Error::TooWeak(_) => error_response(
                StatusCode::BAD_REQUEST,
                "Invalid request",
                Some(self.to_string()),
            ),
            Error::InvalidGoalFormat => {
                error_response(StatusCode::BAD_REQUEST, "Invalid data format", None)
            }
            Error::InvalidCredentials => {
                error_response(StatusCode::BAD_REQUEST, "Invalid Credentials", None)
            }
            Error::FederatedAccountOnly => {
                error_response(StatusCode::BAD_REQUEST, "Please login with Google", None)
            }
            Error::DuplicateEmail => {
                error_response(StatusCode::BAD_REQUEST, "User already exists", None)
            }
            Error::MissingToken => error_response(
                StatusCode::UNAUTHORIZED,
                "No token provided. Authorization denied.",
                None,
            ),
            Error::InvalidToken => {
                error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token.", None)
            }
            Error::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Resource not found", None)
            }
            Error::DeleteMissingTransaction => {
                error_response(StatusCode::NOT_FOUND, "Transaction not found", None)
            }
            Error::DeleteMissingDebt => {
                error_response(StatusCode::NOT_FOUND, "Debt not found", None)
            }
            Error::DeleteMissingReminder => {
                error_response(StatusCode::NOT_FOUND, "Reminder not found", None)
            }
            Error::DeleteMissingBudgetGoal => {
                error_response(StatusCode::NOT_FOUND, "Budget goal not found", None)
            }
            Error::FederatedLoginDisabled => error_response(
                StatusCode::NOT_FOUND,
                "Google log in is not available",
                None,
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong!",
                    None,
                )
            }
        }
    }
}
