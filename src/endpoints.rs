//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/debt/{debt_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route, reports that the API is running.
pub const ROOT: &str = "/";
/// Liveness check for load balancers and uptime monitors.
pub const HEALTH: &str = "/api/health";

/// The route for registering a new user.
pub const SIGN_UP: &str = "/api/auth/signup";
/// The route for logging in with an email and password.
pub const LOG_IN: &str = "/api/auth/login";
/// The route that starts the Google log in flow.
pub const GOOGLE_LOG_IN: &str = "/api/auth/google";
/// The route Google redirects back to after the user grants consent.
pub const GOOGLE_CALLBACK: &str = "/api/auth/google/callback";

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the signed total of each transaction category.
pub const TRANSACTION_SUMMARY: &str = "/api/transactions/summary";

/// The route to set and list category budget goals.
pub const CATEGORY_BUDGET: &str = "/api/category-budget";
/// Alternate route for listing category budget goals.
pub const BUDGET: &str = "/api/budget";
/// Alternate route for setting category budget goals.
pub const SET_BUDGET: &str = "/api/budget/set";
/// The route to delete the budget goal of a category.
pub const BUDGET_CATEGORY: &str = "/api/budget/{category}";

/// The route to create and list debts.
pub const DEBTS: &str = "/api/debt";
/// The route to access a single debt.
pub const DEBT: &str = "/api/debt/{debt_id}";

/// The route to list reminders.
pub const REMINDERS: &str = "/api/reminder";
/// The route to create a reminder.
pub const CREATE_REMINDER: &str = "/api/reminder/create";
/// The route to access a single reminder.
pub const REMINDER: &str = "/api/reminder/{reminder_id}";

/// The route for the dashboard summary figures.
pub const SUMMARY: &str = "/api/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/debt/{debt_id}', '{debt_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
