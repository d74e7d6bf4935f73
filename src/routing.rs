//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState,
    auth::{auth_guard, get_google_log_in, google_callback, log_in, sign_up},
    budget::{delete_budget_goal_endpoint, get_budget_goals_endpoint, set_budget_goals_endpoint},
    debt::{create_debt_endpoint, delete_debt_endpoint, get_debts_endpoint},
    endpoints,
    not_found::get_404_not_found,
    reminder::{create_reminder_endpoint, delete_reminder_endpoint, get_reminders_endpoint},
    summary::get_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_category_totals_endpoint,
        get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::GOOGLE_LOG_IN, get(get_google_log_in))
        .route(endpoints::GOOGLE_CALLBACK, get(google_callback));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(get_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION_SUMMARY,
            get(get_category_totals_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::CATEGORY_BUDGET,
            post(set_budget_goals_endpoint).get(get_budget_goals_endpoint),
        )
        .route(endpoints::BUDGET, get(get_budget_goals_endpoint))
        .route(endpoints::SET_BUDGET, post(set_budget_goals_endpoint))
        .route(
            endpoints::BUDGET_CATEGORY,
            delete(delete_budget_goal_endpoint),
        )
        .route(
            endpoints::DEBTS,
            post(create_debt_endpoint).get(get_debts_endpoint),
        )
        .route(endpoints::DEBT, delete(delete_debt_endpoint))
        .route(endpoints::REMINDERS, get(get_reminders_endpoint))
        .route(endpoints::CREATE_REMINDER, post(create_reminder_endpoint))
        .route(endpoints::REMINDER, delete(delete_reminder_endpoint))
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        // `route_layer` so unmatched paths reach the fallback instead of the guard.
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
}

/// The root path '/' reports that the API is up.
async fn get_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ExpenSync API is running",
        status: "healthy",
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{assert_json_message, get_test_app_state, get_test_server},
    };

    #[tokio::test]
    async fn root_reports_healthy() {
        let server = get_test_server(&get_test_app_state());

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn health_check_includes_timestamp() {
        let server = get_test_server(&get_test_app_state());

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_path_gets_json_404() {
        let server = get_test_server(&get_test_app_state());

        let response = server.get("/api/does-not-exist").await;

        response.assert_status_not_found();
        assert_json_message(&response, "API endpoint not found");
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let server = get_test_server(&get_test_app_state());

        for path in [
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTION_SUMMARY,
            endpoints::CATEGORY_BUDGET,
            endpoints::BUDGET,
            endpoints::DEBTS,
            endpoints::REMINDERS,
            endpoints::SUMMARY,
        ] {
            let response = server.get(path).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_json_message(&response, "No token provided. Authorization denied.");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let server = get_test_server(&get_test_app_state());

        server
            .get(endpoints::SUMMARY)
            .authorization_bearer("not-a-jwt")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_up_log_in_and_use_token() {
        let server = get_test_server(&get_test_app_state());
        let password = "correct-horse-battery-staple-42";

        server
            .post(endpoints::SIGN_UP)
            .json(&json!({"name": "Jane", "email": "jane@example.com", "password": password}))
            .await
            .assert_status(StatusCode::CREATED);

        let token = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "jane@example.com", "password": password}))
            .await
            .json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"title": "Salary", "amount": 5000, "category": "Salary"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({"title": "Groceries", "amount": -300, "category": "Food"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::SET_BUDGET)
            .authorization_bearer(&token)
            .json(&json!({"categoryGoals": [{"category": "Food", "goal": 500}]}))
            .await
            .assert_status_ok();

        let summary = server
            .get(endpoints::SUMMARY)
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        assert_eq!(summary["totalIncome"], 5000.0);
        assert_eq!(summary["totalExpense"], 300.0);
        assert_eq!(summary["savings"], 4700.0);
        assert_eq!(summary["totalBudget"], 500.0);
        assert_eq!(summary["budgetProgress"][0]["category"], "Food");
        assert_eq!(summary["budgetProgress"][0]["overBudget"], false);
    }
}
