//! Per-category budget goals.

mod db;
mod domain;
mod handlers;

pub use db::{create_budget_goal_table, get_budget_goals};
pub use domain::CategoryBudgetGoal;
pub use handlers::{
    delete_budget_goal_endpoint, get_budget_goals_endpoint, set_budget_goals_endpoint,
};
