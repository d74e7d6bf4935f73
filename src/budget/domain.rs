//! Category budget goals and parsing of the goal list sent by clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error,
    amount::{MAX_AMOUNT, is_within_limit},
    category::CategoryName,
};

/// A user-defined spending ceiling for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudgetGoal {
    /// The category the goal applies to.
    pub category: CategoryName,
    /// The most the user wants to spend in the category.
    pub goal: f64,
}

impl CategoryBudgetGoal {
    /// Create a budget goal.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidGoal] if `goal` is negative, not a finite
    /// number or larger than [MAX_AMOUNT].
    pub fn new(category: CategoryName, goal: f64) -> Result<Self, Error> {
        if !is_within_limit(goal) || goal < 0.0 {
            return Err(Error::InvalidGoal(goal));
        }

        Ok(Self { category, goal })
    }
}

/// Parse and validate every category-goal pair in `category_goals`.
///
/// Goals may be numbers or numeric strings. Nothing is returned unless every
/// pair is valid.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidGoalFormat] if `category_goals` is not a list of objects,
/// - [Error::MissingField] if a pair has no category or no goal,
/// - [Error::EmptyCategory] if a category is blank,
/// - or [Error::InvalidGoal] if a goal is negative or too large.
pub fn parse_category_goals(
    category_goals: Option<&Value>,
) -> Result<Vec<CategoryBudgetGoal>, Error> {
    let items = category_goals
        .and_then(Value::as_array)
        .ok_or(Error::InvalidGoalFormat)?;

    items.iter().map(parse_category_goal).collect()
}

fn parse_category_goal(item: &Value) -> Result<CategoryBudgetGoal, Error> {
    let item = item.as_object().ok_or(Error::InvalidGoalFormat)?;

    let category = match item.get("category") {
        None | Some(Value::Null) => return Err(Error::MissingField("category")),
        Some(Value::String(category)) => CategoryName::new(category)?,
        Some(_) => return Err(Error::InvalidGoalFormat),
    };

    let goal = match item.get("goal") {
        None | Some(Value::Null) => return Err(Error::MissingField("goal")),
        Some(Value::Number(goal)) => goal.as_f64().ok_or(Error::InvalidGoalFormat)?,
        Some(Value::String(goal)) => goal
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidGoalFormat)?,
        Some(_) => return Err(Error::InvalidGoalFormat),
    };

    CategoryBudgetGoal::new(category, goal)
}
