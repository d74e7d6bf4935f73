//! Database operations for category budget goals.

use rusqlite::{Connection, Row};

use crate::{Error, auth::UserID, budget::CategoryBudgetGoal, category::CategoryName};

/// Initialize the budget goal table.
///
/// Each user has at most one goal per category.
pub fn create_budget_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category_budget_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            goal REAL NOT NULL CHECK (goal >= 0),
            UNIQUE(user_id, category),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

/// Insert or replace the goal of each category in `goals` for `user_id`.
///
/// The goals are written in one SQL transaction, so either every goal is
/// stored or none are. Applying the same goals again leaves the stored
/// state unchanged.
pub fn upsert_budget_goals(
    user_id: UserID,
    goals: &[CategoryBudgetGoal],
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    {
        let mut upsert = sql_transaction.prepare(
            "INSERT INTO category_budget_goal (user_id, category, goal) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, category) DO UPDATE SET goal = excluded.goal",
        )?;

        for goal in goals {
            upsert.execute((user_id.as_i64(), goal.category.as_ref(), goal.goal))?;
        }
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Retrieve the goals of `user_id` ordered alphabetically by category.
pub fn get_budget_goals(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategoryBudgetGoal>, Error> {
    connection
        .prepare(
            "SELECT category, goal FROM category_budget_goal
             WHERE user_id = :user_id ORDER BY category ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_goal| maybe_goal.map_err(|error| error.into()))
        .collect()
}

/// Delete the goal for `category`. Returns an error if the user has no goal
/// for that category.
pub fn delete_budget_goal(
    user_id: UserID,
    category: &CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category_budget_goal WHERE user_id = ?1 AND category = ?2",
        (user_id.as_i64(), category.as_ref()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudgetGoal);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<CategoryBudgetGoal, rusqlite::Error> {
    let raw_category: String = row.get(0)?;

    Ok(CategoryBudgetGoal {
        category: CategoryName::new_unchecked(&raw_category),
        goal: row.get(1)?,
    })
}
