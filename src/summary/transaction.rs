//! Database queries for retrieving the transaction data the summary needs.
//!
//! The summary only needs each transaction's category and amount, so it reads
//! a slimmer view than the full transaction model.

use rusqlite::Connection;

use crate::{Error, auth::UserID, category::CategoryName};

/// A transaction reduced to the fields used for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedAmount {
    /// The transaction's category.
    pub category: CategoryName,
    /// The signed amount, positive for income and negative for expenses.
    pub amount: f64,
}

/// Get the category and amount of every transaction belonging to `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query preparation or execution fails.
pub fn get_categorized_amounts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CategorizedAmount>, Error> {
    connection
        .prepare("SELECT category, amount FROM \"transaction\" WHERE user_id = :user_id")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            let category: String = row.get(0)?;

            Ok(CategorizedAmount {
                category: CategoryName::new_unchecked(&category),
                amount: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<CategorizedAmount>, rusqlite::Error>>()
        .map_err(|error| error.into())
}
