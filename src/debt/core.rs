//! Defines the debt model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    amount::{MAX_AMOUNT, is_within_limit},
    auth::UserID,
    database_id::DebtId,
};

/// A named amount the user owes, tracked separately from transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    /// The ID of the debt.
    pub id: DebtId,
    /// Who or what the debt is owed to.
    pub name: String,
    /// The outstanding amount, never negative.
    pub amount: f64,
    /// Optional details about the debt.
    pub description: Option<String>,
}

/// The data needed to record a new debt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDebt {
    /// Who or what the debt is owed to.
    pub name: String,
    /// The outstanding amount.
    pub amount: f64,
    /// Optional details about the debt.
    pub description: Option<String>,
}

/// Create the debt table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_debt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS debt (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Record a new debt for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the name is empty,
/// - [Error::InvalidAmount] if the amount is negative, not a finite number or
///   larger than [MAX_AMOUNT],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_debt(
    user_id: UserID,
    new_debt: NewDebt,
    connection: &Connection,
) -> Result<Debt, Error> {
    let name = new_debt.name.trim();
    if name.is_empty() {
        return Err(Error::MissingField("name"));
    }

    if !is_within_limit(new_debt.amount) || new_debt.amount < 0.0 {
        return Err(Error::InvalidAmount(format!(
            "a debt must be a non-negative number up to {MAX_AMOUNT}, got {}",
            new_debt.amount
        )));
    }

    connection
        .prepare(
            "INSERT INTO debt (user_id, name, amount, description) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, amount, description",
        )?
        .query_row(
            (user_id.as_i64(), name, new_debt.amount, &new_debt.description),
            map_debt_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the debts of `user_id` in the order they were recorded.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_debts(user_id: UserID, connection: &Connection) -> Result<Vec<Debt>, Error> {
    connection
        .prepare(
            "SELECT id, name, amount, description FROM debt WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_debt_row)?
        .map(|maybe_debt| maybe_debt.map_err(|error| error.into()))
        .collect()
}

/// Delete the debt `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingDebt] if no debt of `user_id` has the ID `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_debt(user_id: UserID, id: DebtId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM debt WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingDebt);
    }

    Ok(())
}

fn map_debt_row(row: &Row) -> Result<Debt, rusqlite::Error> {
    Ok(Debt {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
    })
}
