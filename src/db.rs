//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    auth::{create_oauth_state_table, create_user_table},
    budget::create_budget_goal_table,
    debt::create_debt_table,
    reminder::create_reminder_table,
    transaction::create_transaction_table,
};

/// Create all the application tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection` so that deleting a
/// user or transaction cascades to the rows that reference it.
///
/// # Errors
/// Returns an [Error::SqlError] if any table cannot be created. No tables are
/// created in that case.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_oauth_state_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_goal_table(&transaction)?;
    create_debt_table(&transaction)?;
    create_reminder_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
