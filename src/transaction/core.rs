//! Defines the core data models and database queries for transactions.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    amount::{MAX_AMOUNT, is_within_limit},
    auth::UserID,
    category::CategoryName,
    database_id::{DatabaseId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction earned or spent money.
///
/// This is never stored. It is derived from the sign of the amount whenever a
/// transaction is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, a positive amount.
    Income,
    /// Money spent, a negative amount.
    Expense,
}

impl TransactionType {
    /// Classify `amount` by its sign.
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money earned (positive) or spent (negative).
    pub amount: f64,
    /// Income or expense, derived from the sign of `amount`.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category the transaction counts towards.
    pub category: CategoryName,
    /// An optional free-form note.
    pub note: Option<String>,
    /// Labels attached to the transaction, without duplicates.
    pub tags: BTreeSet<String>,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(title: &str, amount: f64, category: CategoryName) -> TransactionBuilder {
        TransactionBuilder {
            title: title.to_owned(),
            amount,
            category,
            note: None,
            tags: BTreeSet::new(),
            date: OffsetDateTime::now_utc(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields default to no note, no tags, and the current time.
/// The builder is inserted with [create_transaction], which validates it.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// A short description of what the transaction was for.
    pub title: String,

    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income, negative values represent
    /// expenses. Zero is not a valid amount.
    ///
    /// # Examples
    /// - `5000.00` - Salary deposit
    /// - `-45.99` - Coffee shop purchase
    /// - `-1200.00` - Rent payment
    pub amount: f64,

    /// The category of the transaction, e.g. "Food", "Transport", "Rent".
    pub category: CategoryName,

    /// An optional free-form note.
    pub note: Option<String>,

    /// Labels attached to the transaction.
    pub tags: BTreeSet<String>,

    /// When the transaction happened.
    pub date: OffsetDateTime,
}

impl TransactionBuilder {
    /// Set the note for the transaction.
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Set the tags for the transaction.
    ///
    /// Tags are trimmed, and empty or repeated tags are dropped.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        self
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = date;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction and transaction tag tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                note TEXT,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Transactions are always listed per user, newest first.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_tag (
                transaction_id INTEGER NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (transaction_id, tag),
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new transaction for `user_id` in the database from a builder.
///
/// The transaction row and its tags are written atomically.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the title is empty,
/// - [Error::InvalidAmount] if the amount is zero or not a finite number,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let title = builder.title.trim();
    if title.is_empty() {
        return Err(Error::MissingField("title"));
    }

    validate_amount(builder.amount)?;

    let date = builder.date.to_offset(UtcOffset::UTC);
    let sql_transaction = connection.unchecked_transaction()?;

    let id: TransactionId = sql_transaction
        .prepare(
            "INSERT INTO \"transaction\" (user_id, title, amount, category, note, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                title,
                builder.amount,
                builder.category.as_ref(),
                &builder.note,
                date,
            ),
            |row| row.get(0),
        )?;

    {
        let mut insert_tag = sql_transaction
            .prepare("INSERT INTO transaction_tag (transaction_id, tag) VALUES (?1, ?2)")?;

        for tag in &builder.tags {
            insert_tag.execute((id, tag))?;
        }
    }

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        title: title.to_owned(),
        amount: builder.amount,
        transaction_type: TransactionType::from_amount(builder.amount),
        category: builder.category,
        note: builder.note,
        tags: builder.tags,
        date,
    })
}

/// Check that `amount` can be stored as a transaction amount.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is zero, not a finite number, or
/// larger in magnitude than [MAX_AMOUNT].
fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!(
            "{amount} is not a finite number"
        )));
    }

    if !is_within_limit(amount) {
        return Err(Error::InvalidAmount(format!(
            "{amount} is larger than the maximum of {MAX_AMOUNT}"
        )));
    }

    if amount == 0.0 {
        return Err(Error::InvalidAmount(
            "a transaction amount cannot be zero".to_owned(),
        ));
    }

    Ok(())
}

/// Retrieve all of the transactions belonging to `user_id`, newest first.
///
/// Transactions on the same date are ordered by descending ID.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut tags_by_transaction: HashMap<DatabaseId, BTreeSet<String>> = HashMap::new();

    connection
        .prepare(
            "SELECT tt.transaction_id, tt.tag
             FROM transaction_tag tt
             INNER JOIN \"transaction\" t ON t.id = tt.transaction_id
             WHERE t.user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok((row.get::<_, DatabaseId>(0)?, row.get::<_, String>(1)?))
        })?
        .try_for_each(|row| {
            let (transaction_id, tag) = row?;
            tags_by_transaction
                .entry(transaction_id)
                .or_default()
                .insert(tag);
            Ok::<_, rusqlite::Error>(())
        })?;

    connection
        .prepare(
            "SELECT id, title, amount, category, note, date
             FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|row| {
            row.map(|mut transaction| {
                if let Some(tags) = tags_by_transaction.remove(&transaction.id) {
                    transaction.tags = tags;
                }
                transaction
            })
            .map_err(Error::from)
        })
        .collect()
}

type RowsAffected = usize;

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// Returns the number of deleted rows, which is zero if the transaction does
/// not exist or belongs to another user.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id.as_i64())],
        )
        .map_err(|err| err.into())
}

/// Get the total number of transactions in the database across all users.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction without its tags.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let category: String = row.get(3)?;
    let note = row.get(4)?;
    let date = row.get(5)?;

    Ok(Transaction {
        id,
        title,
        amount,
        transaction_type: TransactionType::from_amount(amount),
        category: CategoryName::new_unchecked(&category),
        note,
        tags: BTreeSet::new(),
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================
