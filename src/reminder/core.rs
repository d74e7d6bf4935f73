//! Defines the reminder model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::{MAX_AMOUNT, is_within_limit},
    auth::UserID,
    category::CategoryName,
    database_id::ReminderId,
};

/// The category given to reminders created without one.
pub const DEFAULT_REMINDER_CATEGORY: &str = "Others";

/// A notice of an upcoming payment, optionally repeating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// The ID of the reminder.
    pub id: ReminderId,
    /// What the payment is for.
    pub title: String,
    /// The expected amount of the payment.
    pub amount: f64,
    /// The category the payment will fall under.
    pub category: CategoryName,
    /// The day the payment is due.
    pub date: Date,
    /// Whether the payment repeats.
    pub is_recurring: bool,
}

/// The data needed to create a reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    /// What the payment is for.
    pub title: String,
    /// The expected amount of the payment.
    pub amount: f64,
    /// The category the payment will fall under.
    pub category: CategoryName,
    /// The day the payment is due.
    pub date: Date,
    /// Whether the payment repeats.
    pub is_recurring: bool,
}

/// Create the reminder table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_reminder_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS reminder (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a reminder for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the title is empty,
/// - [Error::InvalidAmount] if the amount is not a finite number or is larger
///   in magnitude than [MAX_AMOUNT],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_reminder(
    user_id: UserID,
    new_reminder: NewReminder,
    connection: &Connection,
) -> Result<Reminder, Error> {
    let title = new_reminder.title.trim();
    if title.is_empty() {
        return Err(Error::MissingField("title"));
    }

    if !is_within_limit(new_reminder.amount) {
        return Err(Error::InvalidAmount(format!(
            "{} is not a finite number up to {MAX_AMOUNT}",
            new_reminder.amount
        )));
    }

    connection
        .prepare(
            "INSERT INTO reminder (user_id, title, amount, category, date, is_recurring)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, title, amount, category, date, is_recurring",
        )?
        .query_row(
            (
                user_id.as_i64(),
                title,
                new_reminder.amount,
                new_reminder.category.as_ref(),
                new_reminder.date,
                new_reminder.is_recurring,
            ),
            map_reminder_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the reminders of `user_id`, soonest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_reminders(user_id: UserID, connection: &Connection) -> Result<Vec<Reminder>, Error> {
    connection
        .prepare(
            "SELECT id, title, amount, category, date, is_recurring FROM reminder
             WHERE user_id = :user_id
             ORDER BY date ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_reminder_row)?
        .map(|maybe_reminder| maybe_reminder.map_err(|error| error.into()))
        .collect()
}

/// Delete the reminder `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingReminder] if no reminder of `user_id` has the ID `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_reminder(
    user_id: UserID,
    id: ReminderId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM reminder WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingReminder);
    }

    Ok(())
}

fn map_reminder_row(row: &Row) -> Result<Reminder, rusqlite::Error> {
    let raw_category: String = row.get(3)?;

    Ok(Reminder {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        category: CategoryName::new_unchecked(&raw_category),
        date: row.get(4)?,
        is_recurring: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::{NewUser, PasswordHash, UserID, create_user},
        category::CategoryName,
        db::initialize,
        reminder::core::{NewReminder, create_reminder, delete_reminder, get_reminders},
    };

    fn get_test_connection() -> (Connection, UserID, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let create = |email: &str| {
            create_user(
                NewUser {
                    name: "Test".to_owned(),
                    email: email.to_owned(),
                    password_hash: Some(PasswordHash::new_unchecked("hash")),
                    google_id: None,
                },
                &conn,
            )
            .unwrap()
            .id
        };
        let alice = create("alice@example.com");
        let bob = create("bob@example.com");

        (conn, alice, bob)
    }

    fn new_reminder(title: &str, date: time::Date) -> NewReminder {
        NewReminder {
            title: title.to_owned(),
            amount: 99.0,
            category: CategoryName::new_unchecked("Bills"),
            date,
            is_recurring: false,
        }
    }

    #[test]
    fn reminders_are_listed_soonest_first() {
        let (conn, alice, _) = get_test_connection();
        let later = create_reminder(alice, new_reminder("Rent", date!(2025 - 12 - 01)), &conn)
            .unwrap();
        let sooner = create_reminder(
            alice,
            NewReminder {
                is_recurring: true,
                ..new_reminder("Phone", date!(2025 - 11 - 15))
            },
            &conn,
        )
        .unwrap();

        assert_eq!(get_reminders(alice, &conn).unwrap(), vec![sooner, later]);
    }

    #[test]
    fn create_fails_on_blank_title() {
        let (conn, alice, _) = get_test_connection();

        let result = create_reminder(alice, new_reminder("", date!(2025 - 12 - 01)), &conn);

        assert_eq!(result, Err(Error::MissingField("title")));
    }

    #[test]
    fn create_fails_on_amount_above_maximum() {
        let (conn, alice, _) = get_test_connection();

        let result = create_reminder(
            alice,
            NewReminder {
                amount: 1e17,
                ..new_reminder("Rent", date!(2025 - 12 - 01))
            },
            &conn,
        );

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let (conn, alice, bob) = get_test_connection();
        let reminder =
            create_reminder(alice, new_reminder("Rent", date!(2025 - 12 - 01)), &conn).unwrap();

        assert_eq!(
            delete_reminder(bob, reminder.id, &conn),
            Err(Error::DeleteMissingReminder)
        );

        delete_reminder(alice, reminder.id, &conn).unwrap();
        assert!(get_reminders(alice, &conn).unwrap().is_empty());
    }
}
