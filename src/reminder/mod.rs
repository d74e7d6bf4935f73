//! Reminders of upcoming payments.

mod core;
mod handlers;

pub use core::create_reminder_table;
pub use handlers::{create_reminder_endpoint, delete_reminder_endpoint, get_reminders_endpoint};
