//! Debts the user is tracking, independent of their transactions.

mod core;
mod handlers;

pub use core::create_debt_table;
pub use handlers::{create_debt_endpoint, delete_debt_endpoint, get_debts_endpoint};
