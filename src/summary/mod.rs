//! The dashboard summary: income, expense and savings totals, plus progress
//! towards each category budget goal.

mod aggregation;
mod handlers;
mod transaction;

pub use aggregation::{CategoryTotal, Summary, category_totals, summarize};
pub use handlers::get_summary_endpoint;
pub use transaction::{CategorizedAmount, get_categorized_amounts};
