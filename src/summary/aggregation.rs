//! Reduces a user's transactions and budget goals into the dashboard summary.
//!
//! Amounts are accumulated as whole cents so the totals do not depend on the
//! order the records are read in. They are converted back to currency units
//! only when building the output.
//!
//! New amounts are capped at [MAX_AMOUNT](crate::amount::MAX_AMOUNT), but the
//! sums saturate rather than overflow so that any stored row is safe to read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{budget::CategoryBudgetGoal, category::CategoryName, summary::CategorizedAmount};

type Cents = i128;

/// NaN counts as zero and out of range amounts saturate.
fn to_cents(amount: f64) -> Cents {
    (amount * 100.0).round() as Cents
}

fn from_cents(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// The aggregated figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all positive amounts.
    pub total_income: f64,
    /// The sum of the absolute values of all negative amounts.
    pub total_expense: f64,
    /// Income minus expenses.
    pub savings: f64,
    /// Same as `savings`.
    pub balance: f64,
    /// The sum of all budget goals.
    pub total_budget: f64,
    /// Progress towards each budget goal, sorted by category.
    pub budget_progress: Vec<BudgetProgress>,
}

/// How much of a category's budget goal has been used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    /// The category the goal applies to.
    pub category: CategoryName,
    /// The spending ceiling for the category.
    pub goal: f64,
    /// The signed sum of the category's transactions.
    pub spent: f64,
    /// The fraction of the goal used, between 0 and 1.
    pub progress: f64,
    /// Whether the category's spending exceeds its goal.
    pub over_budget: bool,
    /// How far spending exceeds the goal, or zero.
    pub over_by: f64,
}

/// The signed sum of one category's transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category.
    pub category: CategoryName,
    /// The signed sum of the category's transaction amounts.
    pub total: f64,
}

fn cents_by_category(transactions: &[CategorizedAmount]) -> HashMap<&CategoryName, Cents> {
    let mut totals = HashMap::new();

    for transaction in transactions {
        let total = totals.entry(&transaction.category).or_insert(0);
        *total = Cents::saturating_add(*total, to_cents(transaction.amount));
    }

    totals
}

/// Sum the transaction amounts of each category.
///
/// Every category with at least one transaction is included, sorted by name.
pub fn category_totals(transactions: &[CategorizedAmount]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = cents_by_category(transactions)
        .into_iter()
        .map(|(category, cents)| CategoryTotal {
            category: category.clone(),
            total: from_cents(cents),
        })
        .collect();

    totals.sort_by(|a, b| a.category.cmp(&b.category));
    totals
}

fn budget_progress(goal: &CategoryBudgetGoal, spent: Cents) -> BudgetProgress {
    let goal_cents = to_cents(goal.goal);
    let spent_abs = spent.saturating_abs();

    let progress = if goal_cents > 0 {
        (spent_abs as f64 / goal_cents as f64).min(1.0)
    } else if spent < 0 {
        1.0
    } else {
        0.0
    };

    let over_budget = spent < 0 && spent_abs > goal_cents;
    let over_by = if over_budget {
        from_cents(spent_abs - goal_cents)
    } else {
        0.0
    };

    BudgetProgress {
        category: goal.category.clone(),
        goal: from_cents(goal_cents),
        spent: from_cents(spent),
        progress,
        over_budget,
        over_by,
    }
}

/// Compute the dashboard summary from all of a user's transactions and goals.
///
/// Positive amounts count as income and negative amounts as expenses.
/// Categories without a goal still count towards the totals but get no
/// budget progress entry. A goal without transactions reports nothing spent.
pub fn summarize(transactions: &[CategorizedAmount], goals: &[CategoryBudgetGoal]) -> Summary {
    let mut income: Cents = 0;
    let mut expense: Cents = 0;

    for transaction in transactions {
        let cents = to_cents(transaction.amount);

        if cents > 0 {
            income = income.saturating_add(cents);
        } else {
            expense = expense.saturating_sub(cents);
        }
    }

    let spent_by_category = cents_by_category(transactions);

    let mut budget_progress: Vec<BudgetProgress> = goals
        .iter()
        .map(|goal| {
            let spent = spent_by_category
                .get(&goal.category)
                .copied()
                .unwrap_or(0);
            budget_progress(goal, spent)
        })
        .collect();
    budget_progress.sort_by(|a, b| a.category.cmp(&b.category));

    let total_budget = goals
        .iter()
        .map(|goal| to_cents(goal.goal))
        .fold(0, Cents::saturating_add);
    let savings = from_cents(income.saturating_sub(expense));

    Summary {
        total_income: from_cents(income),
        total_expense: from_cents(expense),
        savings,
        balance: savings,
        total_budget: from_cents(total_budget),
        budget_progress,
    }
}
