//! How much of a budget has been spent.

use crate::{
    budget::Budget,
    transaction::{Transaction, TransactionType},
};

/// The share of a budget consumed by expenses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utilization {
    /// The percentage spent, between 0 and 100 inclusive.
    pub percent: f64,
    /// The amount left to spend, negative when over budget.
    pub remaining: f64,
    pub is_over_budget: bool,
}

/// Compute the utilization of a budget of `amount` after spending `total_expenses`.
///
/// `amount` must be greater than zero, use [budget_utilization] for stored budgets.
pub fn utilization(amount: f64, total_expenses: f64) -> Utilization {
    Utilization {
        percent: (total_expenses / amount * 100.0).clamp(0.0, 100.0),
        remaining: amount - total_expenses,
        is_over_budget: total_expenses > amount,
    }
}

/// The utilization of `budget`, or `None` if the budget is cleared.
pub fn budget_utilization(budget: &Budget, total_expenses: f64) -> Option<Utilization> {
    if !budget.is_active() || budget.amount <= 0.0 {
        return None;
    }

    Some(utilization(budget.amount, total_expenses))
}

/// The sum of the expenses dated within the budget's start and end dates.
pub fn expenses_in_period(budget: &Budget, transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.type_ == TransactionType::Expense
                && transaction.date >= budget.start_date
                && transaction.date <= budget.end_date
        })
        .map(|transaction| transaction.amount)
        .sum()
}
