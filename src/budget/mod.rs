//! Budgets: spending limits over a week, month or year.
//!
//! At most one budget governs spending at a time, the most recently created
//! active budget that has not ended. Clearing a budget keeps its row.

mod budgets_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod utilization;

pub use budgets_page::{budget_progress_card, get_budgets_page, no_budget_card};
pub use core::{
    Budget, BudgetId, BudgetInput, BudgetStatus, BudgetUpdate, create_budget, create_budget_table,
    current_budget, fetch_active,
};
pub use create_endpoint::create_budget_endpoint;
pub use create_page::get_create_budget_page;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use edit_page::get_edit_budget_page;
pub use form::get_end_date_field;
pub use utilization::{Utilization, budget_utilization, expenses_in_period};
