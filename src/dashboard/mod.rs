//! Dashboard module
//!
//! Provides an overview page with the user's balance, monthly totals, current
//! budget, expense breakdown, monthly trend and recent transactions.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
