//! Summary cards shown at the top of the dashboard.

use maud::{Markup, html};

use crate::{
    budget::{Budget, Utilization, budget_progress_card, no_budget_card},
    dashboard::aggregation::{MonthTotals, percent_change},
    html::{CARD_STYLE, format_currency},
};

/// Formats a percentage change versus last month, avoiding "-0%".
fn format_change(change: f64) -> String {
    let rounded = change.round();

    if rounded.abs() < 0.5 {
        "0%".to_owned()
    } else if rounded > 0.0 {
        format!("+{rounded:.0}%")
    } else {
        format!("{rounded:.0}%")
    }
}

/// The all-time balance, income and expenses of this month, and the current budget.
pub(super) fn summary_cards(
    balance: f64,
    this_month: MonthTotals,
    last_month: MonthTotals,
    budget: Option<(&Budget, f64, Utilization)>,
) -> Markup {
    html! {
        section id="summary-cards" class="w-full grid grid-cols-1 md:grid-cols-3 gap-4 mb-4"
        {
            (balance_card(balance))
            (month_card(
                "income-card",
                "Income this month",
                this_month.income,
                percent_change(this_month.income, last_month.income),
            ))
            (month_card(
                "expenses-card",
                "Expenses this month",
                this_month.expenses,
                percent_change(this_month.expenses, last_month.expenses),
            ))
        }

        section class="w-full mb-4"
        {
            @match budget {
                Some((budget, spent, utilization)) => (budget_progress_card(budget, spent, &utilization)),
                None => (no_budget_card()),
            }
        }
    }
}

fn balance_card(balance: f64) -> Markup {
    let colour = if balance < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        div id="balance-card" class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { "Total balance" }
            p class={ "text-2xl font-bold " (colour) } { (format_currency(balance)) }
        }
    }
}

fn month_card(id: &str, title: &str, amount: f64, change: Option<f64>) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            p class="text-2xl font-bold" { (format_currency(amount)) }
            p class="change text-xs text-gray-500 dark:text-gray-400"
            {
                @match change {
                    Some(change) => { (format_change(change)) " vs last month" }
                    None => "No data for last month",
                }
            }
        }
    }
}
