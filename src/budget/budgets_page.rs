//! The page that shows the current budget and the budgets that have not ended yet.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        Budget, Utilization, budget_utilization, current_budget, expenses_in_period, fetch_active,
    },
    endpoints::{self, format_endpoint},
    events::{REFRESH_ON_TRANSACTION_UPDATED, transaction_events_listener},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::get_local_date,
    transaction::get_transactions_for_user,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the budgets page.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let (budgets, transactions) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let budgets = fetch_active(user_id, today, &connection)
            .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;
        let transactions = get_transactions_for_user(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

        (budgets, transactions)
    };

    let current = current_budget(&budgets).and_then(|budget| {
        let spent = expenses_in_period(budget, &transactions);
        budget_utilization(budget, spent).map(|utilization| (budget, spent, utilization))
    });

    let content = html! {
        (NavBar::new(endpoints::BUDGETS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div
                id="budgets-view"
                class="w-full max-w-3xl space-y-6"
                hx-get=(endpoints::BUDGETS_VIEW)
                hx-trigger=(REFRESH_ON_TRANSACTION_UPDATED)
                hx-select="#budgets-view"
                hx-swap="outerHTML"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-2xl font-bold" { "Budgets" }

                    a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "New budget" }
                }

                @match current {
                    Some((budget, spent, utilization)) => {
                        (budget_progress_card(budget, spent, &utilization))
                    }
                    None => (no_budget_card()),
                }

                @if !budgets.is_empty() {
                    (budgets_table(&budgets))
                }
            }

            (transaction_events_listener())
        }
    };

    Ok(base("Budgets", &[], &content).into_response())
}

/// The prompt shown when no budget is active.
pub fn no_budget_card() -> Markup {
    html! {
        div id="current-budget" class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold" { "No active budget" }
            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Set a budget to track how much you spend each period. "
                a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "Create a budget" }
            }
        }
    }
}

/// The amount, spending and progress bar of the current budget.
pub fn budget_progress_card(budget: &Budget, spent: f64, utilization: &Utilization) -> Markup {
    let bar_colour = if utilization.is_over_budget {
        "bg-red-600"
    } else {
        "bg-blue-600"
    };
    let edit_url = format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);

    html! {
        div id="current-budget" class={ (CARD_STYLE) " space-y-3" }
        {
            div class="flex justify-between items-center"
            {
                h2 class="text-lg font-semibold"
                {
                    (budget.period.label()) " budget"
                }

                a href=(edit_url) class=(LINK_STYLE) { "Edit" }
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (budget.start_date) " to " (budget.end_date)
            }

            div class="grid grid-cols-3 gap-4"
            {
                div
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Budget" }
                    p id="budget-amount" class="text-xl font-bold" { (format_currency(budget.amount)) }
                }
                div
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Spent" }
                    p id="budget-spent" class="text-xl font-bold" { (format_currency(spent)) }
                }
                div
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Remaining" }
                    p id="budget-remaining" class="text-xl font-bold"
                    {
                        (format_currency(utilization.remaining))
                    }
                }
            }

            div
                class="w-full h-3 rounded-full bg-gray-200 dark:bg-gray-700"
                role="progressbar"
                aria-valuemin="0"
                aria-valuemax="100"
                aria-valuenow=(format!("{:.0}", utilization.percent))
            {
                div
                    class={ "h-3 rounded-full " (bar_colour) }
                    style=(format!("width: {:.0}%", utilization.percent))
                {}
            }

            p class="text-sm"
            {
                (format!("{:.0}% used", utilization.percent))
                @if utilization.is_over_budget {
                    span id="over-budget" class="ml-2 font-semibold text-red-600 dark:text-red-400"
                    {
                        "Over budget"
                    }
                }
            }
        }
    }
}

fn budgets_table(budgets: &[Budget]) -> Markup {
    html! {
        div class="overflow-x-auto rounded-lg shadow-md"
        {
            table id="budgets-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Dates" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for budget in budgets {
                        tr class=(TABLE_ROW_STYLE) data-budget-id=(budget.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (budget.period.label()) }
                            td class=(TABLE_CELL_STYLE) { (budget.start_date) " to " (budget.end_date) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(budget.amount)) }
                            td class=(TABLE_CELL_STYLE) { (budget.status.label()) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                a href=(format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id)) class=(LINK_STYLE)
                                {
                                    "Edit"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
