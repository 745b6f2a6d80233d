//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{budget_utilization, current_budget, expenses_in_period, fetch_active},
    dashboard::{
        aggregation::{
            BreakdownPeriod, CategoryShare, expenses_by_category, month_start, month_totals,
            monthly_overview, previous_month_start, total_balance,
        },
        cards::summary_cards,
        charts::{
            DashboardChart, chart_container, charts_script, expenses_pie_chart,
            monthly_overview_chart,
        },
        tables::recent_transactions_table,
    },
    endpoints,
    events::{REFRESH_ON_TRANSACTION_UPDATED, transaction_events_listener},
    html::{CATEGORY_BADGE_STYLE, HeadElement, LINK_STYLE, base, format_currency, link},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::get_transactions_for_user,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters of the dashboard page.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The period for the expense breakdown, defaults to this month.
    period: Option<BreakdownPeriod>,
}

fn dashboard_url(period: BreakdownPeriod) -> String {
    if period == BreakdownPeriod::default() {
        endpoints::DASHBOARD_VIEW.to_owned()
    } else {
        format!("{}?period={}", endpoints::DASHBOARD_VIEW, period.as_str())
    }
}

/// Display a page with an overview of the user's data.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let period = query.period.unwrap_or_default();

    let (transactions, budgets) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions = get_transactions_for_user(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
        let budgets = fetch_active(user_id, today, &connection)
            .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

        (transactions, budgets)
    };

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar, period).into_response());
    }

    let this_month = month_start(today);
    let budget = current_budget(&budgets).and_then(|budget| {
        let spent = expenses_in_period(budget, &transactions);
        budget_utilization(budget, spent).map(|utilization| (budget, spent, utilization))
    });
    let cards = summary_cards(
        total_balance(&transactions),
        month_totals(&transactions, this_month),
        month_totals(&transactions, previous_month_start(this_month)),
        budget,
    );

    let shares = expenses_by_category(&transactions, &period.range(today));
    let overview = monthly_overview(&transactions, today);
    let pie_chart = DashboardChart {
        id: "expenses-chart",
        options: expenses_pie_chart(&shares, period.label()).to_string(),
    };
    let overview_chart = DashboardChart {
        id: "monthly-overview-chart",
        options: monthly_overview_chart(&overview).to_string(),
    };

    let content = html!(
        (nav_bar)

        div
            id="dashboard-view"
            hx-get=(dashboard_url(period))
            hx-trigger=(REFRESH_ON_TRANSACTION_UPDATED)
            hx-select="#dashboard-view"
            hx-swap="outerHTML"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (cards)

            section id="expense-breakdown" class="w-full mb-4"
            {
                (period_links(period))

                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @if shares.is_empty() {
                        p id="no-expenses" class="text-gray-500 dark:text-gray-400"
                        {
                            "No expenses " (period.label().to_lowercase()) "."
                        }
                    } @else {
                        (chart_container(&pie_chart))
                        (expense_legend(&shares))
                    }
                }
            }

            section id="charts" class="w-full mx-auto mb-4"
            {
                (chart_container(&overview_chart))
            }

            (recent_transactions_table(&transactions))

            @if shares.is_empty() {
                (charts_script(&[overview_chart]))
            } @else {
                (charts_script(&[pie_chart, overview_chart]))
            }
        }

        (transaction_events_listener())
    );

    let scripts = [HeadElement::ScriptLink(
        "/static/echarts.6.0.0.min.js".to_owned(),
    )];

    Ok(base("Dashboard", &scripts, &content).into_response())
}

fn period_links(selected: BreakdownPeriod) -> Markup {
    html! {
        nav id="period-links" class="flex flex-wrap gap-4 mb-4 text-sm"
        {
            @for period in BreakdownPeriod::ALL {
                @if period == selected {
                    span class="font-semibold" aria-current="true" { (period.label()) }
                } @else {
                    a href=(dashboard_url(period)) class=(LINK_STYLE) { (period.label()) }
                }
            }
        }
    }
}

fn expense_legend(shares: &[CategoryShare]) -> Markup {
    html! {
        ul id="expense-legend" class="space-y-2"
        {
            @for share in shares {
                li class="flex justify-between items-center"
                {
                    span class=(CATEGORY_BADGE_STYLE) { (share.category) }
                    span
                    {
                        (format_currency(share.amount))
                        span class="ml-2 text-sm text-gray-500 dark:text-gray-400"
                        {
                            (format!("{:.0}%", share.share))
                        }
                    }
                }
            }
        }
    }
}

/// Renders the dashboard page when the user has no transactions.
fn dashboard_no_data_view(nav_bar: Markup, period: BreakdownPeriod) -> Markup {
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "recording your first transaction");

    let content = html!(
        (nav_bar)

        div
            id="dashboard-view"
            hx-get=(dashboard_url(period))
            hx-trigger=(REFRESH_ON_TRANSACTION_UPDATED)
            hx-select="#dashboard-view"
            hx-swap="outerHTML"
            class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your balance, budget and charts will show up here once you add some transactions. "
                "Get started by " (new_transaction_link) "."
            }
        }

        (transaction_events_listener())
    );

    base("Dashboard", &[], &content)
}
