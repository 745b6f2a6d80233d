//! The page that lists, filters and pages through the user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::get_category_names,
    endpoints::{self, format_endpoint},
    events::{REFRESH_ON_TRANSACTION_UPDATED, transaction_events_listener},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, description_cell, edit_delete_action_links,
        format_currency,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, create_pagination_indicators, pagination_nav},
    transaction::{
        Transaction, TransactionType,
        core::get_transactions_for_user,
        pipeline::{
            ListQuery, ListSpec, PageResult, SortDirection, SortKey, Summary, TypeFilter, apply,
        },
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the transactions described by the query parameters.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ListQuery>,
) -> Result<Response, Error> {
    let (transactions, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions = get_transactions_for_user(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
        let categories = get_category_names(user_id, &connection)?;

        (transactions, categories)
    };

    let spec = ListSpec::from_query(&query).with_page_size(state.pagination_config.page_size);
    let result = apply(&transactions, &spec);

    Ok(transactions_view(
        &result,
        &spec,
        &categories,
        !transactions.is_empty(),
        state.pagination_config.max_pages,
    )
    .into_response())
}

fn transactions_view(
    result: &PageResult,
    spec: &ListSpec,
    categories: &[String],
    has_transactions: bool,
    max_pages: u64,
) -> Markup {
    let current_url = spec.url(endpoints::TRANSACTIONS_VIEW);
    let indicators = create_pagination_indicators(spec.page(), result.page_count(), max_pages);

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div
                id="transactions-view"
                class="w-full max-w-5xl space-y-6"
                hx-get=(current_url)
                hx-trigger=(REFRESH_ON_TRANSACTION_UPDATED)
                hx-select="#transactions-view"
                hx-swap="outerHTML"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-2xl font-bold" { "Transactions" }

                    a
                        href=(endpoints::NEW_TRANSACTION_VIEW)
                        class=(LINK_STYLE)
                    {
                        "New transaction"
                    }
                }

                (summary_widget(&result.summary))

                (filter_form(spec, categories))

                @if !has_transactions {
                    div class=(CARD_STYLE)
                    {
                        p { "No transactions yet." }
                        p
                        {
                            a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                            {
                                "Record your first transaction"
                            }
                        }
                    }
                } @else if result.items.is_empty() {
                    div class=(CARD_STYLE)
                    {
                        p { "No transactions match your filters." }
                    }
                } @else {
                    (transactions_table(&result.items, spec))
                }

                @if result.page_count() > 1 {
                    (pagination_nav(&indicators, |page| {
                        spec.clone().with_page(page).url(endpoints::TRANSACTIONS_VIEW)
                    }))
                }
            }

            (transaction_events_listener())
        }
    };

    base("Transactions", &[], &content)
}

fn summary_widget(summary: &Summary) -> Markup {
    let is_negative = summary.balance < 0.0;
    let balance_style = if is_negative {
        "text-2xl font-bold text-red-600 dark:text-red-400"
    } else {
        "text-2xl font-bold text-green-600 dark:text-green-400"
    };

    html! {
        div id="summary" class="grid grid-cols-1 sm:grid-cols-3 gap-4"
        {
            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Income" }
                p class="text-2xl font-bold" { (format_currency(summary.total_income)) }
            }

            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Expenses" }
                p class="text-2xl font-bold" { (format_currency(summary.total_expenses)) }
            }

            div class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                p id="balance" class=(balance_style)
                {
                    (format_currency(summary.balance.abs()))
                    @if is_negative {
                        span class="ml-2 text-sm font-normal" { "(Over budget)" }
                    }
                }
            }
        }
    }
}

fn filter_form(spec: &ListSpec, categories: &[String]) -> Markup {
    let sort = (spec.sort_key() != SortKey::default()).then_some(spec.sort_key());
    let direction =
        (spec.sort_direction() != SortDirection::default()).then_some(spec.sort_direction());

    html! {
        form
            id="filter-form"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class={ "grid grid-cols-1 md:grid-cols-4 gap-4 " (CARD_STYLE) }
        {
            @if let Some(sort) = sort {
                input type="hidden" name="sort" value=(sort_key_value(sort));
            }
            @if let Some(direction) = direction {
                input type="hidden" name="direction" value=(sort_direction_value(direction));
            }

            div class="md:col-span-2"
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }
                input
                    type="search"
                    name="search"
                    id="search"
                    placeholder="Search descriptions"
                    value=(spec.search())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="type-filter" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type-filter" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for type_filter in TypeFilter::ALL {
                        option
                            value=(type_filter.as_str())
                            selected[type_filter == spec.type_filter()]
                        {
                            (type_filter.label())
                        }
                    }
                }
            }

            div
            {
                label for="category-filter" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category-filter" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }
                    @for category in categories {
                        option
                            value=(category)
                            selected[spec.category().is_some_and(|selected| selected.eq_ignore_ascii_case(category))]
                        {
                            (category)
                        }
                    }
                }
            }

            div
            {
                label for="start-date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="start_date"
                    id="start-date"
                    value=[spec.start_date()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end-date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="end_date"
                    id="end-date"
                    value=[spec.end_date()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="min-amount" class=(FORM_LABEL_STYLE) { "Min amount" }
                input
                    type="number"
                    name="min_amount"
                    id="min-amount"
                    step="0.01"
                    min="0"
                    value=[spec.min_amount()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="max-amount" class=(FORM_LABEL_STYLE) { "Max amount" }
                input
                    type="number"
                    name="max_amount"
                    id="max-amount"
                    step="0.01"
                    min="0"
                    value=[spec.max_amount()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-4 flex items-center gap-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply filters" }

                @if spec.is_filtered() {
                    a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Clear" }
                }
            }
        }
    }
}

fn sort_key_value(key: SortKey) -> &'static str {
    match key {
        SortKey::Date => "date",
        SortKey::Amount => "amount",
    }
}

fn sort_direction_value(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    }
}

fn sort_header(spec: &ListSpec, key: SortKey, title: &str) -> Markup {
    let url = spec.clone().toggle_sort(key).url(endpoints::TRANSACTIONS_VIEW);
    let arrow = match (spec.sort_key() == key, spec.sort_direction()) {
        (true, SortDirection::Asc) => " ▲",
        (true, SortDirection::Desc) => " ▼",
        (false, _) => "",
    };

    html! {
        th scope="col" class=(TABLE_CELL_STYLE)
        {
            a href=(url) class="hover:underline" { (title) (arrow) }
        }
    }
}

fn transactions_table(transactions: &[Transaction], spec: &ListSpec) -> Markup {
    html! {
        div class="overflow-x-auto rounded-lg shadow-md"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        (sort_header(spec, SortKey::Date, "Date"))
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        (sort_header(spec, SortKey::Amount, "Amount"))
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction))
                    }
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let (amount_style, sign) = match transaction.type_ {
        TransactionType::Income => ("text-green-600 dark:text-green-400", "+"),
        TransactionType::Expense => ("text-red-600 dark:text-red-400", "-"),
    };
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            (description_cell(&transaction.description))
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
            }
            td class={ (TABLE_CELL_STYLE) " " (amount_style) }
            {
                (sign) (format_currency(transaction.amount))
            }
            td class={ (TABLE_CELL_STYLE) " flex gap-4" }
            {
                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    "Are you sure you want to delete this transaction?",
                    "#alert-container",
                    "innerHTML",
                ))
            }
        }
    }
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, response::Response};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::{Duration, macros::date};

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        endpoints,
        pagination::PaginationConfig,
        test_utils::{
            assert_status_ok, assert_valid_html, get_test_connection_with_user,
            insert_transaction, parse_html_document,
        },
        transaction::{
            TransactionType,
            pipeline::{ListQuery, SortKey, TypeFilter},
        },
    };

    use super::{TransactionsPageState, get_transactions_page};

    fn get_state(connection: Connection) -> TransactionsPageState {
        TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        }
    }

    async fn get_page(state: TransactionsPageState, user_id: UserID, query: ListQuery) -> Html {
        let response: Response = get_transactions_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();
        assert_status_ok(&response);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        document
    }

    fn row_descriptions(document: &Html) -> Vec<String> {
        document
            .select(&Selector::parse("tbody tr td:nth-child(2)").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect()
    }

    fn add_expenses(user_id: UserID, count: i64, connection: &Connection) {
        for i in 0..count {
            insert_transaction(
                user_id,
                &format!("expense {i}"),
                "Groceries",
                10.0,
                date!(2025 - 06 - 30) - Duration::days(i),
                TransactionType::Expense,
                connection,
            );
        }
    }

    #[tokio::test]
    async fn shows_first_page_with_pagination() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 15, &connection);

        let document = get_page(get_state(connection), user_id, ListQuery::default()).await;

        let descriptions = row_descriptions(&document);
        assert_eq!(descriptions.len(), 10);
        assert_eq!(descriptions[0], "expense 0");
        let next_page = document
            .select(&Selector::parse("nav[aria-label=Pagination] a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect::<Vec<_>>();
        assert!(next_page.contains(&"/transactions?page=2"));
    }

    #[tokio::test]
    async fn pagination_links_keep_date_filter() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 15, &connection);
        let query = ListQuery {
            start_date: Some(date!(2025 - 06 - 01)),
            end_date: Some(date!(2025 - 06 - 30)),
            ..Default::default()
        };

        let document = get_page(get_state(connection), user_id, query).await;

        let next_page = document
            .select(&Selector::parse("nav[aria-label=Pagination] a").unwrap())
            .find(|link| link.text().collect::<String>() == "Next")
            .and_then(|link| link.value().attr("href"))
            .unwrap();
        assert_eq!(
            next_page,
            "/transactions?start_date=2025-06-01&end_date=2025-06-30&page=2"
        );
    }

    #[tokio::test]
    async fn second_page_shows_remainder() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 15, &connection);
        let query = ListQuery {
            page: Some(2),
            ..Default::default()
        };

        let document = get_page(get_state(connection), user_id, query).await;

        assert_eq!(row_descriptions(&document).len(), 5);
    }

    #[tokio::test]
    async fn filters_by_type_and_shows_summary() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 2, &connection);
        insert_transaction(
            user_id,
            "Salary",
            "Work",
            500.0,
            date!(2025 - 06 - 15),
            TransactionType::Income,
            &connection,
        );
        let query = ListQuery {
            type_: Some(TypeFilter::Income),
            ..Default::default()
        };

        let document = get_page(get_state(connection), user_id, query).await;

        assert_eq!(row_descriptions(&document), ["Salary"]);
        let balance = document
            .select(&Selector::parse("#balance").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(balance.trim(), "$500.00");
    }

    #[tokio::test]
    async fn negative_balance_is_flagged() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 3, &connection);

        let document = get_page(get_state(connection), user_id, ListQuery::default()).await;

        let balance = document
            .select(&Selector::parse("#balance").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(balance.contains("$30.00"), "got {balance}");
        assert!(balance.contains("(Over budget)"), "got {balance}");
    }

    #[tokio::test]
    async fn sort_headers_toggle_direction() {
        let (connection, user_id) = get_test_connection_with_user();
        add_expenses(user_id, 2, &connection);

        let document = get_page(get_state(connection), user_id, ListQuery::default()).await;

        let links = document
            .select(&Selector::parse("thead a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect::<Vec<_>>();
        assert_eq!(
            links,
            [
                "/transactions?direction=asc",
                "/transactions?sort=amount&direction=asc"
            ]
        );
    }

    #[tokio::test]
    async fn amount_sort_orders_rows() {
        let (connection, user_id) = get_test_connection_with_user();
        for (description, amount) in [("medium", 50.0), ("small", 5.0), ("large", 500.0)] {
            insert_transaction(
                user_id,
                description,
                "Other",
                amount,
                date!(2025 - 06 - 01),
                TransactionType::Expense,
                &connection,
            );
        }
        let query = ListQuery {
            sort: Some(SortKey::Amount),
            ..Default::default()
        };

        let document = get_page(get_state(connection), user_id, query).await;

        assert_eq!(row_descriptions(&document), ["large", "medium", "small"]);
    }

    #[tokio::test]
    async fn only_shows_own_transactions() {
        let (connection, user_id) = get_test_connection_with_user();
        let other = create_user("other@example.com", PasswordHash::new_unchecked("x"), &connection)
            .unwrap();
        insert_transaction(
            other.id,
            "Not mine",
            "Other",
            1.0,
            date!(2025 - 06 - 01),
            TransactionType::Expense,
            &connection,
        );
        insert_transaction(
            user_id,
            "Mine",
            "Other",
            1.0,
            date!(2025 - 06 - 01),
            TransactionType::Expense,
            &connection,
        );

        let document = get_page(get_state(connection), user_id, ListQuery::default()).await;

        assert_eq!(row_descriptions(&document), ["Mine"]);
    }

    #[tokio::test]
    async fn empty_state_links_to_new_transaction() {
        let (connection, user_id) = get_test_connection_with_user();

        let document = get_page(get_state(connection), user_id, ListQuery::default()).await;

        let links = document
            .select(&Selector::parse("#transactions-view a[href='/transactions/new']").unwrap())
            .count();
        assert_eq!(links, 2, "want the header link and the empty state link");
        assert!(row_descriptions(&document).is_empty());
    }

    #[tokio::test]
    async fn view_refreshes_on_transaction_updates() {
        let (connection, user_id) = get_test_connection_with_user();
        let query = ListQuery {
            search: Some("coffee".to_owned()),
            ..Default::default()
        };

        let document = get_page(get_state(connection), user_id, query).await;

        let view = document
            .select(&Selector::parse("#transactions-view").unwrap())
            .next()
            .expect("missing #transactions-view");
        assert_eq!(
            view.value().attr("hx-trigger"),
            Some("transactionUpdated from:body")
        );
        assert_eq!(view.value().attr("hx-get"), Some("/transactions?search=coffee"));
        let listener = document
            .select(&Selector::parse(&format!("[hx-get='{}']", endpoints::TRANSACTION_EVENTS)).unwrap())
            .count();
        assert_eq!(listener, 1);
    }
}
