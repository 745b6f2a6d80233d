//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    middleware,
    response::Redirect,
    routing::{get, post, put},
};
use axum_extra::extract::PrivateCookieJar;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, get_session,
        post_log_in, register_user,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint, get_budgets_page,
        get_create_budget_page, get_edit_budget_page, get_end_date_field,
    },
    dashboard::get_dashboard_page,
    endpoints,
    events::wait_for_transaction_update,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_create_transaction_page, get_edit_transaction_page, get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::NEW_BUDGET_VIEW, get(get_create_budget_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are requested by htmx, so auth redirects must use the HX-Redirect header.
    let protected_api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::BUDGETS_API, post(create_budget_endpoint))
        .route(
            endpoints::BUDGET,
            put(edit_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(endpoints::BUDGET_END_DATE, get(get_end_date_field))
        .route(
            endpoints::TRANSACTION_EVENTS,
            get(wait_for_transaction_update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    protected_routes
        .merge(protected_api_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard when signed in, otherwise to the log-in page.
async fn get_index_page(jar: PrivateCookieJar) -> Redirect {
    match get_session(&jar) {
        Some(_) => Redirect::to(endpoints::DASHBOARD_VIEW),
        None => Redirect::to(endpoints::LOG_IN_VIEW),
    }
}
