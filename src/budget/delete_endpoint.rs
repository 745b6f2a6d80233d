use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{BudgetId, core::soft_delete_budget},
    endpoints,
};

/// The state needed to clear a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that clears a budget and redirects to the budgets view.
///
/// The budget row is kept with its status set to cleared.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => {
            soft_delete_budget(user_id, budget_id, OffsetDateTime::now_utc(), &connection)
        }
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match result {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not clear budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
