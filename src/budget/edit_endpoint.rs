//! Defines the endpoint for updating a budget.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        BudgetId, BudgetUpdate,
        core::update_budget,
        form::{BudgetForm, BudgetFormMethod, BudgetFormValues, budget_form},
    },
    endpoints::{self, format_endpoint},
};

/// The state needed to edit a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a budget, redirects to the budgets view on success.
///
/// Saving a cleared budget makes it active again.
pub async fn edit_budget_endpoint(
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let budget_url = format_endpoint(endpoints::BUDGET, budget_id);

            return budget_form(
                BudgetFormMethod::Put(&budget_url, &budget_url),
                "Save Changes",
                &BudgetFormValues::from_form(&form),
                &errors,
            )
            .into_response();
        }
    };

    let update = BudgetUpdate {
        amount: Some(input.amount),
        period: Some(input.period),
        start_date: Some(input.start_date),
        end_date: Some(input.end_date),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_budget(
        user_id,
        budget_id,
        &update,
        OffsetDateTime::now_utc(),
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
