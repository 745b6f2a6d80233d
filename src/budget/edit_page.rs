use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{
        BudgetId,
        core::get_budget,
        form::{
            BudgetFormErrors, BudgetFormMethod, BudgetFormValues, budget_form, budget_form_page,
        },
    },
    endpoints::{self, format_endpoint},
};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing or clearing a budget.
pub async fn get_edit_budget_page(
    State(state): State<EditBudgetPageState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Response, Error> {
    let budget = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_budget(user_id, budget_id, &connection).inspect_err(|error| {
            if *error != Error::NotFound {
                tracing::error!("Failed to retrieve budget {budget_id}: {error}");
            }
        })?
    };

    let budget_url = format_endpoint(endpoints::BUDGET, budget.id);
    let form = budget_form(
        BudgetFormMethod::Put(&budget_url, &budget_url),
        "Save Changes",
        &BudgetFormValues::from_budget(&budget),
        &BudgetFormErrors::default(),
    );

    Ok(budget_form_page("Edit Budget", form).into_response())
}

#[cfg(test)]
mod edit_budget_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        budget::{BudgetInput, create_budget},
        endpoints::{self, format_endpoint},
        period::PeriodKind,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html,
            get_test_connection_with_user, must_get_form, parse_html_document,
        },
    };

    use super::{EditBudgetPageState, get_edit_budget_page};

    #[tokio::test]
    async fn form_is_prefilled() {
        let (connection, user_id) = get_test_connection_with_user();
        let budget = create_budget(
            user_id,
            &BudgetInput {
                amount: 250.0,
                period: PeriodKind::Weekly,
                start_date: date!(2025 - 03 - 03),
                end_date: date!(2025 - 03 - 10),
            },
            OffsetDateTime::now_utc(),
            &connection,
        )
        .unwrap();
        let state = EditBudgetPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_edit_budget_page(State(state), Extension(user_id), Path(budget.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::BUDGET, budget.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "amount", "number", "250.00");
        assert_form_input_with_value(&form, "start_date", "date", "2025-03-03");
        assert_form_input_with_value(&form, "end_date", "date", "2025-03-10");
        let weekly = form
            .select(&scraper::Selector::parse("input#period-weekly").unwrap())
            .next()
            .unwrap();
        assert!(weekly.value().attr("checked").is_some());
    }

    #[tokio::test]
    async fn missing_budget_is_not_found() {
        let (connection, user_id) = get_test_connection_with_user();
        let state = EditBudgetPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result = get_edit_budget_page(State(state), Extension(user_id), Path(7)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
