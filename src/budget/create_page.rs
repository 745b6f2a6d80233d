use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    budget::form::{
        BudgetFormErrors, BudgetFormMethod, BudgetFormValues, budget_form, budget_form_page,
    },
    endpoints,
    timezone::get_local_date,
};

/// The state needed for the new budget page.
#[derive(Debug, Clone)]
pub struct CreateBudgetPageState {
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Renders the page for creating a budget, prefilled with a monthly budget for the current month.
pub async fn get_create_budget_page(
    State(state): State<CreateBudgetPageState>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    let form = budget_form(
        BudgetFormMethod::Post(endpoints::BUDGETS_API),
        "Create Budget",
        &BudgetFormValues::new(today),
        &BudgetFormErrors::default(),
    );

    Ok(budget_form_page("New Budget", form).into_response())
}

#[cfg(test)]
mod create_budget_page_tests {
    use axum::extract::State;

    use crate::{
        endpoints,
        period::{PeriodKind, default_dates},
        test_utils::{
            assert_form_input_with_value, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_status_ok, assert_valid_html, must_get_form, parse_html_document,
        },
        timezone::get_local_date,
    };

    use super::{CreateBudgetPageState, get_create_budget_page};

    #[tokio::test]
    async fn form_defaults_to_current_month() {
        let state = CreateBudgetPageState {
            local_timezone: "Etc/UTC".to_owned(),
        };
        let (start, end) = default_dates(PeriodKind::Monthly, get_local_date("Etc/UTC").unwrap());

        let response = get_create_budget_page(State(state)).await.unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        assert_form_input_with_value(&form, "start_date", "date", &start.to_string());
        assert_form_input_with_value(&form, "end_date", "date", &end.to_string());
        assert_form_submit_button_with_text(&form, "Create Budget");
    }
}
