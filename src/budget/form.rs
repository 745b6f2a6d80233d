//! The form used to create and edit budgets.

use axum::response::{IntoResponse, Response};
use axum_extra::extract::Query;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    budget::{Budget, BudgetInput},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, dollar_input_styles, link, loading_spinner,
    },
    navigation::NavBar,
    period::{PeriodKind, default_dates, resolve_end},
};

pub const AMOUNT_INVALID_MSG: &str = "Please enter a valid amount greater than 0";
pub const DATES_REQUIRED_MSG: &str = "Please select both start and end dates";
pub const END_BEFORE_START_MSG: &str = "End date must be after start date";

/// The form data for creating or editing a budget.
///
/// Must be extracted with `axum_extra`'s `Form` so that empty inputs are read
/// as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetForm {
    pub amount: Option<f64>,
    #[serde(default)]
    pub period: PeriodKind,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// The inline error messages of the budget form.
///
/// At most one message is set: the first check that failed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BudgetFormErrors {
    pub amount: Option<&'static str>,
    pub dates: Option<&'static str>,
}

impl BudgetForm {
    /// Check the submitted values and turn them into a budget input.
    ///
    /// # Errors
    ///
    /// Returns the message for the first check that failed.
    pub fn validate(&self) -> Result<BudgetInput, BudgetFormErrors> {
        let amount = match self.amount {
            Some(amount) if amount.is_finite() && amount > 0.0 => amount,
            _ => {
                return Err(BudgetFormErrors {
                    amount: Some(AMOUNT_INVALID_MSG),
                    ..Default::default()
                });
            }
        };

        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(BudgetFormErrors {
                dates: Some(DATES_REQUIRED_MSG),
                ..Default::default()
            });
        };

        if end_date <= start_date {
            return Err(BudgetFormErrors {
                dates: Some(END_BEFORE_START_MSG),
                ..Default::default()
            });
        }

        Ok(BudgetInput {
            amount,
            period: self.period,
            start_date,
            end_date,
        })
    }
}

/// The values the form fields start with.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetFormValues {
    pub amount: Option<f64>,
    pub period: PeriodKind,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl BudgetFormValues {
    /// A monthly budget for the month that `today` falls in.
    pub fn new(today: Date) -> Self {
        let period = PeriodKind::Monthly;
        let (start_date, end_date) = default_dates(period, today);

        Self {
            amount: None,
            period,
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    pub fn from_form(form: &BudgetForm) -> Self {
        Self {
            amount: form.amount,
            period: form.period,
            start_date: form.start_date,
            end_date: form.end_date,
        }
    }

    pub fn from_budget(budget: &Budget) -> Self {
        Self {
            amount: Some(budget.amount),
            period: budget.period,
            start_date: Some(budget.start_date),
            end_date: Some(budget.end_date),
        }
    }
}

/// Where the form sends its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetFormMethod<'a> {
    /// `hx-post` to this URL.
    Post(&'a str),
    /// `hx-put` to this URL, with a delete button that sends `hx-delete` to the second URL.
    Put(&'a str, &'a str),
}

fn error_message(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class="text-red-500 text-base" { (message) }
        }
    }
}

fn period_radio(period: PeriodKind, selected: PeriodKind) -> Markup {
    let id = format!("period-{}", period.as_str());

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="period"
                id=(id)
                type="radio"
                value=(period.as_str())
                checked[period == selected]
                required
                hx-get=(endpoints::BUDGET_END_DATE)
                hx-include="closest form"
                hx-target="#end-date-field"
                hx-swap="outerHTML"
                hx-trigger="change"
                class=(FORM_RADIO_INPUT_STYLE);

            label
                for=(id)
                class=(FORM_RADIO_LABEL_STYLE)
            {
                (period.label())
            }
        }
    }
}

/// The end date input, swapped in whenever the period or start date changes.
pub fn end_date_field(end_date: Option<Date>) -> Markup {
    html! {
        div id="end-date-field"
        {
            label for="end_date" class=(FORM_LABEL_STYLE) { "End date" }

            input
                name="end_date"
                id="end_date"
                type="date"
                value=[end_date]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// The query sent by the form when the end date needs to be recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct EndDateQuery {
    #[serde(default)]
    pub period: PeriodKind,
    pub start_date: Option<Date>,
}

/// Render the end date input for the selected period and start date.
///
/// The input is left empty until a start date is picked.
pub async fn get_end_date_field(Query(query): Query<EndDateQuery>) -> Response {
    let end_date = query
        .start_date
        .map(|start_date| resolve_end(query.period, start_date));

    end_date_field(end_date).into_response()
}

/// The budget form with its submit button.
pub fn budget_form(
    method: BudgetFormMethod,
    submit_text: &str,
    values: &BudgetFormValues,
    errors: &BudgetFormErrors,
) -> Markup {
    let amount = values.amount.map(|amount| format!("{amount:.2}"));
    let (hx_post, hx_put, delete_url) = match method {
        BudgetFormMethod::Post(url) => (Some(url), None, None),
        BudgetFormMethod::Put(url, delete_url) => (None, Some(url), Some(delete_url)),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        value=[amount]
                        required
                        autofocus[errors.amount.is_some()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (error_message(errors.amount))
            }

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Period" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for period in PeriodKind::ALL {
                        (period_radio(period, values.period))
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }

                input
                    name="start_date"
                    id="start_date"
                    type="date"
                    value=[values.start_date]
                    required
                    hx-get=(endpoints::BUDGET_END_DATE)
                    hx-include="closest form"
                    hx-target="#end-date-field"
                    hx-swap="outerHTML"
                    hx-trigger="change"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (end_date_field(values.end_date))

            (error_message(errors.dates))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                " " (submit_text)
            }

            @if let Some(delete_url) = delete_url {
                button
                    type="button"
                    id="delete-button"
                    hx-delete=(delete_url)
                    hx-confirm="Are you sure you want to delete this budget?"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete budget"
                }
            }
        }
    }
}

/// A full page holding a budget form.
pub fn budget_form_page(title: &str, form: Markup) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::BUDGETS_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h2 class="text-xl font-bold" { (title) }

                (form)

                p class="text-sm" { (link(endpoints::BUDGETS_VIEW, "Back to budgets")) }
            }
        }
    };

    base(title, &[dollar_input_styles()], &content)
}
