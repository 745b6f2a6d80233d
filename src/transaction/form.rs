//! The form used to create and edit transactions, and the checks run on its input.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, link, loading_spinner,
    },
    navigation::NavBar,
    transaction::{PendingTransaction, TransactionType},
};

pub const DESCRIPTION_REQUIRED_MSG: &str = "Description is required";
pub const CATEGORY_REQUIRED_MSG: &str = "Category is required";
pub const AMOUNT_INVALID_MSG: &str = "Amount must be zero or greater";

/// The form data for creating or editing a transaction.
///
/// Must be extracted with `axum_extra`'s `Form` so that an empty amount is
/// read as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// Minted when the form was rendered. Ignored when editing.
    pub client_id: Uuid,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub amount: Option<f64>,
    pub date: Date,
    #[serde(rename = "type")]
    pub type_: TransactionType,
}

/// Inline error messages for each field of the transaction form.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFormErrors {
    pub description: Option<&'static str>,
    pub category: Option<&'static str>,
    pub amount: Option<&'static str>,
}

impl TransactionForm {
    /// Check the submitted values and turn them into a pending transaction.
    ///
    /// # Errors
    ///
    /// Returns the message for every field that failed validation.
    pub fn validate(&self) -> Result<PendingTransaction, TransactionFormErrors> {
        let mut errors = TransactionFormErrors::default();

        if self.description.trim().is_empty() {
            errors.description = Some(DESCRIPTION_REQUIRED_MSG);
        }

        if self.category.trim().is_empty() {
            errors.category = Some(CATEGORY_REQUIRED_MSG);
        }

        let amount = match self.amount {
            Some(amount) if amount.is_finite() && amount >= 0.0 => amount,
            _ => {
                errors.amount = Some(AMOUNT_INVALID_MSG);
                0.0
            }
        };

        if errors != TransactionFormErrors::default() {
            return Err(errors);
        }

        PendingTransaction::new(
            self.client_id,
            &self.description,
            &self.category,
            amount,
            self.date,
            self.type_,
        )
        .map_err(|_| TransactionFormErrors {
            amount: Some(AMOUNT_INVALID_MSG),
            ..Default::default()
        })
    }
}

/// The values the form fields start with.
#[derive(Debug, Clone)]
pub struct TransactionFormValues<'a> {
    pub client_id: Uuid,
    pub description: &'a str,
    pub category: &'a str,
    pub amount: Option<f64>,
    pub date: Date,
    pub type_: TransactionType,
}

impl<'a> TransactionFormValues<'a> {
    /// Blank values for a new expense dated `today` with a fresh client ID.
    pub fn new(today: Date) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            description: "",
            category: "",
            amount: None,
            date: today,
            type_: TransactionType::Expense,
        }
    }

    /// The values of a submitted form, used when it is shown again with errors.
    pub fn from_form(form: &'a TransactionForm) -> Self {
        Self {
            client_id: form.client_id,
            description: &form.description,
            category: &form.category,
            amount: form.amount,
            date: form.date,
            type_: form.type_,
        }
    }
}

/// Where the form sends its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod<'a> {
    /// `hx-post` to this URL.
    Post(&'a str),
    /// `hx-put` to this URL.
    Put(&'a str),
}

fn error_message(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class="text-red-500 text-base" { (message) }
        }
    }
}

fn type_radio(type_: TransactionType, selected: TransactionType) -> Markup {
    let id = format!("transaction-type-{}", type_.as_str());

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="type"
                id=(id)
                type="radio"
                value=(type_.as_str())
                checked[type_ == selected]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label
                for=(id)
                class=(FORM_RADIO_LABEL_STYLE)
            {
                (type_.label())
            }
        }
    }
}

/// The transaction form with its submit button.
///
/// The server answers invalid input with this form and inline error messages,
/// which replaces the form on the page.
pub fn transaction_form(
    method: FormMethod,
    submit_text: &str,
    values: &TransactionFormValues,
    errors: &TransactionFormErrors,
    categories: &[String],
) -> Markup {
    let amount = values.amount.map(|amount| format!("{amount:.2}"));
    let (hx_post, hx_put) = match method {
        FormMethod::Post(url) => (Some(url), None),
        FormMethod::Put(url) => (None, Some(url)),
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
            input type="hidden" name="client_id" value=(values.client_id);

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    (type_radio(TransactionType::Expense, values.type_))
                    (type_radio(TransactionType::Income, values.type_))
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="e.g. Weekly groceries"
                    value=(values.description)
                    required
                    autofocus[errors.description.is_some()]
                    class=(FORM_TEXT_INPUT_STYLE);

                (error_message(errors.description))
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                input
                    name="category"
                    id="category"
                    type="text"
                    list="category-options"
                    placeholder="e.g. Groceries"
                    value=(values.category)
                    required
                    autocomplete="off"
                    autofocus[errors.category.is_some()]
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id="category-options"
                {
                    @for category in categories {
                        option value=(category) {}
                    }
                }

                (error_message(errors.category))
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                // w-full needed to ensure input takes the full width when prefilled with a value
                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        step="0.01"
                        min="0"
                        placeholder="0.00"
                        value=[amount]
                        required
                        autofocus[errors.amount.is_some()]
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (error_message(errors.amount))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator"
                {
                    (loading_spinner())
                }
                " " (submit_text)
            }
        }
    }
}

/// A full page holding a transaction form.
pub fn transaction_form_page(title: &str, form: Markup) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h2 class="text-xl font-bold" { (title) }

                (form)

                p class="text-sm" { (link(endpoints::TRANSACTIONS_VIEW, "Back to transactions")) }
            }
        }
    };

    base(title, &[dollar_input_styles()], &content)
}
