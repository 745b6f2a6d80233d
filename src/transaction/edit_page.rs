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
    category::get_category_names,
    endpoints::{self, format_endpoint},
    transaction::{
        TransactionId,
        core::get_transaction,
        form::{
            FormMethod, TransactionFormErrors, TransactionFormValues, transaction_form,
            transaction_form_page,
        },
    },
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
///
/// Responds with the 404 page if the transaction does not exist or belongs to another user.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(user_id, transaction_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
        }
    })?;

    let categories = get_category_names(user_id, &connection)?;

    let update_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let values = TransactionFormValues {
        client_id: transaction.client_id,
        description: &transaction.description,
        category: &transaction.category,
        amount: Some(transaction.amount),
        date: transaction.date,
        type_: transaction.type_,
    };
    let form = transaction_form(
        FormMethod::Put(&update_url),
        "Save Changes",
        &values,
        &TransactionFormErrors::default(),
        &categories,
    );

    Ok(transaction_form_page("Edit Transaction", form).into_response())
}
