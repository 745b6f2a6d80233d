//! Defines the endpoint for updating an existing transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{ensure_category, get_category_names},
    endpoints::{self, format_endpoint},
    events::{TransactionEvents, transaction_updated_header},
    transaction::{
        TransactionChanges, TransactionId,
        core::update_transaction,
        form::{FormMethod, TransactionForm, TransactionFormValues, transaction_form},
    },
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub events: TransactionEvents,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to transactions view on success.
///
/// The transaction keeps its ID and client ID.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let pending = match form.validate() {
        Ok(pending) => pending,
        Err(errors) => {
            let categories = get_category_names(user_id, &connection).unwrap_or_default();
            let update_url = format_endpoint(endpoints::TRANSACTION, transaction_id);

            return transaction_form(
                FormMethod::Put(&update_url),
                "Save Changes",
                &TransactionFormValues::from_form(&form),
                &errors,
                &categories,
            )
            .into_response();
        }
    };

    let changes = TransactionChanges {
        description: pending.description,
        category: pending.category,
        amount: pending.amount,
        date: pending.date,
        type_: pending.type_,
    };

    let sql_transaction =
        match SqlTransaction::new_unchecked(&connection, TransactionBehavior::Immediate) {
            Ok(sql_transaction) => sql_transaction,
            Err(error) => {
                tracing::error!("could not start SQL transaction: {error}");
                return Error::from(error).into_alert_response();
            }
        };

    let updated = match update_transaction(
        user_id,
        transaction_id,
        &changes,
        OffsetDateTime::now_utc(),
        &sql_transaction,
    ) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) =
        ensure_category(user_id, &updated.category, updated.type_, &sql_transaction)
    {
        tracing::error!("could not save category {:?}: {error}", updated.category);
        return error.into_alert_response();
    }

    if let Err(error) = sql_transaction.commit() {
        tracing::error!("could not commit transaction {transaction_id}: {error}");
        return Error::from(error).into_alert_response();
    }

    drop(connection);
    state.events.publish();

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        transaction_updated_header(),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
