//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{ensure_category, get_category_names},
    endpoints,
    events::{TransactionEvents, transaction_updated_header},
    transaction::{
        TransactionRecord,
        core::create_transaction,
        form::{FormMethod, TransactionForm, TransactionFormValues, transaction_form},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The channel used to tell open views that transactions changed.
    pub events: TransactionEvents,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// Invalid input is answered with the form and inline error messages.
/// Submitting the same form twice stores a single transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
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

            return transaction_form(
                FormMethod::Post(endpoints::TRANSACTIONS_API),
                "Create Transaction",
                &TransactionFormValues::from_form(&form),
                &errors,
                &categories,
            )
            .into_response();
        }
    };

    let sql_transaction =
        match SqlTransaction::new_unchecked(&connection, TransactionBehavior::Immediate) {
            Ok(sql_transaction) => sql_transaction,
            Err(error) => {
                tracing::error!("could not start SQL transaction: {error}");
                return Error::from(error).into_alert_response();
            }
        };

    let stored = match create_transaction(
        user_id,
        &pending,
        OffsetDateTime::now_utc(),
        &sql_transaction,
    ) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) = ensure_category(user_id, &stored.category, stored.type_, &sql_transaction)
    {
        tracing::error!("could not save category {:?}: {error}", stored.category);
        return error.into_alert_response();
    }

    if let Err(error) = sql_transaction.commit() {
        tracing::error!("could not commit new transaction: {error}");
        return Error::from(error).into_alert_response();
    }

    drop(connection);

    let stored_id = stored.id;
    match TransactionRecord::Pending(pending).reconcile(stored) {
        Ok(record) => {
            tracing::info!(
                "created transaction {stored_id} for client ID {}",
                record.client_id()
            );
        }
        Err((record, error)) => {
            tracing::error!(
                "stored transaction does not match client ID {}: {error}",
                record.client_id()
            );
            return error.into_alert_response();
        }
    }

    state.events.publish();

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        transaction_updated_header(),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod create_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, body::Body, extract::State, http::Response, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;
    use uuid::Uuid;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        category::get_category_names,
        db::initialize,
        endpoints,
        events::TransactionEvents,
        test_utils::{assert_hx_redirect, get_header, parse_html_fragment},
        transaction::{TransactionType, core::get_transactions_for_user, form::TransactionForm},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_state() -> (CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@test.com", PasswordHash::new_unchecked("x"), &conn).unwrap();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            events: TransactionEvents::new(),
        };

        (state, user.id)
    }

    fn form(client_id: Uuid, description: &str, amount: Option<f64>) -> TransactionForm {
        TransactionForm {
            client_id,
            description: description.to_owned(),
            category: "Groceries".to_owned(),
            amount,
            date: date!(2025 - 04 - 12),
            type_: TransactionType::Expense,
        }
    }

    async fn post(
        state: &CreateTransactionState,
        user_id: UserID,
        form: TransactionForm,
    ) -> Response<Body> {
        create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form)).await
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_state();
        let mut receiver = state.events.subscribe();

        let response = post(&state, user_id, form(Uuid::new_v4(), "Milk", Some(3.2))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        assert_eq!(get_header(&response, "hx-trigger"), "transactionUpdated");
        assert!(receiver.try_recv().is_ok(), "want a published update");

        let connection = state.db_connection.lock().unwrap();
        let transactions = get_transactions_for_user(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Milk");
        assert_eq!(transactions[0].user_id, user_id);
        assert_eq!(
            get_category_names(user_id, &connection).unwrap(),
            ["Groceries"]
        );
    }

    #[tokio::test]
    async fn resubmitting_form_stores_one_transaction() {
        let (state, user_id) = get_state();
        let client_id = Uuid::new_v4();

        post(&state, user_id, form(client_id, "Milk", Some(3.2))).await;
        let response = post(&state, user_id, form(client_id, "Milk", Some(3.2))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transactions_for_user(user_id, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_form_is_returned_with_errors() {
        let (state, user_id) = get_state();
        let mut receiver = state.events.subscribe();

        let response = post(&state, user_id, form(Uuid::new_v4(), "", Some(-2.0))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let messages = html
            .select(&scraper::Selector::parse("p.text-red-500").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            ["Description is required", "Amount must be zero or greater"]
        );
        assert!(receiver.try_recv().is_err(), "want no published update");

        let connection = state.db_connection.lock().unwrap();
        assert!(get_transactions_for_user(user_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_category_save_stores_nothing() {
        let (state, user_id) = get_state();
        let mut receiver = state.events.subscribe();
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE category", ())
            .unwrap();

        let response = post(&state, user_id, form(Uuid::new_v4(), "Milk", Some(3.2))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(receiver.try_recv().is_err(), "want no published update");
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transactions_for_user(user_id, &connection).unwrap().is_empty());
    }
}
