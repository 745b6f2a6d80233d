use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    events::{TransactionEvents, transaction_updated_header},
    transaction::{TransactionId, core::delete_transaction},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
    events: TransactionEvents,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            events: state.events.clone(),
        }
    }
}

/// A route handler for deleting a transaction, responds with an alert.
///
/// The response fires `transactionUpdated` so the open list reloads without the row.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => delete_transaction(user_id, transaction_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match result {
        Ok(()) => {
            state.events.publish();

            (
                transaction_updated_header(),
                Alert::SuccessSimple {
                    message: "Transaction deleted".to_owned(),
                },
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};
    use uuid::Uuid;

    use crate::{
        Error,
        auth::{PasswordHash, create_user},
        db::initialize,
        events::TransactionEvents,
        test_utils::get_header,
        transaction::{
            PendingTransaction, TransactionType,
            core::{create_transaction, get_transaction},
        },
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    #[tokio::test]
    async fn deletes_transaction_and_publishes_update() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@test.com", PasswordHash::new_unchecked("x"), &conn).unwrap();
        let pending = PendingTransaction::new(
            Uuid::new_v4(),
            "Test",
            "Other",
            1.23,
            date!(2025 - 10 - 26),
            TransactionType::Expense,
        )
        .unwrap();
        let transaction =
            create_transaction(user.id, &pending, OffsetDateTime::now_utc(), &conn).unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            events: TransactionEvents::new(),
        };
        let mut receiver = state.events.subscribe();

        let response = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(transaction.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "hx-trigger"), "transactionUpdated");
        assert!(receiver.try_recv().is_ok());
        assert_eq!(
            get_transaction(user.id, transaction.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn deleting_missing_transaction_is_not_found() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@test.com", PasswordHash::new_unchecked("x"), &conn).unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            events: TransactionEvents::new(),
        };

        let response =
            delete_transaction_endpoint(State(state), Extension(user.id), Path(42)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
