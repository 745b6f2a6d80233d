use rusqlite::Connection;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    auth::{PasswordHash, UserID, create_user},
    category::ensure_category,
    db::initialize,
    transaction::{PendingTransaction, Transaction, TransactionType, create_transaction},
};

/// An initialized in-memory database with one user.
pub(crate) fn get_test_connection_with_user() -> (Connection, UserID) {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();
    let user = create_user(
        "test@example.com",
        PasswordHash::new_unchecked("hunter2"),
        &connection,
    )
    .unwrap();

    (connection, user.id)
}

/// Store a transaction for `user_id` and remember its category.
#[track_caller]
pub(crate) fn insert_transaction(
    user_id: UserID,
    description: &str,
    category: &str,
    amount: f64,
    date: Date,
    type_: TransactionType,
    connection: &Connection,
) -> Transaction {
    let pending =
        PendingTransaction::new(Uuid::new_v4(), description, category, amount, date, type_)
            .unwrap();
    let transaction =
        create_transaction(user_id, &pending, OffsetDateTime::now_utc(), connection).unwrap();
    ensure_category(user_id, category, type_, connection).unwrap();

    transaction
}
