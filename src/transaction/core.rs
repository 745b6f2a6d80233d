//! The transaction model and the database functions that store it.

use std::fmt::Display;

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, auth::UserID, transaction::PendingTransaction};

// ============================================================================
// MODELS
// ============================================================================

/// The database identifier of a transaction.
pub type TransactionId = i64;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    /// The value used in forms, query strings and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction type {other:?}").into(),
            )),
        }
    }
}

/// A stored income or expense.
///
/// `amount` is always a magnitude, the direction is given by `type_`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID assigned by the database.
    pub id: TransactionId,
    /// The ID minted when the form for this transaction was rendered.
    pub client_id: Uuid,
    /// The user that owns the transaction.
    pub user_id: UserID,
    pub description: String,
    /// A free text label, e.g. "Groceries".
    pub category: String,
    pub amount: f64,
    /// The date when the transaction happened.
    pub date: Date,
    pub type_: TransactionType,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// The amount with its sign applied, negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.type_ {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// The new values for an edited transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionChanges {
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub date: Date,
    pub type_: TransactionType,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, client_id, user_id, description, category, amount, date, type, created_at, updated_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id TEXT NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let client_id: String = row.get(1)?;
    let client_id = Uuid::parse_str(&client_id)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        client_id,
        user_id: UserID::new(row.get(2)?),
        description: row.get(3)?,
        category: row.get(4)?,
        amount: row.get(5)?,
        date: row.get(6)?,
        type_: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Store `pending` as a transaction owned by `user_id`.
///
/// Submitting the same pending transaction twice stores it once: the second
/// call returns the row created by the first.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the client ID is already used by another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    pending: &PendingTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let inserted = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
            (client_id, user_id, description, category, amount, date, type, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(client_id) DO NOTHING
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                pending.client_id.to_string(),
                user_id.as_i64(),
                &pending.description,
                &pending.category,
                pending.amount,
                pending.date,
                pending.type_,
                now,
            ),
            map_transaction_row,
        )
        .optional()?;

    match inserted {
        Some(transaction) => Ok(transaction),
        None => {
            tracing::debug!(
                "transaction {} already stored, returning the existing row",
                pending.client_id
            );
            get_transaction_by_client_id(user_id, pending.client_id, connection)
        }
    }
}

/// Retrieve a transaction of `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

fn get_transaction_by_client_id(
    user_id: UserID,
    client_id: Uuid,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE client_id = ?1 AND user_id = ?2"
        ))?
        .query_row((client_id.to_string(), user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Get all transactions of `user_id`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = :user_id
            ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Overwrite the editable fields of transaction `id` and refresh its update time.
///
/// The ID, client ID, owner and creation time are left unchanged.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    changes: &TransactionChanges,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
            SET description = ?1, category = ?2, amount = ?3, date = ?4, type = ?5, updated_at = ?6
            WHERE id = ?7 AND user_id = ?8
            RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                &changes.description,
                &changes.category,
                changes.amount,
                changes.date,
                changes.type_,
                now,
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Delete transaction `id` of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};
    use uuid::Uuid;

    use crate::{
        Error,
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        transaction::{PendingTransaction, TransactionType},
    };

    use super::{
        TransactionChanges, create_transaction, delete_transaction, get_transaction,
        get_transactions_for_user, update_transaction,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@test.com", PasswordHash::new_unchecked("hunter2"), &conn)
            .unwrap();
        (conn, user.id)
    }

    fn pending(amount: f64) -> PendingTransaction {
        PendingTransaction::new(
            Uuid::new_v4(),
            "Coffee",
            "Eating out",
            amount,
            date!(2025 - 10 - 05),
            TransactionType::Expense,
        )
        .unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (conn, user_id) = get_test_connection();
        let pending = pending(12.3);

        let transaction =
            create_transaction(user_id, &pending, OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.client_id, pending.client_id);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.category, "Eating out");
        assert_eq!(transaction.created_at, transaction.updated_at);
    }

    #[test]
    fn create_is_idempotent_on_client_id() {
        let (conn, user_id) = get_test_connection();
        let pending = pending(4.5);
        let now = OffsetDateTime::now_utc();

        let first = create_transaction(user_id, &pending, now, &conn).unwrap();
        let second = create_transaction(user_id, &pending, now, &conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_transactions_for_user(user_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn get_is_scoped_to_owner() {
        let (conn, user_id) = get_test_connection();
        let other = create_user("other@test.com", PasswordHash::new_unchecked("x"), &conn)
            .unwrap();
        let transaction =
            create_transaction(user_id, &pending(1.0), OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(
            get_transaction(other.id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(get_transaction(user_id, transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn list_is_newest_first() {
        let (conn, user_id) = get_test_connection();
        let now = OffsetDateTime::now_utc();
        let mut older = pending(1.0);
        older.date = date!(2025 - 01 - 01);
        let newer = pending(2.0);
        create_transaction(user_id, &older, now, &conn).unwrap();
        create_transaction(user_id, &newer, now, &conn).unwrap();

        let dates = get_transactions_for_user(user_id, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.date)
            .collect::<Vec<_>>();

        assert_eq!(dates, [date!(2025 - 10 - 05), date!(2025 - 01 - 01)]);
    }

    #[test]
    fn update_preserves_identity() {
        let (conn, user_id) = get_test_connection();
        let created_at = OffsetDateTime::now_utc() - time::Duration::days(1);
        let transaction = create_transaction(user_id, &pending(1.0), created_at, &conn).unwrap();
        let changes = TransactionChanges {
            description: "Salary".to_owned(),
            category: "Work".to_owned(),
            amount: 1000.0,
            date: date!(2025 - 10 - 01),
            type_: TransactionType::Income,
        };

        let updated = update_transaction(
            user_id,
            transaction.id,
            &changes,
            OffsetDateTime::now_utc(),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.client_id, transaction.client_id);
        assert_eq!(updated.created_at, transaction.created_at);
        assert!(updated.updated_at > transaction.updated_at);
        assert_eq!(updated.type_, TransactionType::Income);
        assert_eq!(updated.amount, 1000.0);
    }

    #[test]
    fn update_fails_for_other_user() {
        let (conn, user_id) = get_test_connection();
        let other = create_user("other@test.com", PasswordHash::new_unchecked("x"), &conn)
            .unwrap();
        let now = OffsetDateTime::now_utc();
        let transaction = create_transaction(user_id, &pending(1.0), now, &conn).unwrap();
        let changes = TransactionChanges {
            description: "Stolen".to_owned(),
            category: "Other".to_owned(),
            amount: 1.0,
            date: transaction.date,
            type_: TransactionType::Expense,
        };

        let result = update_transaction(other.id, transaction.id, &changes, now, &conn);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_row() {
        let (conn, user_id) = get_test_connection();
        let transaction =
            create_transaction(user_id, &pending(1.0), OffsetDateTime::now_utc(), &conn).unwrap();

        delete_transaction(user_id, transaction.id, &conn).unwrap();

        assert_eq!(
            get_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_transaction(user_id, transaction.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }
}
