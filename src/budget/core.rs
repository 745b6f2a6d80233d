//! The budget model and the database functions that store it.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, period::PeriodKind};

/// The database identifier of a budget.
pub type BudgetId = i64;

/// Whether a budget still governs spending.
///
/// Clearing a budget keeps the row so its amount and dates can still be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetStatus {
    #[default]
    Active,
    Cleared,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetStatus::Active => "active",
            BudgetStatus::Cleared => "cleared",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetStatus::Active => "Active",
            BudgetStatus::Cleared => "Cleared",
        }
    }
}

impl ToSql for BudgetStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "active" => Ok(BudgetStatus::Active),
            "cleared" => Ok(BudgetStatus::Cleared),
            other => Err(FromSqlError::Other(
                format!("invalid budget status {other:?}").into(),
            )),
        }
    }
}

/// A spending limit over a period of time.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The spending limit, always greater than zero.
    pub amount: f64,
    pub period: PeriodKind,
    pub start_date: Date,
    /// The last day covered by the budget, always after `start_date`.
    pub end_date: Date,
    pub status: BudgetStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Budget {
    pub fn is_active(&self) -> bool {
        self.status == BudgetStatus::Active
    }
}

/// The values for a new budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetInput {
    pub amount: f64,
    pub period: PeriodKind,
    pub start_date: Date,
    pub end_date: Date,
}

/// A partial update for a budget, `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub amount: Option<f64>,
    pub period: Option<PeriodKind>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

fn validate(amount: f64, start_date: Date, end_date: Date) -> Result<(), Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidBudgetAmount(amount));
    }

    if end_date <= start_date {
        return Err(Error::InvalidBudgetPeriod);
    }

    Ok(())
}

const BUDGET_COLUMNS: &str =
    "id, user_id, amount, period, start_date, end_date, status, created_at, updated_at";

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                period TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (end_date > start_date),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_user_end_date ON budget(user_id, end_date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Budget.
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        period: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Store a new active budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBudgetAmount] if the amount is not greater than zero,
/// - [Error::InvalidBudgetPeriod] if the end date is not after the start date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    input: &BudgetInput,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    validate(input.amount, input.start_date, input.end_date)?;

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget
            (user_id, amount, period, start_date, end_date, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                input.amount,
                input.period,
                input.start_date,
                input.end_date,
                BudgetStatus::Active,
                now,
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve a budget of `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)?;

    Ok(budget)
}

/// The budgets of `user_id` that have not ended before `today`, newest first.
///
/// Cleared budgets are included.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn fetch_active(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
            WHERE user_id = :user_id AND end_date >= :today
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(
            rusqlite::named_params! { ":user_id": user_id.as_i64(), ":today": today },
            map_budget_row,
        )?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// The budget that governs spending: the most recently created active one.
///
/// `budgets` must be in the order returned by [fetch_active].
pub fn current_budget(budgets: &[Budget]) -> Option<&Budget> {
    budgets.iter().find(|budget| budget.is_active())
}

/// Apply `update` to budget `id` of `user_id` and refresh its update time.
///
/// The merged values are validated again and the budget becomes active, so
/// saving a cleared budget brings it back.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - [Error::InvalidBudgetAmount] or [Error::InvalidBudgetPeriod] if the merged values are invalid,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    user_id: UserID,
    id: BudgetId,
    update: &BudgetUpdate,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    let stored = get_budget(user_id, id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingBudget,
        error => error,
    })?;

    let amount = update.amount.unwrap_or(stored.amount);
    let period = update.period.unwrap_or(stored.period);
    let start_date = update.start_date.unwrap_or(stored.start_date);
    let end_date = update.end_date.unwrap_or(stored.end_date);
    validate(amount, start_date, end_date)?;

    connection
        .prepare(&format!(
            "UPDATE budget
            SET amount = ?1, period = ?2, start_date = ?3, end_date = ?4, status = ?5, updated_at = ?6
            WHERE id = ?7 AND user_id = ?8
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                amount,
                period,
                start_date,
                end_date,
                BudgetStatus::Active,
                now,
                id,
                user_id.as_i64(),
            ),
            map_budget_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingBudget,
            error => error.into(),
        })
}

/// Mark budget `id` of `user_id` as cleared.
///
/// The amount and date range are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn soft_delete_budget(
    user_id: UserID,
    id: BudgetId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "UPDATE budget SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND user_id = ?4
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (BudgetStatus::Cleared, now, id, user_id.as_i64()),
            map_budget_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::DeleteMissingBudget,
            error => error.into(),
        })
}
