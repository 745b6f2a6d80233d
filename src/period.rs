//! Date arithmetic for budget periods.
//!
//! A budget covers a window that starts on a chosen date and ends one week,
//! one calendar month or one calendar year later.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// How long a budget runs before it needs to be renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// A seven day window.
    Weekly,
    /// One calendar month.
    #[default]
    Monthly,
    /// One calendar year.
    Yearly,
}

impl PeriodKind {
    /// All period kinds in display order.
    pub const ALL: [PeriodKind; 3] = [PeriodKind::Weekly, PeriodKind::Monthly, PeriodKind::Yearly];

    /// The value used in forms, query strings and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Weekly => "weekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Yearly => "yearly",
        }
    }

    /// A human readable label, e.g. "Monthly".
    pub fn label(self) -> &'static str {
        match self {
            PeriodKind::Weekly => "Weekly",
            PeriodKind::Monthly => "Monthly",
            PeriodKind::Yearly => "Yearly",
        }
    }
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for PeriodKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PeriodKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "weekly" => Ok(PeriodKind::Weekly),
            "monthly" => Ok(PeriodKind::Monthly),
            "yearly" => Ok(PeriodKind::Yearly),
            other => Err(FromSqlError::Other(
                format!("invalid period kind {other:?}").into(),
            )),
        }
    }
}

/// Compute the end date of a period of `kind` that starts on `start`.
///
/// Monthly and yearly periods keep the day of the month. When the target
/// month is shorter than that day, the end date is clamped to the last day
/// of the target month, e.g. 2024-01-31 + one month = 2024-02-29.
pub fn resolve_end(kind: PeriodKind, start: Date) -> Date {
    match kind {
        PeriodKind::Weekly => start.saturating_add(Duration::days(7)),
        PeriodKind::Monthly => {
            let (year, month) = if start.month() == Month::December {
                (start.year() + 1, Month::January)
            } else {
                (start.year(), start.month().next())
            };

            clamped_date(year, month, start.day())
        }
        PeriodKind::Yearly => clamped_date(start.year() + 1, start.month(), start.day()),
    }
}

/// The first day of the month that `today` falls in.
///
/// New budgets are anchored here unless the user picks another start date.
pub fn default_start(today: Date) -> Date {
    today.replace_day(1).unwrap_or(today)
}

/// The default start and end dates for a new budget of `kind`.
pub fn default_dates(kind: PeriodKind, today: Date) -> (Date, Date) {
    let start = default_start(today);

    (start, resolve_end(kind, start))
}

fn clamped_date(year: i32, month: Month, day: u8) -> Date {
    (1..=day)
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
        .unwrap_or(Date::MAX)
}
