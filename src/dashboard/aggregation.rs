//! Transaction data aggregation for the dashboard cards and charts.
//!
//! Provides functions to total transactions, compare months, break expenses
//! down by category and summarise the last twelve months.

use std::{collections::HashMap, ops::RangeInclusive};

use serde::Deserialize;
use time::{Date, Duration, Month};

use crate::transaction::{Transaction, TransactionType};

/// The number of months shown in the monthly overview, including the current month.
pub(super) const OVERVIEW_MONTHS: usize = 12;

/// The time span used for the expense breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl BreakdownPeriod {
    pub(super) const ALL: [BreakdownPeriod; 4] = [
        BreakdownPeriod::Day,
        BreakdownPeriod::Week,
        BreakdownPeriod::Month,
        BreakdownPeriod::Year,
    ];

    pub(super) fn as_str(self) -> &'static str {
        match self {
            BreakdownPeriod::Day => "day",
            BreakdownPeriod::Week => "week",
            BreakdownPeriod::Month => "month",
            BreakdownPeriod::Year => "year",
        }
    }

    pub(super) fn label(self) -> &'static str {
        match self {
            BreakdownPeriod::Day => "Today",
            BreakdownPeriod::Week => "This week",
            BreakdownPeriod::Month => "This month",
            BreakdownPeriod::Year => "This year",
        }
    }

    /// The dates covered by the period, ending `today`.
    ///
    /// Weeks start on Monday.
    pub(super) fn range(self, today: Date) -> RangeInclusive<Date> {
        let start = match self {
            BreakdownPeriod::Day => today,
            BreakdownPeriod::Week => {
                today - Duration::days(today.weekday().number_days_from_monday().into())
            }
            BreakdownPeriod::Month => month_start(today),
            BreakdownPeriod::Year => {
                Date::from_calendar_date(today.year(), Month::January, 1).unwrap_or(today)
            }
        };

        start..=today
    }
}

/// The first day of the month that `date` falls in.
pub(super) fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// The first day of the month before the month that `date` falls in.
pub(super) fn previous_month_start(date: Date) -> Date {
    let start = month_start(date);

    month_start(start - Duration::days(1))
}

/// Income minus expenses over all of `transactions`.
pub(super) fn total_balance(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::signed_amount).sum()
}

/// The income and expenses of a single month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct MonthTotals {
    pub income: f64,
    pub expenses: f64,
}

/// Total the transactions dated in the month starting on `month`.
pub(super) fn month_totals(transactions: &[Transaction], month: Date) -> MonthTotals {
    transactions
        .iter()
        .filter(|transaction| month_start(transaction.date) == month)
        .fold(MonthTotals::default(), |mut totals, transaction| {
            match transaction.type_ {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expenses += transaction.amount,
            }
            totals
        })
}

/// The change from `previous` to `current` in percent.
///
/// Returns `None` when `previous` is zero since there is nothing to compare against.
pub(super) fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }

    Some((current - previous) / previous * 100.0)
}

/// A category's part of the expenses in a period.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryShare {
    pub category: String,
    pub amount: f64,
    /// The percentage of all expenses in the period.
    pub share: f64,
}

/// Break down the expenses dated within `range` by category, largest first.
pub(super) fn expenses_by_category(
    transactions: &[Transaction],
    range: &RangeInclusive<Date>,
) -> Vec<CategoryShare> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions.iter().filter(|transaction| {
        transaction.type_ == TransactionType::Expense && range.contains(&transaction.date)
    }) {
        *totals.entry(transaction.category.as_str()).or_insert(0.0) += transaction.amount;
    }

    let total: f64 = totals.values().sum();

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category: category.to_owned(),
            amount,
            share: if total > 0.0 {
                amount / total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    shares
}

/// Income and expenses per month, oldest month first.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlyOverview {
    pub labels: Vec<String>,
    pub income: Vec<f64>,
    pub expenses: Vec<f64>,
}

/// Summarise the last [OVERVIEW_MONTHS] months up to and including the month of `today`.
///
/// Months without transactions are included with zero totals.
pub(super) fn monthly_overview(transactions: &[Transaction], today: Date) -> MonthlyOverview {
    let mut months = Vec::with_capacity(OVERVIEW_MONTHS);
    let mut month = month_start(today);

    for _ in 0..OVERVIEW_MONTHS {
        months.push(month);
        month = previous_month_start(month);
    }

    months.reverse();

    let totals: Vec<MonthTotals> = months
        .iter()
        .map(|&month| month_totals(transactions, month))
        .collect();

    MonthlyOverview {
        labels: format_month_labels(&months),
        income: totals.iter().map(|totals| totals.income).collect(),
        expenses: totals.iter().map(|totals| totals.expenses).collect(),
    }
}

/// Formats month dates as a three-letter abbreviation and the year, e.g. "Jan 2025".
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    let month_to_str = |date: &Date| {
        let month = match date.month() {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        };

        format!("{month} {}", date.year())
    };

    months.iter().map(month_to_str).collect()
}
