//! Filtering, sorting and paging of a user's transactions.
//!
//! The transactions page loads every transaction of the user and runs them
//! through [apply] on each request. The view state lives in the URL as a
//! [ListQuery], so sort toggles, filters and page links are plain links.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::transaction::{Transaction, TransactionType};

/// The number of transactions shown on each page of the transactions list.
pub const PAGE_SIZE: u64 = 10;

/// Which transaction types to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub const ALL: [TypeFilter; 3] = [TypeFilter::All, TypeFilter::Income, TypeFilter::Expense];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Income => "income",
            TypeFilter::Expense => "expense",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TypeFilter::All => "All types",
            TypeFilter::Income => "Income",
            TypeFilter::Expense => "Expenses",
        }
    }

    fn matches(self, type_: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => type_ == TransactionType::Income,
            TypeFilter::Expense => type_ == TransactionType::Expense,
        }
    }
}

/// The column the list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// What part of the transaction list to show and in which order.
///
/// Every change to a filter or to the sort order moves the list back to the
/// first page. Only [ListSpec::with_page] changes the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    search: String,
    type_filter: TypeFilter,
    category: Option<String>,
    start_date: Option<Date>,
    end_date: Option<Date>,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    sort_key: SortKey,
    sort_direction: SortDirection,
    page: u64,
    page_size: u64,
}

impl Default for ListSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            type_filter: TypeFilter::All,
            category: None,
            start_date: None,
            end_date: None,
            min_amount: None,
            max_amount: None,
            sort_key: SortKey::Date,
            sort_direction: SortDirection::Desc,
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

impl ListSpec {
    /// Rebuild the list state from the query parameters of a request.
    pub fn from_query(query: &ListQuery) -> Self {
        let mut spec = ListSpec::default()
            .with_search(query.search.as_deref().unwrap_or_default())
            .with_type_filter(query.type_.unwrap_or_default())
            .with_category(query.category.clone())
            .with_date_range(query.start_date, query.end_date)
            .with_amount_range(query.min_amount, query.max_amount);

        spec.sort_key = query.sort.unwrap_or_default();
        spec.sort_direction = query.direction.unwrap_or_default();

        spec.with_page(query.page.unwrap_or(1))
    }

    /// The query parameters that describe this list state.
    ///
    /// Parameters that hold their default value are left out.
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            type_: (self.type_filter != TypeFilter::All).then_some(self.type_filter),
            category: self.category.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            sort: (self.sort_key != SortKey::default()).then_some(self.sort_key),
            direction: (self.sort_direction != SortDirection::default())
                .then_some(self.sort_direction),
            page: (self.page != 1).then_some(self.page),
        }
    }

    /// `base` with this list state appended as a query string.
    pub fn url(&self, base: &str) -> String {
        match serde_urlencoded::to_string(self.to_query()) {
            Ok(query_string) if !query_string.is_empty() => format!("{base}?{query_string}"),
            Ok(_) => base.to_owned(),
            Err(error) => {
                tracing::error!("could not encode list query: {error}");
                base.to_owned()
            }
        }
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.trim().to_owned();
        self.page = 1;
        self
    }

    pub fn with_type_filter(mut self, type_filter: TypeFilter) -> Self {
        self.type_filter = type_filter;
        self.page = 1;
        self
    }

    /// Only include transactions with this category. Blank names clear the filter.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty());
        self.page = 1;
        self
    }

    /// Only include transactions dated within `[start, end]`.
    pub fn with_date_range(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self.page = 1;
        self
    }

    /// Only include transactions with an amount within `[min, max]`.
    pub fn with_amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self.page = 1;
        self
    }

    /// Sort by `key`, flipping the direction if the list is already sorted by `key`.
    ///
    /// A newly selected key starts in ascending order.
    pub fn toggle_sort(mut self, key: SortKey) -> Self {
        if self.sort_key == key {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_key = key;
            self.sort_direction = SortDirection::Asc;
        }
        self.page = 1;
        self
    }

    /// Go to the 1-indexed `page`. Page zero is treated as the first page.
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// Show `page_size` transactions per page, keeping the current page.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn type_filter(&self) -> TypeFilter {
        self.type_filter
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn start_date(&self) -> Option<Date> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<Date> {
        self.end_date
    }

    pub fn min_amount(&self) -> Option<f64> {
        self.min_amount
    }

    pub fn max_amount(&self) -> Option<f64> {
        self.max_amount
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Whether any filter other than the defaults is active.
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty()
            || self.type_filter != TypeFilter::All
            || self.category.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.min_amount.is_some()
            || self.max_amount.is_some()
    }

    fn matches(&self, transaction: &Transaction) -> bool {
        let matches_search = self.search.is_empty()
            || transaction
                .description
                .to_lowercase()
                .contains(&self.search.to_lowercase());

        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| transaction.category.to_lowercase() == category.to_lowercase());

        matches_search
            && self.type_filter.matches(transaction.type_)
            && matches_category
            && self.start_date.is_none_or(|start| transaction.date >= start)
            && self.end_date.is_none_or(|end| transaction.date <= end)
            && self.min_amount.is_none_or(|min| transaction.amount >= min)
            && self.max_amount.is_none_or(|max| transaction.amount <= max)
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.sort_key {
            SortKey::Date => a
                .date
                .cmp(&b.date)
                .then_with(|| a.amount.total_cmp(&b.amount)),
            SortKey::Amount => a
                .amount
                .total_cmp(&b.amount)
                .then_with(|| a.date.cmp(&b.date)),
        }
        .then_with(|| a.client_id.cmp(&b.client_id));

        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

mod optional_date {
    //! Serializes an optional [Date] as `YYYY-MM-DD`, the format of HTML date inputs.

    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    const DATE_FORMAT: &[BorrowedFormatItem] =
        format_description!("[year]-[month repr:numerical padding:zero]-[day padding:zero]");

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => {
                let date_string = date.format(DATE_FORMAT).map_err(ser::Error::custom)?;
                serializer.serialize_str(&date_string)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(date_string) => Date::parse(date_string, DATE_FORMAT)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}

/// The list state as URL query parameters.
///
/// Use `axum_extra`'s `Query` to extract this so that empty inputs from the
/// filter form are read as `None`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

/// Totals over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// Add up the income and expenses in `transactions`.
pub fn summarize<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Summary {
    let (total_income, total_expenses) =
        transactions
            .into_iter()
            .fold((0.0, 0.0), |(income, expenses), transaction| {
                match transaction.type_ {
                    TransactionType::Income => (income + transaction.amount, expenses),
                    TransactionType::Expense => (income, expenses + transaction.amount),
                }
            });

    Summary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
    }
}

/// One page of the filtered and sorted transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub items: Vec<Transaction>,
    /// The number of transactions that passed the filters, across all pages.
    pub total_count: usize,
    /// Totals over every transaction that passed the filters.
    pub summary: Summary,
    page_size: u64,
}

impl PageResult {
    /// The number of pages needed to show every filtered transaction.
    pub fn page_count(&self) -> u64 {
        (self.total_count as u64).div_ceil(self.page_size.max(1))
    }
}

/// Filter, sort and slice `transactions` as described by `spec`.
pub fn apply(transactions: &[Transaction], spec: &ListSpec) -> PageResult {
    let mut filtered: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| spec.matches(transaction))
        .collect();
    filtered.sort_by(|a, b| spec.compare(a, b));

    let total_count = filtered.len();
    let summary = summarize(filtered.iter().copied());
    let offset = (spec.page - 1).saturating_mul(spec.page_size);
    let items = filtered
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(spec.page_size).unwrap_or(usize::MAX))
        .cloned()
        .collect();

    PageResult {
        items,
        total_count,
        summary,
        page_size: spec.page_size,
    }
}
