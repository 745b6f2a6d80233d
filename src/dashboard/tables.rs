//! The table of recent transactions on the dashboard.

use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        description_cell, format_currency,
    },
    transaction::{Transaction, TransactionType},
};

/// How many transactions the recent transactions table shows.
pub(super) const RECENT_TRANSACTION_COUNT: usize = 5;

/// Renders the [RECENT_TRANSACTION_COUNT] most recent of `transactions`.
///
/// `transactions` must be sorted newest first.
pub(super) fn recent_transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        section id="recent-transactions" class="w-full mb-4"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Recent transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions.iter().take(RECENT_TRANSACTION_COUNT) {
                            tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                (description_cell(&transaction.description))
                                td class=(TABLE_CELL_STYLE)
                                {
                                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
                                }
                                td class={ (TABLE_CELL_STYLE) " text-right " (amount_style(transaction.type_)) }
                                {
                                    (amount_sign(transaction.type_)) (format_currency(transaction.amount))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn amount_style(type_: TransactionType) -> &'static str {
    match type_ {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
    }
}

fn amount_sign(type_: TransactionType) -> &'static str {
    match type_ {
        TransactionType::Income => "+",
        TransactionType::Expense => "-",
    }
}
