//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the database functions that store it
//! - The client-side record of a submitted transaction and its reconciliation
//! - Filtering, sorting and paging for the transactions list
//! - View and endpoint handlers for the transaction pages

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod pipeline;
mod record;
mod transactions_page;

pub use core::{
    Transaction, TransactionChanges, TransactionId, TransactionType, create_transaction,
    create_transaction_table, get_transactions_for_user,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use record::{PendingTransaction, TransactionRecord};
pub use transactions_page::get_transactions_page;
