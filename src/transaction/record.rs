//! Transactions before and after the database has stored them.
//!
//! A transaction form carries a client ID that is minted when the form is
//! rendered. Until the row has been written the transaction only exists as a
//! [PendingTransaction]; once stored it is replaced by the confirmed
//! [Transaction] that carries the database ID.

use time::Date;
use uuid::Uuid;

use crate::{
    Error,
    transaction::{Transaction, TransactionType},
};

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub client_id: Uuid,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub date: Date,
    pub type_: TransactionType,
}

impl PendingTransaction {
    /// Build a pending transaction, trimming the text fields.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeAmount] if `amount` is negative or not a finite number.
    pub fn new(
        client_id: Uuid,
        description: &str,
        category: &str,
        amount: f64,
        date: Date,
        type_: TransactionType,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::NegativeAmount(amount));
        }

        Ok(Self {
            client_id,
            description: description.trim().to_owned(),
            category: category.trim().to_owned(),
            amount,
            date,
            type_,
        })
    }
}

/// A transaction in either of its two states.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRecord {
    /// Submitted but not yet assigned a database ID.
    Pending(PendingTransaction),
    /// Stored in the database.
    Confirmed(Transaction),
}

impl TransactionRecord {
    pub fn client_id(&self) -> Uuid {
        match self {
            TransactionRecord::Pending(pending) => pending.client_id,
            TransactionRecord::Confirmed(transaction) => transaction.client_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionRecord::Pending(_))
    }

    /// Replace this record with the stored row `stored`.
    ///
    /// # Errors
    ///
    /// Returns [Error::ReconcileMismatch] if `stored` has a different client ID,
    /// in which case the record is returned to the caller unchanged.
    pub fn reconcile(self, stored: Transaction) -> Result<TransactionRecord, (Self, Error)> {
        if self.client_id() != stored.client_id {
            return Err((self, Error::ReconcileMismatch));
        }

        Ok(TransactionRecord::Confirmed(stored))
    }
}

#[cfg(test)]
mod record_tests {
    use time::{OffsetDateTime, macros::date};
    use uuid::Uuid;

    use crate::{
        Error,
        auth::UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::{PendingTransaction, TransactionRecord};

    fn pending() -> PendingTransaction {
        PendingTransaction::new(
            Uuid::new_v4(),
            "  Lunch ",
            " Eating out",
            15.0,
            date!(2025 - 03 - 14),
            TransactionType::Expense,
        )
        .unwrap()
    }

    fn stored_from(pending: &PendingTransaction, client_id: Uuid) -> Transaction {
        let now = OffsetDateTime::now_utc();

        Transaction {
            id: 7,
            client_id,
            user_id: UserID::new(1),
            description: pending.description.clone(),
            category: pending.category.clone(),
            amount: pending.amount,
            date: pending.date,
            type_: pending.type_,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_trims_text() {
        let pending = pending();

        assert_eq!(pending.description, "Lunch");
        assert_eq!(pending.category, "Eating out");
    }

    #[test]
    fn new_rejects_negative_amount() {
        let result = PendingTransaction::new(
            Uuid::new_v4(),
            "Refund",
            "Other",
            -5.0,
            date!(2025 - 03 - 14),
            TransactionType::Income,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-5.0)));
    }

    #[test]
    fn new_rejects_non_finite_amount() {
        let result = PendingTransaction::new(
            Uuid::new_v4(),
            "Bad",
            "Other",
            f64::INFINITY,
            date!(2025 - 03 - 14),
            TransactionType::Income,
        );

        assert!(result.is_err());
    }

    #[test]
    fn zero_amount_is_allowed() {
        let result = PendingTransaction::new(
            Uuid::new_v4(),
            "Free sample",
            "Other",
            0.0,
            date!(2025 - 03 - 14),
            TransactionType::Expense,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn reconcile_confirms_matching_row() {
        let pending = pending();
        let stored = stored_from(&pending, pending.client_id);
        let record = TransactionRecord::Pending(pending);
        assert!(record.is_pending());

        let record = record.reconcile(stored.clone()).unwrap();

        assert_eq!(record, TransactionRecord::Confirmed(stored));
        assert!(!record.is_pending());
    }

    #[test]
    fn reconcile_rejects_other_row() {
        let pending = pending();
        let stored = stored_from(&pending, Uuid::new_v4());
        let record = TransactionRecord::Pending(pending.clone());

        let (record, error) = record.reconcile(stored).unwrap_err();

        assert_eq!(error, Error::ReconcileMismatch);
        assert_eq!(record, TransactionRecord::Pending(pending));
    }
}
