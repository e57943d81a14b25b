//! Write operations for savings accounts and savings transactions.

pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::ledger::domain::accounts::ReportTag;
use crate::ledger::domain::amount::Amount;
use crate::ledger::queries::ReportTagLookupError;

use super::domain::{NewSavingsTransaction, SavingsAccount, SavingsTransaction};

#[derive(Debug, thiserror::Error)]
pub enum SavingsCommandError {
    /// The ledger account being bound does not carry the members-savings
    /// report tag.
    #[error("ledger account must carry the {0} report tag")]
    MissingReportTag(ReportTag),
    /// A role account needed for the posting (cash, savings-interest
    /// expense) is not configured in the chart of accounts.
    #[error(transparent)]
    AccountLookup(#[from] ReportTagLookupError),
    /// A withdrawal would push the derived balance below zero.
    #[error("withdrawal of {requested} exceeds savings balance of {balance}")]
    InsufficientFunds { balance: Amount, requested: Amount },
    /// The savings account has been closed to new transactions.
    #[error("savings account is inactive")]
    AccountInactive,
    #[error("record does not exist")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait SavingsCommands {
    /// Open a savings account for a member, binding it to the ledger account
    /// that carries the members-savings report tag.
    async fn open_account(
        &self,
        member_id: i64,
        account_id: i64,
        opened_on: NaiveDate,
    ) -> Result<SavingsAccount, SavingsCommandError>;

    /// Record a savings transaction.
    ///
    /// In one database transaction this posts the balanced journal entry,
    /// inserts the savings transaction, and syncs the unified member ledger.
    /// Deposits additionally get a receipt. Withdrawals are checked against
    /// the derived balance first.
    async fn record_transaction(
        &self,
        transaction: NewSavingsTransaction,
        recorded_by: Option<String>,
    ) -> Result<SavingsTransaction, SavingsCommandError>;

    /// Administrative edit of an existing transaction. The member-ledger row
    /// is re-synced under the same source key, so the edit never duplicates
    /// history.
    async fn update_transaction(
        &self,
        transaction_id: i64,
        transaction: NewSavingsTransaction,
    ) -> Result<SavingsTransaction, SavingsCommandError>;
}
