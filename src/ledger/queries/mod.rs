//! Queries for chart-of-accounts and journal information.
//!
//! Queries fetch information from the backing storage and never modify data.
//! Every balance is computed by summing journal history on demand; there are
//! no stored running totals to trust or to drift.

pub mod sqlite;

use async_trait::async_trait;

use super::domain::accounts::{Account, ReportTag};
use super::domain::amount::Amount;
use super::domain::entries::JournalEntry;

#[derive(Debug, thiserror::Error)]
pub enum ReportTagLookupError {
    /// No account carries the requested tag. Binding accounts to roles is a
    /// chart-of-accounts setup task; this surfaces the missing setup eagerly.
    #[error("no account is configured with report tag {0}")]
    NotConfigured(ReportTag),
    /// More than one account carries a tag that is expected to be unique.
    #[error("multiple accounts carry report tag {0}")]
    Ambiguous(ReportTag),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait AccountQueries {
    async fn get_account(&self, account_id: i64) -> anyhow::Result<Option<Account>>;

    /// All accounts, ordered by code.
    async fn list_accounts(&self) -> anyhow::Result<Vec<Account>>;

    /// The account's derived balance: the signed sum of its journal-line
    /// activity, positive in the account type's normal direction (debit for
    /// asset/expense, credit for liability/equity/income).
    ///
    /// # Returns
    ///
    /// `None` when the account does not exist. An account with no activity
    /// has a balance of zero.
    async fn account_balance(&self, account_id: i64) -> anyhow::Result<Option<Amount>>;

    /// Resolve "the" account bound to a business role via its report tag.
    async fn account_by_report_tag(&self, tag: ReportTag)
        -> Result<Account, ReportTagLookupError>;
}

#[async_trait]
pub trait EntryQueries {
    /// A journal entry with its lines, or `None` if it does not exist.
    async fn get_entry(&self, entry_id: i64) -> anyhow::Result<Option<JournalEntry>>;
}
