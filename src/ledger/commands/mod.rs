//! Write operations for the chart of accounts and the journal.
//!
//! Commands own their transaction boundaries: each call either persists
//! everything it touches or nothing at all.

pub mod sqlite;

use async_trait::async_trait;

use super::domain::accounts::{Account, NewAccount};
use super::domain::entries::{JournalEntry, NewJournalEntry};

#[derive(Debug, thiserror::Error)]
pub enum AccountCommandError {
    /// Another account already uses this code.
    #[error("an account with code '{0}' already exists")]
    DuplicateCode(String),
    /// The requested parent chain loops back to the account itself.
    #[error("account parent chain may not form a cycle")]
    CyclicParent,
    /// The account is still referenced by journal lines or child accounts.
    #[error("account is referenced and cannot be deleted")]
    Referenced,
    #[error("account does not exist")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PostEntryError {
    /// A line references an account that does not exist.
    #[error("journal line references unknown account {0}")]
    UnknownAccount(i64),
    #[error("journal entry does not exist")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait LedgerCommands {
    /// Create a new chart-of-accounts entry.
    async fn create_account(&self, account: NewAccount) -> Result<Account, AccountCommandError>;

    /// Replace an account's attributes. The parent chain is re-checked so an
    /// update can never introduce a cycle.
    async fn update_account(
        &self,
        account_id: i64,
        account: NewAccount,
    ) -> Result<Account, AccountCommandError>;

    /// Delete an account. Fails with [`AccountCommandError::Referenced`]
    /// while any journal line or child account points at it.
    async fn delete_account(&self, account_id: i64) -> Result<(), AccountCommandError>;

    /// Atomically persist a validated journal entry and all of its lines.
    ///
    /// The creator and creation timestamp are recorded here, once, and never
    /// changed by later edits.
    async fn post_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, PostEntryError>;

    /// Replace an existing entry's header fields and full line set. The
    /// replacement lines were already validated as a balanced set by
    /// [`NewJournalEntry::new`]; the swap happens inside one transaction.
    async fn update_entry(
        &self,
        entry_id: i64,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, PostEntryError>;

    /// Delete an entry. Its lines cascade away with it.
    async fn delete_entry(&self, entry_id: i64) -> Result<(), PostEntryError>;
}
