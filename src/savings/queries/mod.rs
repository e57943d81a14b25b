//! Read operations for savings accounts. Balances are always derived from
//! the transaction history at read time.

pub mod sqlite;

use async_trait::async_trait;

use crate::ledger::domain::amount::Amount;

use super::domain::{SavingsAccount, SavingsTransaction};

#[async_trait]
pub trait SavingsQueries {
    async fn get_account(&self, savings_account_id: i64)
        -> anyhow::Result<Option<SavingsAccount>>;

    /// All of a member's savings accounts, oldest first.
    async fn member_accounts(&self, member_id: i64) -> anyhow::Result<Vec<SavingsAccount>>;

    /// The derived balance: Σ deposits + Σ interest − Σ withdrawals.
    ///
    /// # Returns
    ///
    /// `None` when the savings account does not exist. An account with no
    /// transactions has a balance of zero.
    async fn savings_balance(&self, savings_account_id: i64) -> anyhow::Result<Option<Amount>>;

    /// The account's transaction history, newest first.
    async fn list_transactions(
        &self,
        savings_account_id: i64,
    ) -> anyhow::Result<Vec<SavingsTransaction>>;
}
