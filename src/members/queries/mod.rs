//! Read operations for member records and the unified member ledger.

pub mod sqlite;

use async_trait::async_trait;

use super::domain::{Member, MemberFinancialSummary, MemberTransaction};

#[async_trait]
pub trait MemberQueries {
    async fn get_member(&self, member_id: i64) -> anyhow::Result<Option<Member>>;

    /// Look a member up by their (uppercase-normalized) member number.
    async fn find_by_member_no(&self, member_no: &str) -> anyhow::Result<Option<Member>>;

    /// The member's unified transaction history, newest first.
    async fn member_transactions(&self, member_id: i64)
        -> anyhow::Result<Vec<MemberTransaction>>;

    /// The member's derived financial position: total savings, total loan
    /// principal, total repaid, and the outstanding loan balance. All sums
    /// over history; a member with no records reads as all zeroes.
    async fn financial_summary(&self, member_id: i64)
        -> anyhow::Result<MemberFinancialSummary>;
}
