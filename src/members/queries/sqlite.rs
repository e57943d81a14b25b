use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::trace;

use crate::ledger::domain::amount::Amount;
use crate::members::domain::{Member, MemberFinancialSummary, MemberTransaction};
use crate::members::models;

use super::MemberQueries;

/// Member read operations backed by the SQLite pool.
pub struct SqliteQueries<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> MemberQueries for SqliteQueries<'a> {
    async fn get_member(&self, member_id: i64) -> anyhow::Result<Option<Member>> {
        let model = sqlx::query_as::<_, models::Member>(
            r#"
            SELECT * FROM member WHERE id = ?1
            "#,
        )
        .bind(member_id)
        .fetch_optional(self.0)
        .await?;

        model.as_ref().map(TryInto::try_into).transpose()
    }

    async fn find_by_member_no(&self, member_no: &str) -> anyhow::Result<Option<Member>> {
        let model = sqlx::query_as::<_, models::Member>(
            r#"
            SELECT * FROM member WHERE member_no = ?1
            "#,
        )
        .bind(member_no.trim().to_uppercase())
        .fetch_optional(self.0)
        .await?;

        model.as_ref().map(TryInto::try_into).transpose()
    }

    async fn member_transactions(
        &self,
        member_id: i64,
    ) -> anyhow::Result<Vec<MemberTransaction>> {
        let rows = sqlx::query_as::<_, models::MemberTransaction>(
            r#"
            SELECT * FROM member_transaction
            WHERE member_id = ?1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(self.0)
        .await?;

        Ok(rows.iter().map(Into::into).collect())
    }

    async fn financial_summary(
        &self,
        member_id: i64,
    ) -> anyhow::Result<MemberFinancialSummary> {
        trace!(member_id, "Computing member financial summary.");

        let total_savings = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN st.kind = 'WITHDRAWAL' THEN -st.amount ELSE st.amount END
            ), 0)
            FROM savings_transaction st
                JOIN savings_account sa ON sa.id = st.savings_account_id
            WHERE sa.member_id = ?1
            "#,
        )
        .bind(member_id)
        .fetch_one(self.0)
        .await?;

        let total_loans = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(principal), 0) FROM loan WHERE member_id = ?1
            "#,
        )
        .bind(member_id)
        .fetch_one(self.0)
        .await?;

        // Only the allocable portion of each repayment counts against the
        // loans; excess routed to savings already shows up in total_savings.
        let total_paid = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(r.amount - r.excess_to_savings), 0)
            FROM loan_repayment r
                JOIN loan l ON l.id = r.loan_id
            WHERE l.member_id = ?1
            "#,
        )
        .bind(member_id)
        .fetch_one(self.0)
        .await?;

        Ok(MemberFinancialSummary {
            total_savings: Amount::from_minor(total_savings),
            total_loans: Amount::from_minor(total_loans),
            total_paid: Amount::from_minor(total_paid),
            loan_balance: Amount::from_minor(total_loans - total_paid),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::testing::memory_pool;
    use crate::members::commands::{sqlite::SqliteCommands, MemberCommands};
    use crate::members::domain::NewMember;

    #[tokio::test]
    async fn summary_with_no_records_is_all_zeroes() {
        let pool = memory_pool().await;

        let member = SqliteCommands(&pool)
            .create_member(NewMember::new("M-001".to_owned(), None, "Jane".to_owned()).unwrap())
            .await
            .expect("failed to create member");

        let summary = SqliteQueries(&pool)
            .financial_summary(member.id)
            .await
            .expect("summary should compute");

        assert_eq!(
            MemberFinancialSummary {
                total_savings: Amount::ZERO,
                total_loans: Amount::ZERO,
                total_paid: Amount::ZERO,
                loan_balance: Amount::ZERO,
            },
            summary
        );
    }

    #[tokio::test]
    async fn member_no_lookup_normalizes_case() {
        let pool = memory_pool().await;

        SqliteCommands(&pool)
            .create_member(NewMember::new("M-001".to_owned(), None, "Jane".to_owned()).unwrap())
            .await
            .expect("failed to create member");

        let found = SqliteQueries(&pool)
            .find_by_member_no(" m-001 ")
            .await
            .unwrap();

        assert!(found.is_some());
    }
}
