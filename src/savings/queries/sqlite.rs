use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::ledger::domain::amount::Amount;
use crate::savings::domain::{SavingsAccount, SavingsTransaction};
use crate::savings::models;

use super::SavingsQueries;

/// Savings read operations backed by the SQLite pool.
pub struct SqliteQueries<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> SavingsQueries for SqliteQueries<'a> {
    async fn get_account(
        &self,
        savings_account_id: i64,
    ) -> anyhow::Result<Option<SavingsAccount>> {
        let model = sqlx::query_as::<_, models::SavingsAccount>(
            r#"
            SELECT * FROM savings_account WHERE id = ?1
            "#,
        )
        .bind(savings_account_id)
        .fetch_optional(self.0)
        .await?;

        Ok(model.as_ref().map(Into::into))
    }

    async fn member_accounts(&self, member_id: i64) -> anyhow::Result<Vec<SavingsAccount>> {
        let models = sqlx::query_as::<_, models::SavingsAccount>(
            r#"
            SELECT * FROM savings_account
            WHERE member_id = ?1
            ORDER BY opened_on, id
            "#,
        )
        .bind(member_id)
        .fetch_all(self.0)
        .await?;

        Ok(models.iter().map(Into::into).collect())
    }

    async fn savings_balance(&self, savings_account_id: i64) -> anyhow::Result<Option<Amount>> {
        // LEFT JOIN so an account with no transactions still produces a row
        // (with a zero sum) and only a missing account yields `None`.
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN st.kind = 'WITHDRAWAL' THEN -st.amount ELSE st.amount END
            ), 0)
            FROM savings_account sa
            LEFT JOIN savings_transaction st ON st.savings_account_id = sa.id
            WHERE sa.id = ?1
            GROUP BY sa.id
            "#,
        )
        .bind(savings_account_id)
        .fetch_optional(self.0)
        .await?;

        debug!(savings_account_id, ?balance, "Computed savings balance.");

        Ok(balance.map(Amount::from_minor))
    }

    async fn list_transactions(
        &self,
        savings_account_id: i64,
    ) -> anyhow::Result<Vec<SavingsTransaction>> {
        let models = sqlx::query_as::<_, models::SavingsTransaction>(
            r#"
            SELECT * FROM savings_transaction
            WHERE savings_account_id = ?1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(savings_account_id)
        .fetch_all(self.0)
        .await?;

        models.iter().map(TryInto::try_into).collect()
    }
}
