use async_trait::async_trait;
use sqlx::SqlitePool;

use super::domain::Receipt;
use super::models;

#[async_trait]
pub trait ReceiptQueries {
    /// Look a receipt up by its printed receipt number.
    async fn find_by_receipt_no(&self, receipt_no: &str) -> anyhow::Result<Option<Receipt>>;

    /// All receipts issued to a member, newest first.
    async fn member_receipts(&self, member_id: i64) -> anyhow::Result<Vec<Receipt>>;
}

/// Receipt read operations backed by the SQLite pool.
pub struct SqliteQueries<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> ReceiptQueries for SqliteQueries<'a> {
    async fn find_by_receipt_no(&self, receipt_no: &str) -> anyhow::Result<Option<Receipt>> {
        let model = sqlx::query_as::<_, models::Receipt>(
            r#"
            SELECT * FROM receipt WHERE receipt_no = ?1
            "#,
        )
        .bind(receipt_no)
        .fetch_optional(self.0)
        .await?;

        model.as_ref().map(TryInto::try_into).transpose()
    }

    async fn member_receipts(&self, member_id: i64) -> anyhow::Result<Vec<Receipt>> {
        let models = sqlx::query_as::<_, models::Receipt>(
            r#"
            SELECT * FROM receipt
            WHERE member_id = ?1
            ORDER BY issued_on DESC, id DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(self.0)
        .await?;

        models.iter().map(TryInto::try_into).collect()
    }
}
