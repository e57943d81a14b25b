//! Receipt issuance. Receipts are immutable once written; the only command
//! is issuing a new one.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::domain::{NewReceipt, Receipt};
use super::models;

#[derive(Debug, thiserror::Error)]
pub enum ReceiptCommandError {
    #[error("receipt references a record that does not exist")]
    UnknownSource,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait ReceiptCommands {
    /// Issue a receipt for a committed payment. The receipt number is a
    /// freshly generated UUID; it is never reused or regenerated.
    async fn issue(&self, receipt: NewReceipt) -> Result<Receipt, ReceiptCommandError>;
}

/// Receipt write operations backed by the SQLite pool.
pub struct SqliteCommands<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> ReceiptCommands for SqliteCommands<'a> {
    async fn issue(&self, receipt: NewReceipt) -> Result<Receipt, ReceiptCommandError> {
        let mut conn = self.0.acquire().await.map_err(anyhow::Error::from)?;

        let model = insert_receipt(&mut *conn, &receipt)
            .await
            .map_err(|error| match error.downcast_ref::<sqlx::Error>() {
                Some(sqlx::Error::Database(db_error))
                    if db_error.kind() == sqlx::error::ErrorKind::ForeignKeyViolation =>
                {
                    ReceiptCommandError::UnknownSource
                }
                _ => ReceiptCommandError::Unknown(error),
            })?;

        Ok((&model).try_into()?)
    }
}

/// Insert a receipt row on the caller's open connection. Used by the savings
/// and loan commands so the receipt lands in the same transaction as the
/// payment it documents.
pub(crate) async fn insert_receipt(
    conn: &mut SqliteConnection,
    receipt: &NewReceipt,
) -> anyhow::Result<models::Receipt> {
    let receipt_no = Uuid::new_v4().to_string();

    let model = sqlx::query_as::<_, models::Receipt>(
        r#"
        INSERT INTO receipt (
            receipt_no, member_id, kind, amount, issued_on, payment_method,
            reference_note, loan_repayment_id, savings_transaction_id,
            journal_entry_id, issued_by
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        RETURNING *
        "#,
    )
    .bind(&receipt_no)
    .bind(receipt.member_id)
    .bind(receipt.kind.as_str())
    .bind(receipt.amount.value())
    .bind(Utc::now())
    .bind(&receipt.payment_method)
    .bind(&receipt.reference_note)
    .bind(receipt.loan_repayment_id)
    .bind(receipt.savings_transaction_id)
    .bind(receipt.journal_entry_id)
    .bind(receipt.issued_by.as_deref())
    .fetch_one(conn)
    .await?;

    info!(
        receipt_no = %model.receipt_no,
        member_id = model.member_id,
        kind = %model.kind,
        "Issued receipt."
    );

    Ok(model)
}
