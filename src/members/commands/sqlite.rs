use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::members::domain::{Member, MemberTransactionSync, NewMember};
use crate::members::models;

use super::{MemberCommandError, MemberCommands};

/// Member write operations backed by the SQLite pool.
pub struct SqliteCommands<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> MemberCommands for SqliteCommands<'a> {
    async fn create_member(&self, member: NewMember) -> Result<Member, MemberCommandError> {
        let now = Utc::now();

        let model = sqlx::query_as::<_, models::Member>(
            r#"
            INSERT INTO member (
                member_no, payroll_no, full_name, id_number, phone, email,
                address, joined_on, status, notes, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING *
            "#,
        )
        .bind(member.member_no())
        .bind(member.payroll_no())
        .bind(member.full_name())
        .bind(&member.id_number)
        .bind(&member.phone)
        .bind(&member.email)
        .bind(&member.address)
        .bind(member.joined_on)
        .bind(member.status.as_str())
        .bind(&member.notes)
        .bind(now)
        .fetch_one(self.0)
        .await
        .map_err(|error| map_member_write_error(error, &member))?;

        info!(id = model.id, member_no = %model.member_no, "Created member.");

        Ok((&model).try_into()?)
    }

    async fn update_member(
        &self,
        member_id: i64,
        member: NewMember,
    ) -> Result<Member, MemberCommandError> {
        let model = sqlx::query_as::<_, models::Member>(
            r#"
            UPDATE member
            SET member_no = ?2, payroll_no = ?3, full_name = ?4, id_number = ?5,
                phone = ?6, email = ?7, address = ?8, joined_on = ?9,
                status = ?10, notes = ?11, updated_at = ?12
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(member.member_no())
        .bind(member.payroll_no())
        .bind(member.full_name())
        .bind(&member.id_number)
        .bind(&member.phone)
        .bind(&member.email)
        .bind(&member.address)
        .bind(member.joined_on)
        .bind(member.status.as_str())
        .bind(&member.notes)
        .bind(Utc::now())
        .fetch_one(self.0)
        .await
        .map_err(|error| map_member_write_error(error, &member))?;

        info!(id = model.id, member_no = %model.member_no, "Updated member.");

        Ok((&model).try_into()?)
    }

    async fn delete_member(&self, member_id: i64) -> Result<(), MemberCommandError> {
        let result = sqlx::query(
            r#"
            DELETE FROM member WHERE id = ?1
            "#,
        )
        .bind(member_id)
        .execute(self.0)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db_error)
                if db_error.kind() == sqlx::error::ErrorKind::ForeignKeyViolation =>
            {
                MemberCommandError::Referenced
            }
            _ => MemberCommandError::Unknown(error.into()),
        })?;

        if result.rows_affected() == 0 {
            return Err(MemberCommandError::NotFound);
        }

        info!(member_id, "Deleted member.");

        Ok(())
    }
}

fn map_member_write_error(error: sqlx::Error, member: &NewMember) -> MemberCommandError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.kind() == sqlx::error::ErrorKind::UniqueViolation {
            // SQLite names the violated column in the message, which is the
            // only way to tell the two unique constraints apart.
            if db_error.message().contains("member.payroll_no") {
                return MemberCommandError::DuplicatePayrollNo(
                    member.payroll_no().unwrap_or_default().to_owned(),
                );
            }

            return MemberCommandError::DuplicateMemberNo(member.member_no().to_owned());
        }
    }

    match error {
        sqlx::Error::RowNotFound => MemberCommandError::NotFound,
        other => MemberCommandError::Unknown(other.into()),
    }
}

/// Upsert the unified member-ledger row mirroring one source transaction.
///
/// This runs on the caller's open connection, so when called from inside a
/// database transaction the sync commits or rolls back together with the
/// source write. The (source_model, source_id) key makes the operation
/// idempotent: replaying a source event rewrites the same row.
pub async fn sync_member_transaction(
    conn: &mut SqliteConnection,
    sync: &MemberTransactionSync,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO member_transaction (
            member_id, date, amount, description, transaction_type,
            source_model, source_id, journal_entry_id
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (source_model, source_id) DO UPDATE SET
            member_id = excluded.member_id,
            date = excluded.date,
            amount = excluded.amount,
            description = excluded.description,
            transaction_type = excluded.transaction_type,
            journal_entry_id = excluded.journal_entry_id
        "#,
    )
    .bind(sync.member_id)
    .bind(sync.date)
    .bind(sync.amount.value())
    .bind(&sync.description)
    .bind(&sync.transaction_type)
    .bind(sync.source.model.as_str())
    .bind(sync.source.id)
    .bind(sync.journal_entry_id)
    .execute(conn)
    .await?;

    debug!(
        source_model = %sync.source.model,
        source_id = sync.source.id,
        member_id = sync.member_id,
        "Synced member transaction."
    );

    Ok(())
}
