use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::ledger::{domain, models};

use super::{AccountCommandError, LedgerCommands, PostEntryError};

/// Ledger write operations backed by the SQLite pool.
pub struct SqliteCommands<'a>(pub &'a SqlitePool);

impl<'a> SqliteCommands<'a> {
    async fn find_parent_cycle(
        &self,
        account_id: i64,
        parent_id: i64,
    ) -> Result<bool, AccountCommandError> {
        let mut cursor = Some(parent_id);

        while let Some(current) = cursor {
            if current == account_id {
                return Ok(true);
            }

            cursor = sqlx::query_scalar::<_, Option<i64>>(
                r#"
                SELECT parent_id FROM account WHERE id = ?1
                "#,
            )
            .bind(current)
            .fetch_optional(self.0)
            .await
            .map_err(anyhow::Error::from)?
            .flatten();
        }

        Ok(false)
    }

    async fn require_line_accounts(
        &self,
        entry: &domain::entries::NewJournalEntry,
    ) -> Result<(), PostEntryError> {
        for line in entry.lines() {
            let found = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT id FROM account WHERE id = ?1
                "#,
            )
            .bind(line.account_id())
            .fetch_optional(self.0)
            .await
            .map_err(anyhow::Error::from)?;

            if found.is_none() {
                return Err(PostEntryError::UnknownAccount(line.account_id()));
            }
        }

        Ok(())
    }

    async fn fetch_entry_lines(
        &self,
        entry_id: i64,
    ) -> anyhow::Result<Vec<models::JournalLine>> {
        Ok(sqlx::query_as::<_, models::JournalLine>(
            r#"
            SELECT id, entry_id, account_id, debit, credit
            FROM journal_line
            WHERE entry_id = ?1
            ORDER BY id
            "#,
        )
        .bind(entry_id)
        .fetch_all(self.0)
        .await?)
    }
}

#[async_trait]
impl<'a> LedgerCommands for SqliteCommands<'a> {
    async fn create_account(
        &self,
        account: domain::accounts::NewAccount,
    ) -> Result<domain::accounts::Account, AccountCommandError> {
        let model = sqlx::query_as::<_, models::Account>(
            r#"
            INSERT INTO account (code, name, type, parent_id, report_tag)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, code, name, type, parent_id, report_tag
            "#,
        )
        .bind(account.code())
        .bind(account.name())
        .bind(account.account_type().as_str())
        .bind(account.parent_id())
        .bind(account.report_tag().map(|tag| tag.as_str()))
        .fetch_one(self.0)
        .await
        .map_err(|error| map_account_write_error(error, account.code()))?;

        info!(id = model.id, code = %model.code, "Created account.");

        Ok((&model).try_into()?)
    }

    async fn update_account(
        &self,
        account_id: i64,
        account: domain::accounts::NewAccount,
    ) -> Result<domain::accounts::Account, AccountCommandError> {
        if let Some(parent_id) = account.parent_id() {
            if self.find_parent_cycle(account_id, parent_id).await? {
                return Err(AccountCommandError::CyclicParent);
            }
        }

        let model = sqlx::query_as::<_, models::Account>(
            r#"
            UPDATE account
            SET code = ?2, name = ?3, type = ?4, parent_id = ?5, report_tag = ?6
            WHERE id = ?1
            RETURNING id, code, name, type, parent_id, report_tag
            "#,
        )
        .bind(account_id)
        .bind(account.code())
        .bind(account.name())
        .bind(account.account_type().as_str())
        .bind(account.parent_id())
        .bind(account.report_tag().map(|tag| tag.as_str()))
        .fetch_one(self.0)
        .await
        .map_err(|error| map_account_write_error(error, account.code()))?;

        info!(id = model.id, code = %model.code, "Updated account.");

        Ok((&model).try_into()?)
    }

    async fn delete_account(&self, account_id: i64) -> Result<(), AccountCommandError> {
        let result = sqlx::query(
            r#"
            DELETE FROM account WHERE id = ?1
            "#,
        )
        .bind(account_id)
        .execute(self.0)
        .await
        .map_err(|error| match constraint_kind(&error) {
            Some(sqlx::error::ErrorKind::ForeignKeyViolation) => AccountCommandError::Referenced,
            _ => AccountCommandError::Unknown(error.into()),
        })?;

        if result.rows_affected() == 0 {
            return Err(AccountCommandError::NotFound);
        }

        info!(id = account_id, "Deleted account.");

        Ok(())
    }

    async fn post_entry(
        &self,
        entry: domain::entries::NewJournalEntry,
    ) -> Result<domain::entries::JournalEntry, PostEntryError> {
        self.require_line_accounts(&entry).await?;

        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let entry_model = insert_entry(&mut *tx, &entry)
            .await
            .map_err(anyhow::Error::from)?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(id = entry_model.id, lines = entry.lines().len(), "Posted journal entry.");

        let lines = self
            .fetch_entry_lines(entry_model.id)
            .await
            .context("failed to read back journal lines")?;

        Ok(entry_model.into_domain(&lines))
    }

    async fn update_entry(
        &self,
        entry_id: i64,
        entry: domain::entries::NewJournalEntry,
    ) -> Result<domain::entries::JournalEntry, PostEntryError> {
        self.require_line_accounts(&entry).await?;

        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let entry_model = replace_entry(&mut *tx, entry_id, &entry)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => PostEntryError::NotFound,
                other => PostEntryError::Unknown(other.into()),
            })?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(entry_id, "Updated journal entry.");

        let lines = self
            .fetch_entry_lines(entry_id)
            .await
            .context("failed to read back journal lines")?;

        Ok(entry_model.into_domain(&lines))
    }

    async fn delete_entry(&self, entry_id: i64) -> Result<(), PostEntryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM journal_entry WHERE id = ?1
            "#,
        )
        .bind(entry_id)
        .execute(self.0)
        .await
        .map_err(anyhow::Error::from)?;

        if result.rows_affected() == 0 {
            return Err(PostEntryError::NotFound);
        }

        info!(entry_id, rows = result.rows_affected(), "Deleted journal entry.");

        Ok(())
    }
}

/// Insert a validated journal entry and its lines on the caller's open
/// connection, without committing. Commands that must post an entry
/// atomically with their own writes (savings transactions, loan
/// disbursements and repayments) run this inside their transaction.
pub(crate) async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &domain::entries::NewJournalEntry,
) -> anyhow::Result<models::JournalEntry> {
    let entry_model = sqlx::query_as::<_, models::JournalEntry>(
        r#"
        INSERT INTO journal_entry (date, memo, reference, posted, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, date, memo, reference, posted, created_by, created_at
        "#,
    )
    .bind(entry.date())
    .bind(entry.memo())
    .bind(entry.reference())
    .bind(entry.posted())
    .bind(entry.created_by())
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    let mut line_query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("INSERT INTO journal_line (entry_id, account_id, debit, credit) ");

    line_query.push_values(entry.lines(), |mut b, line| {
        b.push_bind(entry_model.id)
            .push_bind(line.account_id())
            .push_bind(line.debit_amount().value())
            .push_bind(line.credit_amount().value());
    });

    line_query.build().execute(&mut *conn).await?;

    Ok(entry_model)
}

/// Rewrite an existing journal entry on the caller's open connection: the
/// header is updated and the lines are replaced wholesale. The creator and
/// creation timestamp are deliberately left untouched; they are recorded at
/// first post only.
pub(crate) async fn replace_entry(
    conn: &mut SqliteConnection,
    entry_id: i64,
    entry: &domain::entries::NewJournalEntry,
) -> Result<models::JournalEntry, sqlx::Error> {
    let entry_model = sqlx::query_as::<_, models::JournalEntry>(
        r#"
        UPDATE journal_entry
        SET date = ?2, memo = ?3, reference = ?4, posted = ?5
        WHERE id = ?1
        RETURNING id, date, memo, reference, posted, created_by, created_at
        "#,
    )
    .bind(entry_id)
    .bind(entry.date())
    .bind(entry.memo())
    .bind(entry.reference())
    .bind(entry.posted())
    .fetch_one(&mut *conn)
    .await?;

    let old_lines = sqlx::query(
        r#"
        DELETE FROM journal_line WHERE entry_id = ?1
        "#,
    )
    .bind(entry_id)
    .execute(&mut *conn)
    .await?;

    debug!(
        entry_id,
        rows = old_lines.rows_affected(),
        "Cleared out old journal lines."
    );

    let mut line_query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("INSERT INTO journal_line (entry_id, account_id, debit, credit) ");

    line_query.push_values(entry.lines(), |mut b, line| {
        b.push_bind(entry_id)
            .push_bind(line.account_id())
            .push_bind(line.debit_amount().value())
            .push_bind(line.credit_amount().value());
    });

    line_query.build().execute(&mut *conn).await?;

    Ok(entry_model)
}

fn constraint_kind(error: &sqlx::Error) -> Option<sqlx::error::ErrorKind> {
    match error {
        sqlx::Error::Database(db_error) => Some(db_error.kind()),
        _ => None,
    }
}

fn map_account_write_error(error: sqlx::Error, code: &str) -> AccountCommandError {
    match constraint_kind(&error) {
        Some(sqlx::error::ErrorKind::UniqueViolation) => {
            AccountCommandError::DuplicateCode(code.to_owned())
        }
        Some(sqlx::error::ErrorKind::ForeignKeyViolation) => AccountCommandError::NotFound,
        _ => match error {
            sqlx::Error::RowNotFound => AccountCommandError::NotFound,
            other => AccountCommandError::Unknown(other.into()),
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;
    use crate::database::testing::memory_pool;
    use crate::ledger::domain::accounts::{AccountType, NewAccount};
    use crate::ledger::domain::amount::Amount;
    use crate::ledger::domain::entries::{JournalLine, NewJournalEntry};

    async fn make_account(
        commands: &SqliteCommands<'_>,
        code: &str,
        account_type: AccountType,
    ) -> domain::accounts::Account {
        commands
            .create_account(
                NewAccount::new(code.to_owned(), format!("Account {code}"), account_type, None, None)
                    .expect("account should be valid"),
            )
            .await
            .expect("failed to create account")
    }

    fn balanced_entry(debit_account: i64, credit_account: i64, minor: i64) -> NewJournalEntry {
        NewJournalEntry::new(
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            "Test".to_owned(),
            "REF".to_owned(),
            true,
            Some("clerk".to_owned()),
            vec![
                JournalLine::debit(debit_account, Amount::from_minor(minor)),
                JournalLine::credit(credit_account, Amount::from_minor(minor)),
            ],
        )
        .expect("entry should balance")
    }

    async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .expect("failed to count rows")
    }

    #[tokio::test]
    async fn duplicate_account_code_is_rejected() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        make_account(&commands, "101", AccountType::Asset).await;

        let error = commands
            .create_account(
                NewAccount::new("101".to_owned(), "Other".to_owned(), AccountType::Asset, None, None)
                    .unwrap(),
            )
            .await
            .expect_err("duplicate code should be rejected");

        assert!(matches!(error, AccountCommandError::DuplicateCode(code) if code == "101"));
    }

    #[tokio::test]
    async fn self_parent_is_rejected() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let account = make_account(&commands, "101", AccountType::Asset).await;

        let error = commands
            .update_account(
                account.id,
                NewAccount::new(
                    "101".to_owned(),
                    "Cash".to_owned(),
                    AccountType::Asset,
                    Some(account.id),
                    None,
                )
                .unwrap(),
            )
            .await
            .expect_err("self-parenting should be rejected");

        assert!(matches!(error, AccountCommandError::CyclicParent));
    }

    #[tokio::test]
    async fn parent_cycle_is_rejected() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let top = make_account(&commands, "100", AccountType::Asset).await;
        let child = commands
            .create_account(
                NewAccount::new(
                    "110".to_owned(),
                    "Child".to_owned(),
                    AccountType::Asset,
                    Some(top.id),
                    None,
                )
                .unwrap(),
            )
            .await
            .expect("failed to create child");

        let error = commands
            .update_account(
                top.id,
                NewAccount::new(
                    "100".to_owned(),
                    "Top".to_owned(),
                    AccountType::Asset,
                    Some(child.id),
                    None,
                )
                .unwrap(),
            )
            .await
            .expect_err("cycle through child should be rejected");

        assert!(matches!(error, AccountCommandError::CyclicParent));
    }

    #[tokio::test]
    async fn post_entry_persists_entry_and_lines() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;
        let income = make_account(&commands, "401", AccountType::Income).await;

        let entry = commands
            .post_entry(balanced_entry(cash.id, income.id, 10_000))
            .await
            .expect("failed to post entry");

        assert_eq!(2, entry.lines.len());
        assert_eq!(Some("clerk"), entry.created_by.as_deref());
        assert_eq!(1, count_rows(&pool, "journal_entry").await);
        assert_eq!(2, count_rows(&pool, "journal_line").await);
    }

    #[tokio::test]
    async fn post_entry_with_unknown_account_writes_nothing() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;

        let error = commands
            .post_entry(balanced_entry(cash.id, 9999, 10_000))
            .await
            .expect_err("unknown account should fail the post");

        assert!(matches!(error, PostEntryError::UnknownAccount(9999)));
        assert_eq!(0, count_rows(&pool, "journal_entry").await);
        assert_eq!(0, count_rows(&pool, "journal_line").await);
    }

    #[tokio::test]
    async fn update_entry_replaces_lines_and_keeps_audit_fields() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;
        let income = make_account(&commands, "401", AccountType::Income).await;
        let fees = make_account(&commands, "402", AccountType::Income).await;

        let original = commands
            .post_entry(balanced_entry(cash.id, income.id, 10_000))
            .await
            .expect("failed to post entry");

        let replacement = NewJournalEntry::new(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            "Corrected".to_owned(),
            "REF-2".to_owned(),
            true,
            Some("supervisor".to_owned()),
            vec![
                JournalLine::debit(cash.id, Amount::from_minor(4_000)),
                JournalLine::credit(income.id, Amount::from_minor(1_500)),
                JournalLine::credit(fees.id, Amount::from_minor(2_500)),
            ],
        )
        .expect("replacement should balance");

        let updated = commands
            .update_entry(original.id, replacement)
            .await
            .expect("failed to update entry");

        assert_eq!(3, updated.lines.len());
        assert_eq!("Corrected", updated.memo);
        // Audit fields survive the edit untouched.
        assert_eq!(Some("clerk"), updated.created_by.as_deref());
        assert_eq!(original.created_at, updated.created_at);
        assert_eq!(3, count_rows(&pool, "journal_line").await);
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;
        let income = make_account(&commands, "401", AccountType::Income).await;

        let error = commands
            .update_entry(42, balanced_entry(cash.id, income.id, 100))
            .await
            .expect_err("missing entry should be not found");

        assert!(matches!(error, PostEntryError::NotFound));
    }

    #[tokio::test]
    async fn delete_referenced_account_is_refused() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;
        let income = make_account(&commands, "401", AccountType::Income).await;

        commands
            .post_entry(balanced_entry(cash.id, income.id, 500))
            .await
            .expect("failed to post entry");

        let error = commands
            .delete_account(cash.id)
            .await
            .expect_err("referenced account should be protected");

        assert!(matches!(error, AccountCommandError::Referenced));
    }

    #[tokio::test]
    async fn delete_unreferenced_account_succeeds() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let account = make_account(&commands, "101", AccountType::Asset).await;

        commands
            .delete_account(account.id)
            .await
            .expect("unreferenced account should delete");
    }

    #[tokio::test]
    async fn delete_entry_cascades_lines() {
        let pool = memory_pool().await;
        let commands = SqliteCommands(&pool);

        let cash = make_account(&commands, "101", AccountType::Asset).await;
        let income = make_account(&commands, "401", AccountType::Income).await;

        let entry = commands
            .post_entry(balanced_entry(cash.id, income.id, 500))
            .await
            .expect("failed to post entry");

        commands
            .delete_entry(entry.id)
            .await
            .expect("failed to delete entry");

        assert_eq!(0, count_rows(&pool, "journal_line").await);
    }
}
