use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::{debug, trace};

use crate::ledger::domain::accounts::{Account, AccountType, ReportTag};
use crate::ledger::domain::amount::Amount;
use crate::ledger::domain::entries::JournalEntry;
use crate::ledger::models;

use super::{AccountQueries, EntryQueries, ReportTagLookupError};

/// Ledger read operations backed by the SQLite pool.
pub struct SqliteQueries<'a>(pub &'a SqlitePool);

#[derive(sqlx::FromRow)]
struct AccountActivity {
    account_type: String,
    debits: i64,
    credits: i64,
}

/// Connection-level account lookup, so commands can validate accounts inside
/// their own open transaction.
pub(crate) async fn find_account(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> anyhow::Result<Option<Account>> {
    let model = sqlx::query_as::<_, models::Account>(
        r#"
        SELECT id, code, name, type, parent_id, report_tag
        FROM account
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .fetch_optional(&mut *conn)
    .await?;

    model.as_ref().map(TryInto::try_into).transpose()
}

/// Connection-level report-tag lookup; the tag must resolve to exactly one
/// account.
pub(crate) async fn find_account_by_report_tag(
    conn: &mut SqliteConnection,
    tag: ReportTag,
) -> Result<Account, ReportTagLookupError> {
    let matches = sqlx::query_as::<_, models::Account>(
        r#"
        SELECT id, code, name, type, parent_id, report_tag
        FROM account
        WHERE report_tag = ?1
        ORDER BY code
        "#,
    )
    .bind(tag.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(anyhow::Error::from)?;

    match matches.as_slice() {
        [] => Err(ReportTagLookupError::NotConfigured(tag)),
        [account] => Ok(account.try_into()?),
        _ => Err(ReportTagLookupError::Ambiguous(tag)),
    }
}

#[async_trait]
impl<'a> AccountQueries for SqliteQueries<'a> {
    async fn get_account(&self, account_id: i64) -> anyhow::Result<Option<Account>> {
        let mut conn = self.0.acquire().await?;

        find_account(&mut conn, account_id).await
    }

    async fn list_accounts(&self) -> anyhow::Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, models::Account>(
            r#"
            SELECT id, code, name, type, parent_id, report_tag
            FROM account
            ORDER BY code
            "#,
        )
        .fetch_all(self.0)
        .await?;

        accounts.iter().map(TryInto::try_into).collect()
    }

    async fn account_balance(&self, account_id: i64) -> anyhow::Result<Option<Amount>> {
        trace!(account_id, "Computing account balance.");

        let activity = sqlx::query_as::<_, AccountActivity>(
            r#"
            SELECT a.type AS account_type,
                   COALESCE(SUM(l.debit), 0) AS debits,
                   COALESCE(SUM(l.credit), 0) AS credits
            FROM account a
                LEFT JOIN journal_line l ON l.account_id = a.id
            WHERE a.id = ?1
            GROUP BY a.id
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.0)
        .await?;

        let activity = match activity {
            Some(activity) => activity,
            None => {
                debug!(account_id, "Account does not exist.");

                return Ok(None);
            }
        };

        let account_type: AccountType = activity.account_type.parse()?;
        let balance = if account_type.is_debit_normal() {
            activity.debits - activity.credits
        } else {
            activity.credits - activity.debits
        };

        Ok(Some(Amount::from_minor(balance)))
    }

    async fn account_by_report_tag(
        &self,
        tag: ReportTag,
    ) -> Result<Account, ReportTagLookupError> {
        let mut conn = self.0.acquire().await.map_err(anyhow::Error::from)?;

        find_account_by_report_tag(&mut conn, tag).await
    }
}

#[async_trait]
impl<'a> EntryQueries for SqliteQueries<'a> {
    async fn get_entry(&self, entry_id: i64) -> anyhow::Result<Option<JournalEntry>> {
        trace!(entry_id, "Querying for journal entry by ID.");

        let entry = sqlx::query_as::<_, models::JournalEntry>(
            r#"
            SELECT id, date, memo, reference, posted, created_by, created_at
            FROM journal_entry
            WHERE id = ?1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(self.0)
        .await?;

        let entry = match entry {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let lines = sqlx::query_as::<_, models::JournalLine>(
            r#"
            SELECT id, entry_id, account_id, debit, credit
            FROM journal_line
            WHERE entry_id = ?1
            ORDER BY id
            "#,
        )
        .bind(entry_id)
        .fetch_all(self.0)
        .await?;

        Ok(Some(entry.into_domain(&lines)))
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;
    use crate::database::testing::memory_pool;
    use crate::ledger::commands::{sqlite::SqliteCommands, LedgerCommands};
    use crate::ledger::domain::accounts::NewAccount;
    use crate::ledger::domain::entries::{JournalLine, NewJournalEntry};

    async fn make_account(
        pool: &SqlitePool,
        code: &str,
        account_type: AccountType,
        tag: Option<ReportTag>,
    ) -> Account {
        SqliteCommands(pool)
            .create_account(
                NewAccount::new(code.to_owned(), format!("Account {code}"), account_type, None, tag)
                    .expect("account should be valid"),
            )
            .await
            .expect("failed to create account")
    }

    async fn post(pool: &SqlitePool, debit: i64, credit: i64, minor: i64) {
        SqliteCommands(pool)
            .post_entry(
                NewJournalEntry::new(
                    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                    String::new(),
                    String::new(),
                    true,
                    None,
                    vec![
                        JournalLine::debit(debit, Amount::from_minor(minor)),
                        JournalLine::credit(credit, Amount::from_minor(minor)),
                    ],
                )
                .expect("entry should balance"),
            )
            .await
            .expect("failed to post entry");
    }

    #[tokio::test]
    async fn balance_follows_normal_sign() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        let cash = make_account(&pool, "101", AccountType::Asset, None).await;
        let income = make_account(&pool, "401", AccountType::Income, None).await;

        post(&pool, cash.id, income.id, 25_000).await;

        // The asset grows on its debit side, the income on its credit side;
        // both read positive.
        assert_eq!(
            Some(Amount::from_minor(25_000)),
            queries.account_balance(cash.id).await.unwrap()
        );
        assert_eq!(
            Some(Amount::from_minor(25_000)),
            queries.account_balance(income.id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn balance_with_no_activity_is_zero() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        let cash = make_account(&pool, "101", AccountType::Asset, None).await;

        assert_eq!(
            Some(Amount::ZERO),
            queries.account_balance(cash.id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn balance_of_missing_account_is_none() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        assert_eq!(None, queries.account_balance(42).await.unwrap());
    }

    #[tokio::test]
    async fn report_tag_lookup_finds_the_bound_account() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        let savings = make_account(
            &pool,
            "201",
            AccountType::Liability,
            Some(ReportTag::LiabMembersSavings),
        )
        .await;

        let found = queries
            .account_by_report_tag(ReportTag::LiabMembersSavings)
            .await
            .expect("tagged account should be found");

        assert_eq!(savings.id, found.id);
    }

    #[tokio::test]
    async fn report_tag_lookup_without_binding_is_not_configured() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        let error = queries
            .account_by_report_tag(ReportTag::AssetCashEquity)
            .await
            .expect_err("unbound tag should fail");

        assert!(matches!(
            error,
            ReportTagLookupError::NotConfigured(ReportTag::AssetCashEquity)
        ));
    }

    #[tokio::test]
    async fn report_tag_lookup_with_two_bindings_is_ambiguous() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        make_account(&pool, "101", AccountType::Asset, Some(ReportTag::AssetCashEquity)).await;
        make_account(&pool, "102", AccountType::Asset, Some(ReportTag::AssetCashEquity)).await;

        let error = queries
            .account_by_report_tag(ReportTag::AssetCashEquity)
            .await
            .expect_err("double binding should fail");

        assert!(matches!(
            error,
            ReportTagLookupError::Ambiguous(ReportTag::AssetCashEquity)
        ));
    }

    #[tokio::test]
    async fn get_entry_returns_lines() {
        let pool = memory_pool().await;
        let queries = SqliteQueries(&pool);

        let cash = make_account(&pool, "101", AccountType::Asset, None).await;
        let income = make_account(&pool, "401", AccountType::Income, None).await;
        post(&pool, cash.id, income.id, 1_000).await;

        let entry = queries
            .get_entry(1)
            .await
            .unwrap()
            .expect("entry should exist");

        assert_eq!(2, entry.lines.len());
    }
}
