use anyhow::Context;
use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::ledger::commands::sqlite::{insert_entry, replace_entry};
use crate::ledger::domain::accounts::ReportTag;
use crate::ledger::domain::amount::Amount;
use crate::ledger::domain::entries::{JournalLine, NewJournalEntry};
use crate::ledger::queries::sqlite::{find_account, find_account_by_report_tag};
use crate::members::commands::sqlite::sync_member_transaction;
use crate::members::domain::{MemberTransactionSync, SourceModel, SourceRef};
use crate::receipts::commands::insert_receipt;
use crate::receipts::domain::{NewReceipt, ReceiptKind};
use crate::savings::domain::{
    NewSavingsTransaction, SavingsAccount, SavingsTransaction, SavingsTransactionKind,
};
use crate::savings::models;

use super::{SavingsCommandError, SavingsCommands};

/// Savings write operations backed by the SQLite pool.
pub struct SqliteCommands<'a>(pub &'a SqlitePool);

async fn get_account_row(
    conn: &mut SqliteConnection,
    savings_account_id: i64,
) -> Result<models::SavingsAccount, SavingsCommandError> {
    sqlx::query_as::<_, models::SavingsAccount>(
        r#"
        SELECT * FROM savings_account WHERE id = ?1
        "#,
    )
    .bind(savings_account_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(anyhow::Error::from)?
    .ok_or(SavingsCommandError::NotFound)
}

async fn derived_balance(
    conn: &mut SqliteConnection,
    savings_account_id: i64,
) -> anyhow::Result<Amount> {
    let minor = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(
            CASE WHEN kind = 'WITHDRAWAL' THEN -amount ELSE amount END
        ), 0)
        FROM savings_transaction
        WHERE savings_account_id = ?1
        "#,
    )
    .bind(savings_account_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Amount::from_minor(minor))
}

/// The journal entry mirroring one savings transaction. Deposits debit
/// cash and credit the savings liability; withdrawals reverse that;
/// interest is an expense credited into the liability.
async fn build_entry(
    conn: &mut SqliteConnection,
    transaction: &NewSavingsTransaction,
    savings_gl_account: i64,
    recorded_by: Option<String>,
) -> Result<NewJournalEntry, SavingsCommandError> {
    let lines = match transaction.kind() {
        SavingsTransactionKind::Deposit => {
            let cash = find_account_by_report_tag(&mut *conn, ReportTag::AssetCashEquity).await?;
            vec![
                JournalLine::debit(cash.id, transaction.amount()),
                JournalLine::credit(savings_gl_account, transaction.amount()),
            ]
        }
        SavingsTransactionKind::Withdrawal => {
            let cash = find_account_by_report_tag(&mut *conn, ReportTag::AssetCashEquity).await?;
            vec![
                JournalLine::debit(savings_gl_account, transaction.amount()),
                JournalLine::credit(cash.id, transaction.amount()),
            ]
        }
        SavingsTransactionKind::Interest => {
            let expense =
                find_account_by_report_tag(&mut *conn, ReportTag::ExpSavingsInterest).await?;
            vec![
                JournalLine::debit(expense.id, transaction.amount()),
                JournalLine::credit(savings_gl_account, transaction.amount()),
            ]
        }
    };

    Ok(NewJournalEntry::new(
        transaction.date(),
        transaction.ledger_description(),
        String::new(),
        true,
        recorded_by,
        lines,
    )
    .context("savings journal entry failed validation")?)
}

#[async_trait]
impl<'a> SavingsCommands for SqliteCommands<'a> {
    async fn open_account(
        &self,
        member_id: i64,
        account_id: i64,
        opened_on: chrono::NaiveDate,
    ) -> Result<SavingsAccount, SavingsCommandError> {
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let ledger_account = find_account(&mut *tx, account_id)
            .await?
            .ok_or(SavingsCommandError::NotFound)?;

        if ledger_account.report_tag != Some(ReportTag::LiabMembersSavings) {
            return Err(SavingsCommandError::MissingReportTag(
                ReportTag::LiabMembersSavings,
            ));
        }

        let model = sqlx::query_as::<_, models::SavingsAccount>(
            r#"
            INSERT INTO savings_account (member_id, account_id, opened_on, active)
            VALUES (?1, ?2, ?3, 1)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(account_id)
        .bind(opened_on)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db_error)
                if db_error.kind() == sqlx::error::ErrorKind::ForeignKeyViolation =>
            {
                SavingsCommandError::NotFound
            }
            _ => SavingsCommandError::Unknown(error.into()),
        })?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(id = model.id, member_id, "Opened savings account.");

        Ok((&model).into())
    }

    async fn record_transaction(
        &self,
        transaction: NewSavingsTransaction,
        recorded_by: Option<String>,
    ) -> Result<SavingsTransaction, SavingsCommandError> {
        // The validating reads run inside the same transaction as the
        // writes, so the balance they saw is still the balance at commit.
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let account = get_account_row(&mut *tx, transaction.savings_account_id()).await?;

        if !account.active {
            return Err(SavingsCommandError::AccountInactive);
        }

        if transaction.kind() == SavingsTransactionKind::Withdrawal {
            let balance = derived_balance(&mut *tx, account.id).await?;

            if transaction.amount() > balance {
                return Err(SavingsCommandError::InsufficientFunds {
                    balance,
                    requested: transaction.amount(),
                });
            }
        }

        let entry =
            build_entry(&mut *tx, &transaction, account.account_id, recorded_by.clone()).await?;

        let entry_model = insert_entry(&mut *tx, &entry)
            .await
            .context("failed to post savings journal entry")?;

        let model = sqlx::query_as::<_, models::SavingsTransaction>(
            r#"
            INSERT INTO savings_transaction (
                savings_account_id, date, kind, amount, journal_entry_id, notes, source
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(transaction.date())
        .bind(transaction.kind().as_str())
        .bind(transaction.amount().value())
        .bind(entry_model.id)
        .bind(transaction.notes())
        .bind(transaction.source())
        .fetch_one(&mut *tx)
        .await
        .map_err(anyhow::Error::from)?;

        sync_member_transaction(
            &mut *tx,
            &MemberTransactionSync {
                source: SourceRef {
                    model: SourceModel::SavingsTransaction,
                    id: model.id,
                },
                member_id: account.member_id,
                date: transaction.date(),
                amount: transaction.amount(),
                description: transaction.ledger_description(),
                transaction_type: transaction.kind().ledger_label().to_owned(),
                journal_entry_id: Some(entry_model.id),
            },
        )
        .await?;

        if transaction.kind() == SavingsTransactionKind::Deposit {
            insert_receipt(
                &mut *tx,
                &NewReceipt {
                    member_id: account.member_id,
                    kind: ReceiptKind::Savings,
                    amount: transaction.amount(),
                    payment_method: String::new(),
                    reference_note: transaction.ledger_description(),
                    loan_repayment_id: None,
                    savings_transaction_id: Some(model.id),
                    journal_entry_id: Some(entry_model.id),
                    issued_by: recorded_by,
                },
            )
            .await
            .context("failed to issue deposit receipt")?;
        }

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(
            id = model.id,
            savings_account_id = account.id,
            kind = %transaction.kind(),
            amount = %transaction.amount(),
            "Recorded savings transaction."
        );

        Ok((&model).try_into()?)
    }

    async fn update_transaction(
        &self,
        transaction_id: i64,
        transaction: NewSavingsTransaction,
    ) -> Result<SavingsTransaction, SavingsCommandError> {
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let account = get_account_row(&mut *tx, transaction.savings_account_id()).await?;

        let model = sqlx::query_as::<_, models::SavingsTransaction>(
            r#"
            UPDATE savings_transaction
            SET date = ?2, kind = ?3, amount = ?4, notes = ?5, source = ?6
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(transaction.date())
        .bind(transaction.kind().as_str())
        .bind(transaction.amount().value())
        .bind(transaction.notes())
        .bind(transaction.source())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| match error {
            sqlx::Error::RowNotFound => SavingsCommandError::NotFound,
            other => SavingsCommandError::Unknown(other.into()),
        })?;

        // The linked journal entry is rewritten with the edited amount and
        // kind, keeping the general ledger in step with the savings book.
        if let Some(entry_id) = model.journal_entry_id {
            let entry = build_entry(&mut *tx, &transaction, account.account_id, None).await?;

            replace_entry(&mut *tx, entry_id, &entry)
                .await
                .context("failed to rewrite savings journal entry")?;
        }

        // Same source key as the original write, so the ledger row is
        // overwritten in place.
        sync_member_transaction(
            &mut *tx,
            &MemberTransactionSync {
                source: SourceRef {
                    model: SourceModel::SavingsTransaction,
                    id: model.id,
                },
                member_id: account.member_id,
                date: transaction.date(),
                amount: transaction.amount(),
                description: transaction.ledger_description(),
                transaction_type: transaction.kind().ledger_label().to_owned(),
                journal_entry_id: model.journal_entry_id,
            },
        )
        .await?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(id = model.id, "Updated savings transaction.");

        Ok((&model).try_into()?)
    }
}
