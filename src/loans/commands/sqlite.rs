use anyhow::Context;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

use crate::ledger::commands::sqlite::insert_entry;
use crate::ledger::domain::accounts::ReportTag;
use crate::ledger::domain::amount::Amount;
use crate::ledger::domain::entries::{JournalLine, NewJournalEntry, NewJournalLine};
use crate::ledger::queries::sqlite::{find_account, find_account_by_report_tag};
use crate::loans::domain::repayments::{allocate, NewRepayment, RepaymentAllocation};
use crate::loans::domain::schedule::{generate_schedule, Installment, ScheduleEntry};
use crate::loans::domain::{Loan, LoanProduct, LoanRepayment, LoanStatus, NewLoan, NewLoanProduct};
use crate::loans::models;
use crate::members::commands::sqlite::sync_member_transaction;
use crate::members::domain::{MemberTransactionSync, SourceModel, SourceRef};
use crate::receipts::commands::insert_receipt;
use crate::receipts::domain::{NewReceipt, ReceiptKind};
use crate::savings::domain::SavingsTransactionKind;

use super::{LoanCommandError, LoanCommands};

/// Loan write operations backed by the SQLite pool.
pub struct SqliteCommands<'a>(pub &'a SqlitePool);

async fn get_loan_row(
    conn: &mut SqliteConnection,
    loan_id: i64,
) -> Result<models::Loan, LoanCommandError> {
    sqlx::query_as::<_, models::Loan>(
        r#"
        SELECT * FROM loan WHERE id = ?1
        "#,
    )
    .bind(loan_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(anyhow::Error::from)?
    .ok_or(LoanCommandError::NotFound)
}

/// The loan's outstanding balance: principal minus everything repaid,
/// with overpayment excess never counting against the loan.
async fn outstanding_balance(
    conn: &mut SqliteConnection,
    loan: &models::Loan,
) -> anyhow::Result<Amount> {
    let repaid = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(amount - excess_to_savings), 0)
        FROM loan_repayment
        WHERE loan_id = ?1
        "#,
    )
    .bind(loan.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Amount::from_minor(loan.principal - repaid))
}

/// Require the account to exist and carry the given report tag.
async fn require_tagged_account(
    conn: &mut SqliteConnection,
    account_id: i64,
    tag: ReportTag,
) -> Result<(), LoanCommandError> {
    let account = find_account(&mut *conn, account_id)
        .await?
        .ok_or(LoanCommandError::NotFound)?;

    if account.report_tag != Some(tag) {
        return Err(LoanCommandError::MissingReportTag(tag));
    }

    Ok(())
}

async fn insert_schedule(
    conn: &mut SqliteConnection,
    loan_id: i64,
    installments: &[Installment],
) -> Result<(), LoanCommandError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO loan_schedule (loan_id, installment_no, due_date, principal_due, interest_due, total_due, paid) ",
    );

    builder.push_values(installments, |mut row, installment| {
        row.push_bind(loan_id)
            .push_bind(installment.installment_no)
            .push_bind(installment.due_date)
            .push_bind(installment.principal_due.value())
            .push_bind(installment.interest_due.value())
            .push_bind(installment.total_due().value())
            .push_bind(false);
    });

    builder.build().execute(conn).await.map_err(|error| match &error {
        sqlx::Error::Database(db_error)
            if db_error.kind() == sqlx::error::ErrorKind::UniqueViolation =>
        {
            LoanCommandError::DuplicateInstallment
        }
        _ => LoanCommandError::Unknown(error.into()),
    })?;

    Ok(())
}

/// Flag every installment whose cumulative total is covered by the amount
/// repaid so far.
async fn mark_paid_installments(
    conn: &mut SqliteConnection,
    loan_id: i64,
    cumulative_repaid: Amount,
) -> anyhow::Result<()> {
    let rows = sqlx::query_as::<_, models::ScheduleRow>(
        r#"
        SELECT * FROM loan_schedule
        WHERE loan_id = ?1
        ORDER BY due_date, installment_no
        "#,
    )
    .bind(loan_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut running = Amount::ZERO;
    for row in rows {
        running = running + Amount::from_minor(row.total_due);
        let covered = running <= cumulative_repaid;

        if covered != row.paid {
            sqlx::query("UPDATE loan_schedule SET paid = ?2 WHERE id = ?1")
                .bind(row.id)
                .bind(covered)
                .execute(&mut *conn)
                .await?;
        }
    }

    Ok(())
}

#[async_trait]
impl<'a> LoanCommands for SqliteCommands<'a> {
    async fn create_product(
        &self,
        product: NewLoanProduct,
    ) -> Result<LoanProduct, LoanCommandError> {
        let model = sqlx::query_as::<_, models::LoanProduct>(
            r#"
            INSERT INTO loan_product (
                name, description, annual_rate_bps, interest_method, default_tenor_months
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(product.name())
        .bind(product.description())
        .bind(product.annual_rate().basis_points())
        .bind(product.interest_method().as_str())
        .bind(product.default_tenor_months())
        .fetch_one(self.0)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db_error)
                if db_error.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                LoanCommandError::DuplicateProductName
            }
            _ => LoanCommandError::Unknown(error.into()),
        })?;

        info!(id = model.id, name = %model.name, "Created loan product.");

        Ok((&model).try_into()?)
    }

    async fn create_loan(
        &self,
        loan: NewLoan,
        recorded_by: Option<String>,
    ) -> Result<Loan, LoanCommandError> {
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        require_tagged_account(&mut *tx, loan.principal_account_id(), ReportTag::AssetLoansPrincipal)
            .await?;
        require_tagged_account(&mut *tx, loan.interest_account_id(), ReportTag::AssetLoanInterest)
            .await?;

        let cash = find_account_by_report_tag(&mut *tx, ReportTag::AssetCashEquity).await?;

        let entry = NewJournalEntry::new(
            loan.disbursed_on(),
            "Loan disbursement".to_owned(),
            String::new(),
            true,
            recorded_by,
            vec![
                JournalLine::debit(loan.principal_account_id(), loan.principal()),
                JournalLine::credit(cash.id, loan.principal()),
            ],
        )
        .context("disbursement entry failed validation")?;

        let schedule = generate_schedule(
            loan.principal(),
            loan.annual_rate(),
            loan.tenor_months(),
            loan.disbursed_on(),
            loan.interest_method(),
        );

        let entry_model = insert_entry(&mut *tx, &entry)
            .await
            .context("failed to post disbursement entry")?;

        let model = sqlx::query_as::<_, models::Loan>(
            r#"
            INSERT INTO loan (
                member_id, product_id, principal, annual_rate_bps, interest_method,
                disbursed_on, tenor_months, status, principal_account_id,
                interest_account_id, journal_entry_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'ACTIVE', ?8, ?9, ?10)
            RETURNING *
            "#,
        )
        .bind(loan.member_id())
        .bind(loan.product_id())
        .bind(loan.principal().value())
        .bind(loan.annual_rate().basis_points())
        .bind(loan.interest_method().as_str())
        .bind(loan.disbursed_on())
        .bind(loan.tenor_months())
        .bind(loan.principal_account_id())
        .bind(loan.interest_account_id())
        .bind(entry_model.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db_error)
                if db_error.kind() == sqlx::error::ErrorKind::ForeignKeyViolation =>
            {
                LoanCommandError::NotFound
            }
            _ => LoanCommandError::Unknown(error.into()),
        })?;

        insert_schedule(&mut *tx, model.id, &schedule).await?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(
            id = model.id,
            member_id = model.member_id,
            principal = %loan.principal(),
            installments = schedule.len(),
            "Disbursed loan."
        );

        Ok((&model).try_into()?)
    }

    async fn record_repayment(
        &self,
        repayment: NewRepayment,
        recorded_by: Option<String>,
    ) -> Result<LoanRepayment, LoanCommandError> {
        // The balance read and the allocation check run inside the same
        // transaction as the writes, so the outstanding balance they judged
        // against is still the balance at commit.
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let loan = get_loan_row(&mut *tx, repayment.loan_id()).await?;
        let outstanding = outstanding_balance(&mut *tx, &loan).await?;

        let RepaymentAllocation {
            principal,
            interest,
            excess,
        } = allocate(
            outstanding,
            repayment.amount(),
            repayment.principal_component(),
            repayment.interest_component(),
        )?;

        let cash = find_account_by_report_tag(&mut *tx, ReportTag::AssetCashEquity).await?;

        // The cash debit covers the full payment; the credit side splits it
        // across the loan, interest income, and any savings excess.
        let mut lines: Vec<NewJournalLine> =
            vec![JournalLine::debit(cash.id, repayment.amount())];
        if principal.is_positive() {
            lines.push(JournalLine::credit(loan.principal_account_id, principal));
        }
        if interest.is_positive() {
            // Interest is recognized on receipt and credited straight to
            // income; the loan's interest receivable account carries no
            // activity.
            let interest_income =
                find_account_by_report_tag(&mut *tx, ReportTag::IncomeInterestOnLoans).await?;
            lines.push(JournalLine::credit(interest_income.id, interest));
        }

        let excess_savings_account = if excess.is_positive() {
            let savings_liability =
                find_account_by_report_tag(&mut *tx, ReportTag::LiabMembersSavings).await?;
            lines.push(JournalLine::credit(savings_liability.id, excess));

            let account_id = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT id FROM savings_account
                WHERE member_id = ?1 AND active = 1
                ORDER BY id
                LIMIT 1
                "#,
            )
            .bind(loan.member_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(LoanCommandError::NoSavingsAccount)?;

            Some(account_id)
        } else {
            None
        };

        let entry = NewJournalEntry::new(
            repayment.date(),
            "Loan repayment".to_owned(),
            String::new(),
            true,
            recorded_by.clone(),
            lines,
        )
        .context("repayment entry failed validation")?;

        let entry_model = insert_entry(&mut *tx, &entry)
            .await
            .context("failed to post repayment entry")?;

        let model = sqlx::query_as::<_, models::LoanRepayment>(
            r#"
            INSERT INTO loan_repayment (
                loan_id, date, amount, principal_component, interest_component,
                excess_to_savings, source, journal_entry_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(repayment.date())
        .bind(repayment.amount().value())
        .bind(principal.value())
        .bind(interest.value())
        .bind(excess.value())
        .bind(repayment.source())
        .bind(entry_model.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(anyhow::Error::from)?;

        sync_member_transaction(
            &mut *tx,
            &MemberTransactionSync {
                source: SourceRef {
                    model: SourceModel::LoanRepayment,
                    id: model.id,
                },
                member_id: loan.member_id,
                date: repayment.date(),
                amount: repayment.amount(),
                description: "Loan Repayment".to_owned(),
                transaction_type: "Loan Repayment".to_owned(),
                journal_entry_id: Some(entry_model.id),
            },
        )
        .await?;

        // Overpayment lands in savings as a deposit. It shares the
        // repayment's journal entry; the savings liability credit above is
        // its ledger footprint.
        if let Some(savings_account_id) = excess_savings_account {
            let savings_model = sqlx::query_as::<_, crate::savings::models::SavingsTransaction>(
                r#"
                INSERT INTO savings_transaction (
                    savings_account_id, date, kind, amount, journal_entry_id, notes, source
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                RETURNING *
                "#,
            )
            .bind(savings_account_id)
            .bind(repayment.date())
            .bind(SavingsTransactionKind::Deposit.as_str())
            .bind(excess.value())
            .bind(entry_model.id)
            .bind("Loan Overpayment")
            .bind("loan")
            .fetch_one(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?;

            sync_member_transaction(
                &mut *tx,
                &MemberTransactionSync {
                    source: SourceRef {
                        model: SourceModel::SavingsTransaction,
                        id: savings_model.id,
                    },
                    member_id: loan.member_id,
                    date: repayment.date(),
                    amount: excess,
                    description: "Loan Overpayment".to_owned(),
                    transaction_type: SavingsTransactionKind::Deposit.ledger_label().to_owned(),
                    journal_entry_id: Some(entry_model.id),
                },
            )
            .await?;
        }

        let cumulative_repaid = (Amount::from_minor(loan.principal) - outstanding)
            + (repayment.amount() - excess);
        mark_paid_installments(&mut *tx, loan.id, cumulative_repaid).await?;

        let new_balance = outstanding - (repayment.amount() - excess);
        if !new_balance.is_positive() && loan.status == LoanStatus::Active.as_str() {
            sqlx::query("UPDATE loan SET status = 'CLOSED' WHERE id = ?1")
                .bind(loan.id)
                .execute(&mut *tx)
                .await
                .map_err(anyhow::Error::from)?;
        }

        insert_receipt(
            &mut *tx,
            &NewReceipt {
                member_id: loan.member_id,
                kind: ReceiptKind::Loan,
                amount: repayment.amount(),
                payment_method: String::new(),
                reference_note: "Loan Repayment".to_owned(),
                loan_repayment_id: Some(model.id),
                savings_transaction_id: None,
                journal_entry_id: Some(entry_model.id),
                issued_by: recorded_by,
            },
        )
        .await
        .context("failed to issue repayment receipt")?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(
            id = model.id,
            loan_id = loan.id,
            amount = %repayment.amount(),
            excess = %excess,
            balance = %new_balance,
            "Recorded loan repayment."
        );

        Ok((&model).into())
    }

    async fn set_status(
        &self,
        loan_id: i64,
        status: LoanStatus,
    ) -> Result<Loan, LoanCommandError> {
        let model = sqlx::query_as::<_, models::Loan>(
            r#"
            UPDATE loan SET status = ?2 WHERE id = ?1 RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(status.as_str())
        .fetch_one(self.0)
        .await
        .map_err(|error| match error {
            sqlx::Error::RowNotFound => LoanCommandError::NotFound,
            other => LoanCommandError::Unknown(other.into()),
        })?;

        info!(id = model.id, status = %status, "Set loan status.");

        Ok((&model).try_into()?)
    }

    async fn regenerate_schedule(
        &self,
        loan_id: i64,
    ) -> Result<Vec<ScheduleEntry>, LoanCommandError> {
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        let loan: Loan = (&get_loan_row(&mut *tx, loan_id).await?).try_into()?;

        let schedule = generate_schedule(
            loan.principal,
            loan.annual_rate,
            loan.tenor_months,
            loan.disbursed_on,
            loan.interest_method,
        );

        sqlx::query("DELETE FROM loan_schedule WHERE loan_id = ?1 AND paid = 0")
            .bind(loan_id)
            .execute(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?;

        let paid_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM loan_schedule WHERE loan_id = ?1",
        )
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(anyhow::Error::from)?;

        // Paid rows stay; only the installments beyond them are rewritten.
        let remaining: Vec<Installment> = schedule
            .into_iter()
            .skip(paid_count as usize)
            .collect();

        if !remaining.is_empty() {
            insert_schedule(&mut *tx, loan_id, &remaining).await?;
        }

        let rows = sqlx::query_as::<_, models::ScheduleRow>(
            r#"
            SELECT * FROM loan_schedule
            WHERE loan_id = ?1
            ORDER BY due_date, installment_no
            "#,
        )
        .bind(loan_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(anyhow::Error::from)?;

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(loan_id, rows = rows.len(), "Regenerated loan schedule.");

        Ok(rows
            .iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()
            .map_err(anyhow::Error::from)?)
    }
}
