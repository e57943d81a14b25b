use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::ledger::domain::amount::Amount;
use crate::loans::domain::schedule::ScheduleEntry;
use crate::loans::domain::{Loan, LoanProduct, LoanRepayment};
use crate::loans::models;

use super::LoanQueries;

/// Loan read operations backed by the SQLite pool.
pub struct SqliteQueries<'a>(pub &'a SqlitePool);

#[async_trait]
impl<'a> LoanQueries for SqliteQueries<'a> {
    async fn get_loan(&self, loan_id: i64) -> anyhow::Result<Option<Loan>> {
        let model = sqlx::query_as::<_, models::Loan>(
            r#"
            SELECT * FROM loan WHERE id = ?1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(self.0)
        .await?;

        model.as_ref().map(TryInto::try_into).transpose()
    }

    async fn member_loans(&self, member_id: i64) -> anyhow::Result<Vec<Loan>> {
        let models = sqlx::query_as::<_, models::Loan>(
            r#"
            SELECT * FROM loan
            WHERE member_id = ?1
            ORDER BY disbursed_on DESC, id DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(self.0)
        .await?;

        models.iter().map(TryInto::try_into).collect()
    }

    async fn get_product(&self, product_id: i64) -> anyhow::Result<Option<LoanProduct>> {
        let model = sqlx::query_as::<_, models::LoanProduct>(
            r#"
            SELECT * FROM loan_product WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(self.0)
        .await?;

        model.as_ref().map(TryInto::try_into).transpose()
    }

    async fn list_products(&self) -> anyhow::Result<Vec<LoanProduct>> {
        let models = sqlx::query_as::<_, models::LoanProduct>(
            r#"
            SELECT * FROM loan_product ORDER BY name
            "#,
        )
        .fetch_all(self.0)
        .await?;

        models.iter().map(TryInto::try_into).collect()
    }

    async fn loan_balance(&self, loan_id: i64) -> anyhow::Result<Option<Amount>> {
        // LEFT JOIN so a loan with no repayments still produces a row and
        // only a missing loan yields `None`.
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT l.principal - COALESCE(SUM(r.amount - r.excess_to_savings), 0)
            FROM loan l
            LEFT JOIN loan_repayment r ON r.loan_id = l.id
            WHERE l.id = ?1
            GROUP BY l.id
            "#,
        )
        .bind(loan_id)
        .fetch_optional(self.0)
        .await?;

        debug!(loan_id, ?balance, "Computed loan balance.");

        Ok(balance.map(Amount::from_minor))
    }

    async fn loan_schedule(&self, loan_id: i64) -> anyhow::Result<Vec<ScheduleEntry>> {
        let models = sqlx::query_as::<_, models::ScheduleRow>(
            r#"
            SELECT * FROM loan_schedule
            WHERE loan_id = ?1
            ORDER BY due_date, installment_no
            "#,
        )
        .bind(loan_id)
        .fetch_all(self.0)
        .await?;

        models.iter().map(TryInto::try_into).collect()
    }

    async fn loan_repayments(&self, loan_id: i64) -> anyhow::Result<Vec<LoanRepayment>> {
        let models = sqlx::query_as::<_, models::LoanRepayment>(
            r#"
            SELECT * FROM loan_repayment
            WHERE loan_id = ?1
            ORDER BY date, id
            "#,
        )
        .bind(loan_id)
        .fetch_all(self.0)
        .await?;

        Ok(models.iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;
    use crate::database::testing::memory_pool;
    use crate::ledger::domain::amount::Rate;
    use crate::loans::commands::{sqlite::SqliteCommands, LoanCommands};
    use crate::loans::domain::repayments::NewRepayment;
    use crate::loans::domain::{InterestMethod, NewLoan};
    use crate::testing::fixtures::{self, LoanFixture};

    async fn disburse(pool: &SqlitePool, fixture: &LoanFixture, principal_minor: i64) -> Loan {
        SqliteCommands(pool)
            .create_loan(
                NewLoan::new(
                    fixture.member_id,
                    fixture.product_id,
                    Amount::from_minor(principal_minor),
                    Rate::from_basis_points(1200),
                    InterestMethod::Flat,
                    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                    12,
                    fixture.principal_account_id,
                    fixture.interest_account_id,
                )
                .unwrap(),
                None,
            )
            .await
            .expect("failed to disburse loan")
    }

    #[tokio::test]
    async fn balance_is_principal_minus_allocable_repayments() {
        let pool = memory_pool().await;
        let fixture = fixtures::member_with_loan_context(&pool).await;

        // 10,000.00 disbursed, 3,000.00 repaid.
        let loan = disburse(&pool, &fixture, 1_000_000).await;
        SqliteCommands(&pool)
            .record_repayment(
                NewRepayment::new(
                    loan.id,
                    NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                    Amount::from_minor(300_000),
                    Amount::from_minor(290_000),
                    Amount::from_minor(10_000),
                    String::new(),
                )
                .unwrap(),
                None,
            )
            .await
            .expect("failed to record repayment");

        let balance = SqliteQueries(&pool)
            .loan_balance(loan.id)
            .await
            .expect("failed to compute balance");

        assert_eq!(Some(Amount::from_minor(700_000)), balance);
    }

    #[tokio::test]
    async fn fresh_loan_balance_is_the_full_principal() {
        let pool = memory_pool().await;
        let fixture = fixtures::member_with_loan_context(&pool).await;

        let loan = disburse(&pool, &fixture, 500_000).await;

        let balance = SqliteQueries(&pool)
            .loan_balance(loan.id)
            .await
            .expect("failed to compute balance");

        assert_eq!(Some(Amount::from_minor(500_000)), balance);
    }

    #[tokio::test]
    async fn missing_loan_has_no_balance() {
        let pool = memory_pool().await;

        let balance = SqliteQueries(&pool)
            .loan_balance(999)
            .await
            .expect("failed to compute balance");

        assert_eq!(None, balance);
    }

    #[tokio::test]
    async fn schedule_is_ordered_by_due_date() {
        let pool = memory_pool().await;
        let fixture = fixtures::member_with_loan_context(&pool).await;

        let loan = disburse(&pool, &fixture, 120_000).await;

        let schedule = SqliteQueries(&pool)
            .loan_schedule(loan.id)
            .await
            .expect("failed to fetch schedule");

        assert_eq!(12, schedule.len());
        assert!(schedule.windows(2).all(|pair| pair[0].due_date <= pair[1].due_date));

        for row in &schedule {
            assert_eq!(row.total_due, row.principal_due + row.interest_due);
        }
    }
}
