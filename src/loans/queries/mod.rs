//! Read operations for loans. The outstanding balance is always derived from
//! the repayment history at read time.

pub mod sqlite;

use async_trait::async_trait;

use crate::ledger::domain::amount::Amount;

use super::domain::schedule::ScheduleEntry;
use super::domain::{Loan, LoanProduct, LoanRepayment};

#[async_trait]
pub trait LoanQueries {
    async fn get_loan(&self, loan_id: i64) -> anyhow::Result<Option<Loan>>;

    /// All of a member's loans, newest disbursement first.
    async fn member_loans(&self, member_id: i64) -> anyhow::Result<Vec<Loan>>;

    async fn get_product(&self, product_id: i64) -> anyhow::Result<Option<LoanProduct>>;

    /// All products, ordered by name.
    async fn list_products(&self) -> anyhow::Result<Vec<LoanProduct>>;

    /// The loan's outstanding balance: principal − Σ (repayment amount −
    /// excess routed to savings). A loan is fully paid at zero.
    ///
    /// # Returns
    ///
    /// `None` when the loan does not exist.
    async fn loan_balance(&self, loan_id: i64) -> anyhow::Result<Option<Amount>>;

    /// The amortization schedule, ordered by due date.
    async fn loan_schedule(&self, loan_id: i64) -> anyhow::Result<Vec<ScheduleEntry>>;

    /// Repayments against the loan, oldest first.
    async fn loan_repayments(&self, loan_id: i64) -> anyhow::Result<Vec<LoanRepayment>>;
}
