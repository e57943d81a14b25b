//! Write operations for loan products, loans, schedules, and repayments.
//!
//! Commands own their transaction boundaries: the journal entry, the loan or
//! repayment row, the schedule, the member-ledger sync, and any receipt all
//! land in one database transaction or not at all.

pub mod sqlite;

use async_trait::async_trait;

use crate::ledger::domain::accounts::ReportTag;
use crate::ledger::queries::ReportTagLookupError;

use super::domain::repayments::{AllocationError, NewRepayment};
use super::domain::schedule::ScheduleEntry;
use super::domain::{Loan, LoanProduct, LoanRepayment, LoanStatus, NewLoan, NewLoanProduct};

#[derive(Debug, thiserror::Error)]
pub enum LoanCommandError {
    #[error("a loan product with that name already exists")]
    DuplicateProductName,
    /// The nominated ledger account does not carry the report tag its role
    /// requires.
    #[error("ledger account must carry the {0} report tag")]
    MissingReportTag(ReportTag),
    /// A role account needed for the posting (cash, interest income,
    /// members savings) is not configured in the chart of accounts.
    #[error(transparent)]
    AccountLookup(#[from] ReportTagLookupError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    /// An overpayment needs an active savings account to route the excess
    /// into, and the member has none.
    #[error("member has no active savings account for the repayment excess")]
    NoSavingsAccount,
    /// A schedule row with this installment number already exists for the
    /// loan.
    #[error("schedule already contains this installment")]
    DuplicateInstallment,
    #[error("record does not exist")]
    NotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait LoanCommands {
    async fn create_product(
        &self,
        product: NewLoanProduct,
    ) -> Result<LoanProduct, LoanCommandError>;

    /// Disburse a loan.
    ///
    /// The nominated principal and interest accounts must carry the
    /// loans-principal and loan-interest report tags. In one database
    /// transaction this posts the disbursement journal entry (debit the loan
    /// principal account, credit cash), inserts the loan with its snapshot of
    /// the product terms, and persists the generated amortization schedule.
    async fn create_loan(
        &self,
        loan: NewLoan,
        recorded_by: Option<String>,
    ) -> Result<Loan, LoanCommandError>;

    /// Record a repayment against a loan.
    ///
    /// The declared principal and interest components must split the
    /// allocable portion of the payment exactly; anything above the
    /// outstanding balance is routed into the member's active savings account
    /// as a deposit. In one database transaction this posts the journal
    /// entry, inserts the repayment, syncs the member ledger, marks schedule
    /// installments covered by the cumulative amount repaid, closes the loan
    /// if the balance reaches zero, and issues a receipt.
    async fn record_repayment(
        &self,
        repayment: NewRepayment,
        recorded_by: Option<String>,
    ) -> Result<LoanRepayment, LoanCommandError>;

    /// Administrative status change. Closing on full repayment happens
    /// automatically inside [`Self::record_repayment`]; this exists for
    /// manual corrections and for marking defaults.
    async fn set_status(&self, loan_id: i64, status: LoanStatus)
        -> Result<Loan, LoanCommandError>;

    /// Regenerate the loan's schedule from its snapshot terms, replacing any
    /// unpaid rows. Paid rows are kept; a regenerated installment colliding
    /// with a kept one surfaces [`LoanCommandError::DuplicateInstallment`].
    async fn regenerate_schedule(
        &self,
        loan_id: i64,
    ) -> Result<Vec<ScheduleEntry>, LoanCommandError>;
}
