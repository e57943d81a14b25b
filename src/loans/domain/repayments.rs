//! Repayment allocation rules.

use chrono::NaiveDate;

use crate::ledger::domain::amount::Amount;

/// A repayment about to be recorded, before allocation against the loan's
/// outstanding balance.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRepayment {
    loan_id: i64,
    date: NaiveDate,
    amount: Amount,
    principal_component: Amount,
    interest_component: Amount,
    source: String,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewRepaymentError {
    #[error("repayment amount must be positive, got {0}")]
    NonPositiveAmount(Amount),
    #[error("repayment components may not be negative")]
    NegativeComponent,
}

impl NewRepayment {
    pub fn new(
        loan_id: i64,
        date: NaiveDate,
        amount: Amount,
        principal_component: Amount,
        interest_component: Amount,
        source: String,
    ) -> Result<Self, NewRepaymentError> {
        if !amount.is_positive() {
            return Err(NewRepaymentError::NonPositiveAmount(amount));
        }

        if principal_component.is_negative() || interest_component.is_negative() {
            return Err(NewRepaymentError::NegativeComponent);
        }

        Ok(Self {
            loan_id,
            date,
            amount,
            principal_component,
            interest_component,
            source,
        })
    }

    pub fn loan_id(&self) -> i64 {
        self.loan_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn principal_component(&self) -> Amount {
        self.principal_component
    }

    pub fn interest_component(&self) -> Amount {
        self.interest_component
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// How a repayment splits across the loan and the member's savings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RepaymentAllocation {
    pub principal: Amount,
    pub interest: Amount,
    /// The portion above the outstanding balance, routed into savings rather
    /// than applied to the loan.
    pub excess: Amount,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum AllocationError {
    /// The principal and interest components must split exactly the portion
    /// of the payment the loan can absorb.
    #[error("components must sum to {allocable}, got {supplied}")]
    InvalidAllocation { allocable: Amount, supplied: Amount },
}

/// Allocate a repayment against the outstanding balance.
///
/// Anything paid beyond the outstanding balance is excess bound for the
/// member's savings account; the declared principal and interest components
/// must account for the remainder exactly.
pub fn allocate(
    outstanding: Amount,
    amount: Amount,
    principal_component: Amount,
    interest_component: Amount,
) -> Result<RepaymentAllocation, AllocationError> {
    let excess = (amount - outstanding).clamp_non_negative();
    let allocable = amount - excess;
    let supplied = principal_component + interest_component;

    if supplied != allocable {
        return Err(AllocationError::InvalidAllocation { allocable, supplied });
    }

    Ok(RepaymentAllocation {
        principal: principal_component,
        interest: interest_component,
        excess,
    })
}
