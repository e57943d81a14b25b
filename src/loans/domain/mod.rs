pub mod repayments;
pub mod schedule;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::domain::accounts::UnknownVariant;
use crate::ledger::domain::amount::{Amount, Rate};

/// How interest on a loan is computed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum InterestMethod {
    /// Interest accrues on the declining balance; installments are level
    /// payments.
    Reducing,
    /// Interest is a constant monthly fraction of the original principal.
    Flat,
}

impl InterestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reducing => "REDUCING",
            Self::Flat => "FLAT",
        }
    }
}

impl fmt::Display for InterestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterestMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REDUCING" => Ok(Self::Reducing),
            "FLAT" => Ok(Self::Flat),
            other => Err(UnknownVariant("interest method", other.to_owned())),
        }
    }
}

/// The loan lifecycle states. Loans start ACTIVE; repayment commands close a
/// loan automatically when its derived balance reaches zero, while DEFAULTED
/// is only ever set administratively.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum LoanStatus {
    Active,
    Closed,
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
            Self::Defaulted => "DEFAULTED",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "CLOSED" => Ok(Self::Closed),
            "DEFAULTED" => Ok(Self::Defaulted),
            other => Err(UnknownVariant("loan status", other.to_owned())),
        }
    }
}

/// A loan product about to be created. Products supply the default terms a
/// loan snapshots at creation time.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLoanProduct {
    name: String,
    description: String,
    annual_rate: Rate,
    interest_method: InterestMethod,
    default_tenor_months: u32,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewLoanProductError {
    #[error("product name may not be blank")]
    BlankName,
    #[error("default tenor must be at least one month")]
    NonPositiveTenor,
}

impl NewLoanProduct {
    pub fn new(
        name: String,
        description: String,
        annual_rate: Rate,
        interest_method: InterestMethod,
        default_tenor_months: u32,
    ) -> Result<Self, NewLoanProductError> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(NewLoanProductError::BlankName);
        }

        if default_tenor_months == 0 {
            return Err(NewLoanProductError::NonPositiveTenor);
        }

        Ok(Self {
            name,
            description,
            annual_rate,
            interest_method,
            default_tenor_months,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn interest_method(&self) -> InterestMethod {
        self.interest_method
    }

    pub fn default_tenor_months(&self) -> u32 {
        self.default_tenor_months
    }
}

/// A stored loan product.
#[derive(Clone, Debug, Serialize)]
pub struct LoanProduct {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub annual_rate: Rate,
    pub interest_method: InterestMethod,
    pub default_tenor_months: u32,
}

/// A loan about to be disbursed. The rate, method, and tenor are a snapshot
/// of the product's terms (possibly overridden), so later product edits never
/// change an existing loan.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLoan {
    member_id: i64,
    product_id: i64,
    principal: Amount,
    annual_rate: Rate,
    interest_method: InterestMethod,
    disbursed_on: NaiveDate,
    tenor_months: u32,
    principal_account_id: i64,
    interest_account_id: i64,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewLoanError {
    #[error("loan principal must be positive, got {0}")]
    NonPositivePrincipal(Amount),
    #[error("loan tenor must be at least one month")]
    NonPositiveTenor,
}

impl NewLoan {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        member_id: i64,
        product_id: i64,
        principal: Amount,
        annual_rate: Rate,
        interest_method: InterestMethod,
        disbursed_on: NaiveDate,
        tenor_months: u32,
        principal_account_id: i64,
        interest_account_id: i64,
    ) -> Result<Self, NewLoanError> {
        if !principal.is_positive() {
            return Err(NewLoanError::NonPositivePrincipal(principal));
        }

        if tenor_months == 0 {
            return Err(NewLoanError::NonPositiveTenor);
        }

        Ok(Self {
            member_id,
            product_id,
            principal,
            annual_rate,
            interest_method,
            disbursed_on,
            tenor_months,
            principal_account_id,
            interest_account_id,
        })
    }

    pub fn member_id(&self) -> i64 {
        self.member_id
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn principal(&self) -> Amount {
        self.principal
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn interest_method(&self) -> InterestMethod {
        self.interest_method
    }

    pub fn disbursed_on(&self) -> NaiveDate {
        self.disbursed_on
    }

    pub fn tenor_months(&self) -> u32 {
        self.tenor_months
    }

    pub fn principal_account_id(&self) -> i64 {
        self.principal_account_id
    }

    pub fn interest_account_id(&self) -> i64 {
        self.interest_account_id
    }
}

/// A stored loan. The balance is never stored; it is derived from the
/// repayment history.
#[derive(Clone, Debug, Serialize)]
pub struct Loan {
    pub id: i64,
    pub member_id: i64,
    pub product_id: i64,
    pub principal: Amount,
    pub annual_rate: Rate,
    pub interest_method: InterestMethod,
    pub disbursed_on: NaiveDate,
    pub tenor_months: u32,
    pub status: LoanStatus,
    pub principal_account_id: i64,
    pub interest_account_id: i64,
    pub journal_entry_id: Option<i64>,
}

/// A stored repayment against a loan.
#[derive(Clone, Debug, Serialize)]
pub struct LoanRepayment {
    pub id: i64,
    pub loan_id: i64,
    pub date: NaiveDate,
    pub amount: Amount,
    pub principal_component: Amount,
    pub interest_component: Amount,
    pub excess_to_savings: Amount,
    pub source: String,
    pub journal_entry_id: Option<i64>,
}
