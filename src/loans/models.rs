use chrono::NaiveDate;

use crate::ledger::domain::amount::{Amount, Rate};

use super::domain;

#[derive(Debug, sqlx::FromRow)]
pub struct LoanProduct {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub annual_rate_bps: i64,
    pub interest_method: String,
    pub default_tenor_months: i64,
}

impl TryFrom<&LoanProduct> for domain::LoanProduct {
    type Error = anyhow::Error;

    fn try_from(model: &LoanProduct) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            annual_rate: Rate::from_basis_points(model.annual_rate_bps),
            interest_method: model.interest_method.parse()?,
            default_tenor_months: u32::try_from(model.default_tenor_months)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct Loan {
    pub id: i64,
    pub member_id: i64,
    pub product_id: i64,
    pub principal: i64,
    pub annual_rate_bps: i64,
    pub interest_method: String,
    pub disbursed_on: NaiveDate,
    pub tenor_months: i64,
    pub status: String,
    pub principal_account_id: i64,
    pub interest_account_id: i64,
    pub journal_entry_id: Option<i64>,
}

impl TryFrom<&Loan> for domain::Loan {
    type Error = anyhow::Error;

    fn try_from(model: &Loan) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            member_id: model.member_id,
            product_id: model.product_id,
            principal: Amount::from_minor(model.principal),
            annual_rate: Rate::from_basis_points(model.annual_rate_bps),
            interest_method: model.interest_method.parse()?,
            disbursed_on: model.disbursed_on,
            tenor_months: u32::try_from(model.tenor_months)?,
            status: model.status.parse()?,
            principal_account_id: model.principal_account_id,
            interest_account_id: model.interest_account_id,
            journal_entry_id: model.journal_entry_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScheduleRow {
    pub id: i64,
    pub loan_id: i64,
    pub installment_no: i64,
    pub due_date: NaiveDate,
    pub principal_due: i64,
    pub interest_due: i64,
    pub total_due: i64,
    pub paid: bool,
}

impl TryFrom<&ScheduleRow> for domain::schedule::ScheduleEntry {
    type Error = anyhow::Error;

    fn try_from(model: &ScheduleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            loan_id: model.loan_id,
            installment_no: u32::try_from(model.installment_no)?,
            due_date: model.due_date,
            principal_due: Amount::from_minor(model.principal_due),
            interest_due: Amount::from_minor(model.interest_due),
            total_due: Amount::from_minor(model.total_due),
            paid: model.paid,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LoanRepayment {
    pub id: i64,
    pub loan_id: i64,
    pub date: NaiveDate,
    pub amount: i64,
    pub principal_component: i64,
    pub interest_component: i64,
    pub excess_to_savings: i64,
    pub source: String,
    pub journal_entry_id: Option<i64>,
}

impl From<&LoanRepayment> for domain::LoanRepayment {
    fn from(model: &LoanRepayment) -> Self {
        Self {
            id: model.id,
            loan_id: model.loan_id,
            date: model.date,
            amount: Amount::from_minor(model.amount),
            principal_component: Amount::from_minor(model.principal_component),
            interest_component: Amount::from_minor(model.interest_component),
            excess_to_savings: Amount::from_minor(model.excess_to_savings),
            source: model.source.clone(),
            journal_entry_id: model.journal_entry_id,
        }
    }
}
