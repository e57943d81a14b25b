use chrono::NaiveDate;

use crate::ledger::domain::amount::Amount;

use super::domain;

#[derive(Debug, sqlx::FromRow)]
pub struct SavingsAccount {
    pub id: i64,
    pub member_id: i64,
    pub account_id: i64,
    pub opened_on: NaiveDate,
    pub active: bool,
}

impl From<&SavingsAccount> for domain::SavingsAccount {
    fn from(model: &SavingsAccount) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            account_id: model.account_id,
            opened_on: model.opened_on,
            active: model.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SavingsTransaction {
    pub id: i64,
    pub savings_account_id: i64,
    pub date: NaiveDate,
    pub kind: String,
    pub amount: i64,
    pub journal_entry_id: Option<i64>,
    pub notes: String,
    pub source: String,
}

impl TryFrom<&SavingsTransaction> for domain::SavingsTransaction {
    type Error = anyhow::Error;

    fn try_from(model: &SavingsTransaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            savings_account_id: model.savings_account_id,
            date: model.date,
            kind: model.kind.parse()?,
            amount: Amount::from_minor(model.amount),
            journal_entry_id: model.journal_entry_id,
            notes: model.notes.clone(),
            source: model.source.clone(),
        })
    }
}
