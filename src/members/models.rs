use chrono::{DateTime, NaiveDate, Utc};

use crate::ledger::domain::amount::Amount;

use super::domain;

#[derive(Debug, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub member_no: String,
    pub payroll_no: Option<String>,
    pub full_name: String,
    pub id_number: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub joined_on: Option<NaiveDate>,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Member> for domain::Member {
    type Error = anyhow::Error;

    fn try_from(model: &Member) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            member_no: model.member_no.clone(),
            payroll_no: model.payroll_no.clone(),
            full_name: model.full_name.clone(),
            id_number: model.id_number.clone(),
            phone: model.phone.clone(),
            email: model.email.clone(),
            address: model.address.clone(),
            joined_on: model.joined_on,
            status: model.status.parse()?,
            notes: model.notes.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MemberTransaction {
    pub id: i64,
    pub member_id: i64,
    pub date: NaiveDate,
    pub amount: i64,
    pub description: String,
    pub transaction_type: String,
    pub source_model: String,
    pub source_id: i64,
    pub journal_entry_id: Option<i64>,
}

impl From<&MemberTransaction> for domain::MemberTransaction {
    fn from(model: &MemberTransaction) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            date: model.date,
            amount: Amount::from_minor(model.amount),
            description: model.description.clone(),
            transaction_type: model.transaction_type.clone(),
            source_model: model.source_model.clone(),
            source_id: model.source_id,
            journal_entry_id: model.journal_entry_id,
        }
    }
}
