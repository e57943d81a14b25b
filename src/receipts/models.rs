use chrono::{DateTime, Utc};

use crate::ledger::domain::amount::Amount;

use super::domain;

#[derive(Debug, sqlx::FromRow)]
pub struct Receipt {
    pub id: i64,
    pub receipt_no: String,
    pub member_id: i64,
    pub kind: String,
    pub amount: i64,
    pub issued_on: DateTime<Utc>,
    pub payment_method: String,
    pub reference_note: String,
    pub loan_repayment_id: Option<i64>,
    pub savings_transaction_id: Option<i64>,
    pub journal_entry_id: Option<i64>,
    pub issued_by: Option<String>,
}

impl TryFrom<&Receipt> for domain::Receipt {
    type Error = anyhow::Error;

    fn try_from(model: &Receipt) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            receipt_no: model.receipt_no.clone(),
            member_id: model.member_id,
            kind: model.kind.parse()?,
            amount: Amount::from_minor(model.amount),
            issued_on: model.issued_on,
            payment_method: model.payment_method.clone(),
            reference_note: model.reference_note.clone(),
            loan_repayment_id: model.loan_repayment_id,
            savings_transaction_id: model.savings_transaction_id,
            journal_entry_id: model.journal_entry_id,
            issued_by: model.issued_by.clone(),
        })
    }
}
