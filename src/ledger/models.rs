//! Row structs for the chart of accounts and journal tables, plus their
//! conversions into domain types.

use chrono::{DateTime, NaiveDate, Utc};

use super::domain;
use super::domain::amount::Amount;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub r#type: String,
    pub parent_id: Option<i64>,
    pub report_tag: Option<String>,
}

impl TryFrom<&Account> for domain::accounts::Account {
    type Error = anyhow::Error;

    fn try_from(model: &Account) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            code: model.code.clone(),
            name: model.name.clone(),
            account_type: model.r#type.parse()?,
            parent_id: model.parent_id,
            report_tag: model.report_tag.as_deref().map(str::parse).transpose()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JournalEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub memo: String,
    pub reference: String,
    pub posted: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn into_domain(self, lines: &[JournalLine]) -> domain::entries::JournalEntry {
        domain::entries::JournalEntry {
            id: self.id,
            date: self.date,
            memo: self.memo,
            reference: self.reference,
            posted: self.posted,
            created_by: self.created_by,
            created_at: self.created_at,
            lines: lines.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct JournalLine {
    pub id: i64,
    pub entry_id: i64,
    pub account_id: i64,
    pub debit: i64,
    pub credit: i64,
}

impl From<&JournalLine> for domain::entries::JournalLine {
    fn from(model: &JournalLine) -> Self {
        Self::new(
            model.account_id,
            Amount::from_minor(model.debit),
            Amount::from_minor(model.credit),
        )
    }
}
