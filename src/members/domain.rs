use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::ledger::domain::accounts::UnknownVariant;
use crate::ledger::domain::amount::Amount;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(UnknownVariant("member status", other.to_owned())),
        }
    }
}

/// A member record about to be created or updated.
///
/// Member numbers are normalized to uppercase on the way in so lookups and
/// the uniqueness constraint are case-insensitive in practice.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMember {
    member_no: String,
    payroll_no: Option<String>,
    full_name: String,
    pub id_number: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub joined_on: Option<NaiveDate>,
    pub status: MemberStatus,
    pub notes: String,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewMemberError {
    #[error("member number may not be blank")]
    BlankMemberNo,
    #[error("member name may not be blank")]
    BlankName,
}

impl NewMember {
    pub fn new(
        member_no: String,
        payroll_no: Option<String>,
        full_name: String,
    ) -> Result<Self, NewMemberError> {
        let member_no = member_no.trim().to_uppercase();
        if member_no.is_empty() {
            return Err(NewMemberError::BlankMemberNo);
        }

        let full_name = full_name.trim().to_owned();
        if full_name.is_empty() {
            return Err(NewMemberError::BlankName);
        }

        let payroll_no = payroll_no
            .map(|number| number.trim().to_uppercase())
            .filter(|number| !number.is_empty());

        Ok(Self {
            member_no,
            payroll_no,
            full_name,
            id_number: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            joined_on: None,
            status: MemberStatus::Active,
            notes: String::new(),
        })
    }

    pub fn member_no(&self) -> &str {
        &self.member_no
    }

    pub fn payroll_no(&self) -> Option<&str> {
        self.payroll_no.as_deref()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

/// A stored member record.
#[derive(Clone, Debug, Serialize)]
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
    pub status: MemberStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The kinds of source records the unified member ledger mirrors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceModel {
    SavingsTransaction,
    LoanRepayment,
}

impl SourceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SavingsTransaction => "SavingsTransaction",
            Self::LoanRepayment => "LoanRepayment",
        }
    }
}

impl fmt::Display for SourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The idempotency key for a member-transaction row: the source record it
/// mirrors. Re-syncing the same source overwrites rather than duplicates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SourceRef {
    pub model: SourceModel,
    pub id: i64,
}

/// The payload upserted into the unified member ledger for one source record.
#[derive(Clone, Debug)]
pub struct MemberTransactionSync {
    pub source: SourceRef,
    pub member_id: i64,
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: String,
    pub transaction_type: String,
    pub journal_entry_id: Option<i64>,
}

/// A denormalized row in a member's unified transaction history.
#[derive(Clone, Debug, Serialize)]
pub struct MemberTransaction {
    pub id: i64,
    pub member_id: i64,
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: String,
    pub transaction_type: String,
    pub source_model: String,
    pub source_id: i64,
    pub journal_entry_id: Option<i64>,
}

/// A member's derived financial position. Every figure is a sum over
/// transaction history computed at read time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct MemberFinancialSummary {
    pub total_savings: Amount,
    pub total_loans: Amount,
    pub total_paid: Amount,
    pub loan_balance: Amount,
}
