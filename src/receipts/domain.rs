use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::domain::accounts::UnknownVariant;
use crate::ledger::domain::amount::Amount;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ReceiptKind {
    Loan,
    Savings,
}

impl ReceiptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loan => "LOAN",
            Self::Savings => "SAVINGS",
        }
    }
}

impl fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiptKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOAN" => Ok(Self::Loan),
            "SAVINGS" => Ok(Self::Savings),
            other => Err(UnknownVariant("receipt kind", other.to_owned())),
        }
    }
}

/// A receipt about to be issued for a committed payment.
#[derive(Clone, Debug)]
pub struct NewReceipt {
    pub member_id: i64,
    pub kind: ReceiptKind,
    pub amount: Amount,
    pub payment_method: String,
    pub reference_note: String,
    pub loan_repayment_id: Option<i64>,
    pub savings_transaction_id: Option<i64>,
    pub journal_entry_id: Option<i64>,
    pub issued_by: Option<String>,
}

/// An issued receipt. The receipt number is generated once at issue time and
/// never changes; the record itself is immutable.
#[derive(Clone, Debug, Serialize)]
pub struct Receipt {
    pub id: i64,
    pub receipt_no: String,
    pub member_id: i64,
    pub kind: ReceiptKind,
    pub amount: Amount,
    pub issued_on: DateTime<Utc>,
    pub payment_method: String,
    pub reference_note: String,
    pub loan_repayment_id: Option<i64>,
    pub savings_transaction_id: Option<i64>,
    pub journal_entry_id: Option<i64>,
    pub issued_by: Option<String>,
}
