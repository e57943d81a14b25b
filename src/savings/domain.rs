use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::domain::accounts::UnknownVariant;
use crate::ledger::domain::amount::Amount;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SavingsTransactionKind {
    Deposit,
    Withdrawal,
    Interest,
}

impl SavingsTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Interest => "INTEREST",
        }
    }

    /// The label used for this kind in the unified member ledger, e.g.
    /// "Savings Deposit".
    pub fn ledger_label(&self) -> &'static str {
        match self {
            Self::Deposit => "Savings Deposit",
            Self::Withdrawal => "Savings Withdrawal",
            Self::Interest => "Savings Interest",
        }
    }
}

impl fmt::Display for SavingsTransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SavingsTransactionKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            "INTEREST" => Ok(Self::Interest),
            other => Err(UnknownVariant("savings transaction kind", other.to_owned())),
        }
    }
}

/// A savings transaction about to be recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSavingsTransaction {
    savings_account_id: i64,
    kind: SavingsTransactionKind,
    amount: Amount,
    date: NaiveDate,
    notes: String,
    source: String,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewSavingsTransactionError {
    #[error("savings transaction amount must be positive, got {0}")]
    NonPositiveAmount(Amount),
}

impl NewSavingsTransaction {
    pub fn new(
        savings_account_id: i64,
        kind: SavingsTransactionKind,
        amount: Amount,
        date: NaiveDate,
        notes: String,
        source: String,
    ) -> Result<Self, NewSavingsTransactionError> {
        if !amount.is_positive() {
            return Err(NewSavingsTransactionError::NonPositiveAmount(amount));
        }

        Ok(Self {
            savings_account_id,
            kind,
            amount,
            date,
            notes,
            source,
        })
    }

    pub fn savings_account_id(&self) -> i64 {
        self.savings_account_id
    }

    pub fn kind(&self) -> SavingsTransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The description used for the member-ledger row: the notes when
    /// present, otherwise a generated fallback.
    pub fn ledger_description(&self) -> String {
        if self.notes.is_empty() {
            format!("{} via Savings", self.kind)
        } else {
            self.notes.clone()
        }
    }
}

/// A member's savings account, bound to the members-savings ledger account.
/// The balance is never stored; it is always derived from the transaction
/// history.
#[derive(Clone, Debug, Serialize)]
pub struct SavingsAccount {
    pub id: i64,
    pub member_id: i64,
    pub account_id: i64,
    pub opened_on: NaiveDate,
    pub active: bool,
}

/// A recorded savings transaction.
#[derive(Clone, Debug, Serialize)]
pub struct SavingsTransaction {
    pub id: i64,
    pub savings_account_id: i64,
    pub date: NaiveDate,
    pub kind: SavingsTransactionKind,
    pub amount: Amount,
    pub journal_entry_id: Option<i64>,
    pub notes: String,
    pub source: String,
}
