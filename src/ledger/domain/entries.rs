use chrono::{DateTime, NaiveDate, Utc};

use super::amount::Amount;

/// A journal line entered by a user, not yet validated.
pub struct NewJournalLine {
    pub account_id: i64,
    pub debit: Amount,
    pub credit: Amount,
}

/// A journal entry about to be posted. This may only be constructed through
/// [`Self::new()`], which refuses empty, malformed, or unbalanced line sets,
/// so holding a value of this type is proof the entry balances.
#[derive(Clone, Debug, PartialEq)]
pub struct NewJournalEntry {
    date: NaiveDate,
    memo: String,
    reference: String,
    posted: bool,
    created_by: Option<String>,
    lines: Vec<JournalLine>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NewEntryError {
    /// The entry has no lines at all.
    #[error("a journal entry requires at least one line")]
    Empty,
    /// A line must carry exactly one of a positive debit or a positive
    /// credit; the other side must be exactly zero.
    #[error("line {index} must have exactly one of debit or credit set")]
    InvalidLine { index: usize },
    /// Total debits and total credits differ. Both sums are carried so the
    /// caller can report the discrepancy.
    #[error("entry does not balance: debits {debits}, credits {credits}")]
    Unbalanced { debits: Amount, credits: Amount },
}

impl NewJournalEntry {
    /// Validate and construct a journal entry.
    ///
    /// # Arguments
    /// * `date` - The date the entry is effective.
    /// * `memo` - A free-form description.
    /// * `reference` - An external reference such as a voucher number.
    /// * `posted` - Whether the entry is posted or a draft.
    /// * `created_by` - The user recording the entry, passed explicitly.
    /// * `lines` - The debit/credit lines. Each must have exactly one side
    ///   strictly positive, and the sides must sum to equal totals.
    pub fn new(
        date: NaiveDate,
        memo: String,
        reference: String,
        posted: bool,
        created_by: Option<String>,
        lines: Vec<NewJournalLine>,
    ) -> Result<Self, NewEntryError> {
        if lines.is_empty() {
            return Err(NewEntryError::Empty);
        }

        for (index, line) in lines.iter().enumerate() {
            let debit_set = line.debit.is_positive();
            let credit_set = line.credit.is_positive();

            if line.debit.is_negative() || line.credit.is_negative() || debit_set == credit_set {
                return Err(NewEntryError::InvalidLine { index });
            }
        }

        let debits: Amount = lines.iter().map(|line| line.debit).sum();
        let credits: Amount = lines.iter().map(|line| line.credit).sum();

        // Exact equality in minor units; currency amounts carry no epsilon.
        if debits != credits {
            return Err(NewEntryError::Unbalanced { debits, credits });
        }

        let validated_lines = lines
            .iter()
            .map(|line| JournalLine::new(line.account_id, line.debit, line.credit))
            .collect();

        Ok(Self {
            date,
            memo,
            reference,
            posted,
            created_by,
            lines: validated_lines,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn posted(&self) -> bool {
        self.posted
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }
}

/// A validated debit or credit against a single account.
#[derive(Clone, Debug, PartialEq)]
pub struct JournalLine {
    account_id: i64,
    debit: Amount,
    credit: Amount,
}

impl JournalLine {
    pub(crate) fn new(account_id: i64, debit: Amount, credit: Amount) -> Self {
        Self {
            account_id,
            debit,
            credit,
        }
    }

    /// A line carrying the full debit amount.
    pub fn debit(account_id: i64, amount: Amount) -> NewJournalLine {
        NewJournalLine {
            account_id,
            debit: amount,
            credit: Amount::ZERO,
        }
    }

    /// A line carrying the full credit amount.
    pub fn credit(account_id: i64, amount: Amount) -> NewJournalLine {
        NewJournalLine {
            account_id,
            debit: Amount::ZERO,
            credit: amount,
        }
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    pub fn debit_amount(&self) -> Amount {
        self.debit
    }

    pub fn credit_amount(&self) -> Amount {
        self.credit
    }
}

/// A committed journal entry read back from storage.
#[derive(Debug)]
pub struct JournalEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub memo: String,
    pub reference: String,
    pub posted: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry_with_lines(lines: Vec<NewJournalLine>) -> Result<NewJournalEntry, NewEntryError> {
        NewJournalEntry::new(
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            "Test entry".to_owned(),
            "REF-1".to_owned(),
            true,
            Some("clerk".to_owned()),
            lines,
        )
    }

    #[test]
    fn balanced_entry_is_accepted() {
        let entry = entry_with_lines(vec![
            JournalLine::debit(1, Amount::from_minor(10_000)),
            JournalLine::credit(2, Amount::from_minor(10_000)),
        ])
        .expect("balanced entry should be accepted");

        assert_eq!(2, entry.lines().len());
        assert_eq!(Amount::from_minor(10_000), entry.lines()[0].debit_amount());
        assert_eq!(Amount::ZERO, entry.lines()[0].credit_amount());
    }

    #[test]
    fn balanced_entry_with_split_lines() {
        let entry = entry_with_lines(vec![
            JournalLine::debit(1, Amount::from_minor(7_000)),
            JournalLine::debit(3, Amount::from_minor(3_000)),
            JournalLine::credit(2, Amount::from_minor(10_000)),
        ])
        .expect("split entry should be accepted");

        assert_eq!(3, entry.lines().len());
    }

    #[test]
    fn empty_entry_is_rejected() {
        let error = entry_with_lines(vec![]).expect_err("empty entry should be rejected");

        assert_eq!(NewEntryError::Empty, error);
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let error = entry_with_lines(vec![
            JournalLine::debit(1, Amount::from_minor(10_000)),
            JournalLine::credit(2, Amount::from_minor(9_000)),
        ])
        .expect_err("unbalanced entry should be rejected");

        assert_eq!(
            NewEntryError::Unbalanced {
                debits: Amount::from_minor(10_000),
                credits: Amount::from_minor(9_000),
            },
            error
        );
    }

    #[test]
    fn line_with_both_sides_is_rejected() {
        let error = entry_with_lines(vec![
            NewJournalLine {
                account_id: 1,
                debit: Amount::from_minor(5_000),
                credit: Amount::from_minor(5_000),
            },
            JournalLine::credit(2, Amount::ZERO),
        ])
        .expect_err("line with both sides should be rejected");

        assert_eq!(NewEntryError::InvalidLine { index: 0 }, error);
    }

    #[test]
    fn line_with_neither_side_is_rejected() {
        let error = entry_with_lines(vec![
            JournalLine::debit(1, Amount::from_minor(100)),
            NewJournalLine {
                account_id: 2,
                debit: Amount::ZERO,
                credit: Amount::ZERO,
            },
        ])
        .expect_err("line with neither side should be rejected");

        assert_eq!(NewEntryError::InvalidLine { index: 1 }, error);
    }

    #[test]
    fn line_with_negative_amount_is_rejected() {
        let error = entry_with_lines(vec![
            JournalLine::debit(1, Amount::from_minor(-100)),
            JournalLine::credit(2, Amount::from_minor(-100)),
        ])
        .expect_err("negative amounts should be rejected");

        assert_eq!(NewEntryError::InvalidLine { index: 0 }, error);
    }
}
