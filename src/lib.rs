//! A bookkeeping engine for a savings-and-credit cooperative's back office.
//!
//! The general ledger is the source of truth: every savings transaction,
//! loan disbursement, and repayment posts a balanced double-entry journal
//! entry, and every balance is derived by summing history rather than read
//! from a stored total. Each bounded context exposes its write operations as
//! a commands trait and its reads as a queries trait, both backed by SQLite.

pub mod cli;
pub mod database;
pub mod ledger;
pub mod loans;
pub mod members;
pub mod receipts;
pub mod savings;

#[cfg(test)]
pub(crate) mod testing;
