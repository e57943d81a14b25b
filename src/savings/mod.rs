//! Member savings accounts and their transactions.
//!
//! Every savings transaction posts a mirroring journal entry against the
//! members-savings liability account, so the general ledger and the savings
//! book can never disagree.

pub mod commands;
pub mod domain;
pub mod models;
pub mod queries;
