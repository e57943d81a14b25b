//! Member records, the unified member-transaction ledger, and the
//! synchronizer that keeps it mirroring source transactions.

pub mod commands;
pub mod domain;
pub mod models;
pub mod queries;
