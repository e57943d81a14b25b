//! The chart of accounts and double-entry journal: account CRUD, the posting
//! engine, and derived account balances.

pub mod commands;
pub mod domain;
pub mod models;
pub mod queries;
