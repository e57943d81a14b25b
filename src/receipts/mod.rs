//! Immutable receipts issued for savings deposits and loan repayments.

pub mod commands;
pub mod domain;
pub mod models;
pub mod queries;
