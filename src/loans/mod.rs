//! Loan products, loans, amortization schedules, and repayments.
//!
//! Loans snapshot their product's terms at disbursement, post mirroring
//! journal entries for every movement of money, and derive the outstanding
//! balance from repayment history. Overpayments are routed into the member's
//! savings account rather than applied to the loan.

pub mod commands;
pub mod domain;
pub mod models;
pub mod queries;
