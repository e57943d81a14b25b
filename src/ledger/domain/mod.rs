pub mod accounts;
pub mod amount;
pub mod entries;
