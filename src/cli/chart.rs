//! Seeding for a starter chart of accounts.
//!
//! Every role account the posting commands resolve through report tags is
//! created here, so a freshly migrated database can record savings and loan
//! activity immediately. Seeding is idempotent: accounts whose codes already
//! exist are left untouched.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::ledger::commands::{sqlite::SqliteCommands, AccountCommandError, LedgerCommands};
use crate::ledger::domain::accounts::{Account, AccountType, NewAccount, ReportTag};

const DEFAULT_CHART: &[(&str, &str, AccountType, Option<ReportTag>)] = &[
    (
        "1000",
        "Cash at Bank",
        AccountType::Asset,
        Some(ReportTag::AssetCashEquity),
    ),
    (
        "1100",
        "Loans to Members",
        AccountType::Asset,
        Some(ReportTag::AssetLoansPrincipal),
    ),
    (
        "1150",
        "Loan Interest Receivable",
        AccountType::Asset,
        Some(ReportTag::AssetLoanInterest),
    ),
    (
        "1200",
        "Receivable - Highlands",
        AccountType::Asset,
        Some(ReportTag::AssetReceivableHighlands),
    ),
    (
        "2000",
        "Members Savings",
        AccountType::Liability,
        Some(ReportTag::LiabMembersSavings),
    ),
    (
        "2100",
        "Accounts Payable",
        AccountType::Liability,
        Some(ReportTag::LiabAccountsPayable),
    ),
    (
        "3000",
        "Share Capital",
        AccountType::Equity,
        Some(ReportTag::EquityShareCapital),
    ),
    (
        "3100",
        "Retained Earnings",
        AccountType::Equity,
        Some(ReportTag::EquityRetainedEarnings),
    ),
    (
        "3200",
        "Current Year Surplus",
        AccountType::Equity,
        Some(ReportTag::EquityCurrentYearSurplus),
    ),
    (
        "4000",
        "Interest on Loans",
        AccountType::Income,
        Some(ReportTag::IncomeInterestOnLoans),
    ),
    (
        "4100",
        "Donations",
        AccountType::Income,
        Some(ReportTag::IncomeDonation),
    ),
    (
        "4200",
        "LAP Forms",
        AccountType::Income,
        Some(ReportTag::IncomeLapForms),
    ),
    (
        "4300",
        "Registration Fees",
        AccountType::Income,
        Some(ReportTag::IncomeRegistrationFees),
    ),
    (
        "5000",
        "Bank Charges",
        AccountType::Expense,
        Some(ReportTag::ExpBankCharges),
    ),
    (
        "5100",
        "Meeting Expenses",
        AccountType::Expense,
        Some(ReportTag::ExpMeeting),
    ),
    (
        "5200",
        "Accountancy",
        AccountType::Expense,
        Some(ReportTag::ExpAccountancy),
    ),
    (
        "5300",
        "AGM Expenses",
        AccountType::Expense,
        Some(ReportTag::ExpAgm),
    ),
    (
        "5400",
        "Bad Debt Provision",
        AccountType::Expense,
        Some(ReportTag::ExpBadDebtProvision),
    ),
    (
        "5500",
        "Honoraria",
        AccountType::Expense,
        Some(ReportTag::ExpHonoraria),
    ),
    (
        "5600",
        "Audit Fees",
        AccountType::Expense,
        Some(ReportTag::ExpAuditFees),
    ),
    (
        "5700",
        "Interest on Savings",
        AccountType::Expense,
        Some(ReportTag::ExpSavingsInterest),
    ),
];

/// Create any default accounts that do not already exist, returning the ones
/// created by this call.
pub async fn seed_chart(pool: &SqlitePool) -> anyhow::Result<Vec<Account>> {
    let commands = SqliteCommands(pool);
    let mut created = Vec::new();

    for &(code, name, account_type, report_tag) in DEFAULT_CHART {
        let account = NewAccount::new(
            code.to_owned(),
            name.to_owned(),
            account_type,
            None,
            report_tag,
        )?;

        match commands.create_account(account).await {
            Ok(account) => created.push(account),
            Err(AccountCommandError::DuplicateCode(code)) => {
                debug!(%code, "Account already exists, skipping.");
            }
            Err(other) => return Err(other.into()),
        }
    }

    info!(created = created.len(), "Seeded chart of accounts.");

    Ok(created)
}
