use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The five fundamental account categories.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    /// Whether the account grows on the debit side. Asset and expense
    /// accounts are debit-normal; liability, equity, and income accounts are
    /// credit-normal.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(UnknownVariant("account type", other.to_owned())),
        }
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
#[error("'{1}' is not a recognized {0}")]
pub struct UnknownVariant(pub &'static str, pub String);

/// Classification labels binding specific accounts to specific reporting or
/// business roles, e.g. "the" loans-principal account.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ReportTag {
    // Income statement.
    IncomeInterestOnLoans,
    IncomeDonation,
    IncomeLapForms,
    IncomeRegistrationFees,
    ExpBankCharges,
    ExpMeeting,
    ExpAccountancy,
    ExpAgm,
    ExpBadDebtProvision,
    ExpHonoraria,
    ExpAuditFees,
    ExpSavingsInterest,

    // Balance sheet.
    AssetCashEquity,
    AssetLoansPrincipal,
    AssetLoanInterest,
    AssetReceivableHighlands,
    LiabMembersSavings,
    LiabAccountsPayable,
    EquityShareCapital,
    EquityRetainedEarnings,
    EquityCurrentYearSurplus,
}

impl ReportTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeInterestOnLoans => "INCOME_INTEREST_ON_LOANS",
            Self::IncomeDonation => "INCOME_DONATION",
            Self::IncomeLapForms => "INCOME_LAP_FORMS",
            Self::IncomeRegistrationFees => "INCOME_REGISTRATION_FEES",
            Self::ExpBankCharges => "EXP_BANK_CHARGES",
            Self::ExpMeeting => "EXP_MEETING",
            Self::ExpAccountancy => "EXP_ACCOUNTANCY",
            Self::ExpAgm => "EXP_AGM",
            Self::ExpBadDebtProvision => "EXP_BAD_DEBT_PROVISION",
            Self::ExpHonoraria => "EXP_HONORARIA",
            Self::ExpAuditFees => "EXP_AUDIT_FEES",
            Self::ExpSavingsInterest => "EXP_SAVINGS_INTEREST",
            Self::AssetCashEquity => "ASSET_CASH_EQUITY",
            Self::AssetLoansPrincipal => "ASSET_LOANS_PRINCIPAL",
            Self::AssetLoanInterest => "ASSET_LOAN_INTEREST",
            Self::AssetReceivableHighlands => "ASSET_RECEIVABLE_HIGHLANDS",
            Self::LiabMembersSavings => "LIAB_MEMBERS_SAVINGS",
            Self::LiabAccountsPayable => "LIAB_ACCOUNTS_PAYABLE",
            Self::EquityShareCapital => "EQUITY_SHARE_CAPITAL",
            Self::EquityRetainedEarnings => "EQUITY_RETAINED_EARNINGS",
            Self::EquityCurrentYearSurplus => "EQUITY_CURRENT_YEAR_SURPLUS",
        }
    }
}

impl fmt::Display for ReportTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportTag {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INCOME_INTEREST_ON_LOANS" => Ok(Self::IncomeInterestOnLoans),
            "INCOME_DONATION" => Ok(Self::IncomeDonation),
            "INCOME_LAP_FORMS" => Ok(Self::IncomeLapForms),
            "INCOME_REGISTRATION_FEES" => Ok(Self::IncomeRegistrationFees),
            "EXP_BANK_CHARGES" => Ok(Self::ExpBankCharges),
            "EXP_MEETING" => Ok(Self::ExpMeeting),
            "EXP_ACCOUNTANCY" => Ok(Self::ExpAccountancy),
            "EXP_AGM" => Ok(Self::ExpAgm),
            "EXP_BAD_DEBT_PROVISION" => Ok(Self::ExpBadDebtProvision),
            "EXP_HONORARIA" => Ok(Self::ExpHonoraria),
            "EXP_AUDIT_FEES" => Ok(Self::ExpAuditFees),
            "EXP_SAVINGS_INTEREST" => Ok(Self::ExpSavingsInterest),
            "ASSET_CASH_EQUITY" => Ok(Self::AssetCashEquity),
            "ASSET_LOANS_PRINCIPAL" => Ok(Self::AssetLoansPrincipal),
            "ASSET_LOAN_INTEREST" => Ok(Self::AssetLoanInterest),
            "ASSET_RECEIVABLE_HIGHLANDS" => Ok(Self::AssetReceivableHighlands),
            "LIAB_MEMBERS_SAVINGS" => Ok(Self::LiabMembersSavings),
            "LIAB_ACCOUNTS_PAYABLE" => Ok(Self::LiabAccountsPayable),
            "EQUITY_SHARE_CAPITAL" => Ok(Self::EquityShareCapital),
            "EQUITY_RETAINED_EARNINGS" => Ok(Self::EquityRetainedEarnings),
            "EQUITY_CURRENT_YEAR_SURPLUS" => Ok(Self::EquityCurrentYearSurplus),
            other => Err(UnknownVariant("report tag", other.to_owned())),
        }
    }
}

/// A chart-of-accounts entry about to be created or updated.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAccount {
    code: String,
    name: String,
    account_type: AccountType,
    parent_id: Option<i64>,
    report_tag: Option<ReportTag>,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum NewAccountError {
    #[error("account code may not be blank")]
    BlankCode,
    #[error("account name may not be blank")]
    BlankName,
}

impl NewAccount {
    pub fn new(
        code: String,
        name: String,
        account_type: AccountType,
        parent_id: Option<i64>,
        report_tag: Option<ReportTag>,
    ) -> Result<Self, NewAccountError> {
        let code = code.trim().to_owned();
        if code.is_empty() {
            return Err(NewAccountError::BlankCode);
        }

        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(NewAccountError::BlankName);
        }

        Ok(Self {
            code,
            name,
            account_type,
            parent_id,
            report_tag,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn report_tag(&self) -> Option<ReportTag> {
        self.report_tag
    }
}

/// A stored chart-of-accounts entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<i64>,
    pub report_tag: Option<ReportTag>,
}
