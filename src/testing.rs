//! Shared fixtures for storage-backed tests.

pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use sqlx::SqlitePool;

    use crate::ledger::commands::{sqlite::SqliteCommands as LedgerCommandsImpl, LedgerCommands};
    use crate::ledger::domain::accounts::{AccountType, NewAccount, ReportTag};
    use crate::ledger::domain::amount::Rate;
    use crate::loans::commands::{sqlite::SqliteCommands as LoanCommandsImpl, LoanCommands};
    use crate::loans::domain::{InterestMethod, NewLoanProduct};
    use crate::members::commands::{sqlite::SqliteCommands as MemberCommandsImpl, MemberCommands};
    use crate::members::domain::NewMember;
    use crate::savings::commands::{sqlite::SqliteCommands as SavingsCommandsImpl, SavingsCommands};

    pub(crate) struct SavingsFixture {
        pub member_id: i64,
        pub cash_account_id: i64,
        pub savings_gl_account_id: i64,
        pub savings_account_id: i64,
    }

    pub(crate) struct LoanFixture {
        pub member_id: i64,
        pub cash_account_id: i64,
        pub savings_gl_account_id: i64,
        pub savings_account_id: i64,
        pub principal_account_id: i64,
        pub interest_account_id: i64,
        pub interest_income_account_id: i64,
        pub product_id: i64,
    }

    pub(crate) async fn create_account(
        pool: &SqlitePool,
        code: &str,
        name: &str,
        account_type: AccountType,
        report_tag: Option<ReportTag>,
    ) -> i64 {
        LedgerCommandsImpl(pool)
            .create_account(
                NewAccount::new(code.to_owned(), name.to_owned(), account_type, None, report_tag)
                    .expect("fixture account should be valid"),
            )
            .await
            .expect("failed to create fixture account")
            .id
    }

    /// A member with an open savings account, plus the chart accounts the
    /// savings postings need.
    pub(crate) async fn member_with_savings(pool: &SqlitePool) -> SavingsFixture {
        let cash_account_id = create_account(
            pool,
            "1000",
            "Cash at Bank",
            AccountType::Asset,
            Some(ReportTag::AssetCashEquity),
        )
        .await;
        let savings_gl_account_id = create_account(
            pool,
            "2000",
            "Members Savings",
            AccountType::Liability,
            Some(ReportTag::LiabMembersSavings),
        )
        .await;
        create_account(
            pool,
            "5700",
            "Interest on Savings",
            AccountType::Expense,
            Some(ReportTag::ExpSavingsInterest),
        )
        .await;

        let member = MemberCommandsImpl(pool)
            .create_member(
                NewMember::new("M-100".to_owned(), None, "Jane Wanjiku".to_owned())
                    .expect("fixture member should be valid"),
            )
            .await
            .expect("failed to create fixture member");

        let savings_account = SavingsCommandsImpl(pool)
            .open_account(
                member.id,
                savings_gl_account_id,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .await
            .expect("failed to open fixture savings account");

        SavingsFixture {
            member_id: member.id,
            cash_account_id,
            savings_gl_account_id,
            savings_account_id: savings_account.id,
        }
    }

    /// Everything [`member_with_savings`] builds, plus the loan accounts and
    /// a 12% reducing-balance product.
    pub(crate) async fn member_with_loan_context(pool: &SqlitePool) -> LoanFixture {
        let savings = member_with_savings(pool).await;

        let principal_account_id = create_account(
            pool,
            "1100",
            "Loans to Members",
            AccountType::Asset,
            Some(ReportTag::AssetLoansPrincipal),
        )
        .await;
        let interest_account_id = create_account(
            pool,
            "1150",
            "Loan Interest Receivable",
            AccountType::Asset,
            Some(ReportTag::AssetLoanInterest),
        )
        .await;
        let interest_income_account_id = create_account(
            pool,
            "4000",
            "Interest on Loans",
            AccountType::Income,
            Some(ReportTag::IncomeInterestOnLoans),
        )
        .await;

        let product = LoanCommandsImpl(pool)
            .create_product(
                NewLoanProduct::new(
                    "Development Loan".to_owned(),
                    String::new(),
                    Rate::from_basis_points(1200),
                    InterestMethod::Reducing,
                    12,
                )
                .expect("fixture product should be valid"),
            )
            .await
            .expect("failed to create fixture product");

        LoanFixture {
            member_id: savings.member_id,
            cash_account_id: savings.cash_account_id,
            savings_gl_account_id: savings.savings_gl_account_id,
            savings_account_id: savings.savings_account_id,
            principal_account_id,
            interest_account_id,
            interest_income_account_id,
            product_id: product.id,
        }
    }
}
