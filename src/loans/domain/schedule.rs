//! Amortization schedule generation.
//!
//! Schedule generation is a pure function of the loan's snapshot terms. All
//! per-installment figures are integer minor units; floating point only
//! appears transiently when deriving the level payment for reducing-balance
//! loans, and the final installment always settles the remaining balance
//! exactly so the principal column sums to the principal with no drift.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::ledger::domain::amount::{Amount, Rate};

use super::InterestMethod;

/// One row of an amortization schedule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Installment {
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub principal_due: Amount,
    pub interest_due: Amount,
}

impl Installment {
    pub fn total_due(&self) -> Amount {
        self.principal_due + self.interest_due
    }
}

/// A persisted schedule row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub loan_id: i64,
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub principal_due: Amount,
    pub interest_due: Amount,
    pub total_due: Amount,
    pub paid: bool,
}

/// Generate the full repayment schedule for a loan.
///
/// Due dates fall monthly starting one month after disbursement, with the
/// day-of-month clamped to the target month's length (a loan disbursed on
/// January 31st has its first installment due February 28th or 29th). A
/// zero-month tenor yields an empty schedule.
pub fn generate_schedule(
    principal: Amount,
    annual_rate: Rate,
    tenor_months: u32,
    disbursed_on: NaiveDate,
    method: InterestMethod,
) -> Vec<Installment> {
    if tenor_months == 0 {
        return Vec::new();
    }

    match method {
        InterestMethod::Reducing => reducing_schedule(principal, annual_rate, tenor_months, disbursed_on),
        InterestMethod::Flat => flat_schedule(principal, annual_rate, tenor_months, disbursed_on),
    }
}

fn reducing_schedule(
    principal: Amount,
    annual_rate: Rate,
    tenor_months: u32,
    disbursed_on: NaiveDate,
) -> Vec<Installment> {
    let payment = level_payment(principal, annual_rate, tenor_months);

    let mut schedule = Vec::with_capacity(tenor_months as usize);
    let mut balance = principal;

    for installment_no in 1..=tenor_months {
        let interest_due = annual_rate.monthly_interest_on(balance);

        let principal_due = if installment_no == tenor_months {
            // The last installment settles whatever is left, absorbing all
            // accumulated rounding.
            balance
        } else {
            (payment - interest_due)
                .clamp_non_negative()
                .min(balance)
        };

        balance = balance - principal_due;

        schedule.push(Installment {
            installment_no,
            due_date: months_after(disbursed_on, installment_no),
            principal_due,
            interest_due,
        });
    }

    schedule
}

fn flat_schedule(
    principal: Amount,
    annual_rate: Rate,
    tenor_months: u32,
    disbursed_on: NaiveDate,
) -> Vec<Installment> {
    let base = principal.value() / i64::from(tenor_months);
    let remainder = principal.value() % i64::from(tenor_months);
    let interest_due = annual_rate.monthly_interest_on(principal);

    (1..=tenor_months)
        .map(|installment_no| {
            let principal_due = if installment_no == tenor_months {
                Amount::from_minor(base + remainder)
            } else {
                Amount::from_minor(base)
            };

            Installment {
                installment_no,
                due_date: months_after(disbursed_on, installment_no),
                principal_due,
                interest_due,
            }
        })
        .collect()
}

/// The level payment for a reducing-balance loan, from the standard annuity
/// formula, rounded to the nearest minor unit.
fn level_payment(principal: Amount, annual_rate: Rate, tenor_months: u32) -> Amount {
    if annual_rate.basis_points() == 0 {
        // Degenerates to an even principal split.
        let base = principal.value() / i64::from(tenor_months);
        return Amount::from_minor(base);
    }

    let monthly_rate = annual_rate.basis_points() as f64 / 10_000.0 / 12.0;
    let factor = (1.0 + monthly_rate).powi(tenor_months as i32);
    let payment = principal.value() as f64 * monthly_rate * factor / (factor - 1.0);

    Amount::from_minor(payment.round() as i64)
}

fn months_after(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_indexed = date.month0() + months;
    let year = date.year() + (zero_indexed / 12) as i32;
    let month = zero_indexed % 12 + 1;
    let day = date.day().min(days_in_month(year, month));

    // The clamped day always lands inside the target month.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn reducing_principal_sums_exactly() {
        // 12,000.00 at 12% over 12 months.
        let schedule = generate_schedule(
            Amount::from_minor(1_200_000),
            Rate::from_basis_points(1200),
            12,
            date(2024, 1, 15),
            InterestMethod::Reducing,
        );

        assert_eq!(12, schedule.len());

        let total_principal: Amount = schedule.iter().map(|row| row.principal_due).sum();
        assert_eq!(Amount::from_minor(1_200_000), total_principal);

        for row in &schedule {
            assert_eq!(row.total_due(), row.principal_due + row.interest_due);
            assert!(!row.principal_due.is_negative());
            assert!(!row.interest_due.is_negative());
        }

        // First month's interest is 1% of the full principal.
        assert_eq!(Amount::from_minor(12_000), schedule[0].interest_due);
        // Interest declines as the balance declines.
        assert!(schedule[11].interest_due < schedule[0].interest_due);
    }

    #[test]
    fn reducing_zero_rate_splits_principal_evenly() {
        let schedule = generate_schedule(
            Amount::from_minor(120_000),
            Rate::from_basis_points(0),
            12,
            date(2024, 1, 1),
            InterestMethod::Reducing,
        );

        let total_principal: Amount = schedule.iter().map(|row| row.principal_due).sum();
        assert_eq!(Amount::from_minor(120_000), total_principal);
        assert!(schedule.iter().all(|row| row.interest_due.is_zero()));
    }

    #[test]
    fn flat_interest_is_constant() {
        // 12,000.00 at 12% over 12 months: 1,000.00 principal and 120.00
        // interest every month.
        let schedule = generate_schedule(
            Amount::from_minor(1_200_000),
            Rate::from_basis_points(1200),
            12,
            date(2024, 1, 15),
            InterestMethod::Flat,
        );

        for row in &schedule {
            assert_eq!(Amount::from_minor(100_000), row.principal_due);
            assert_eq!(Amount::from_minor(12_000), row.interest_due);
        }
    }

    #[test]
    fn flat_remainder_lands_in_final_installment() {
        // 100.01 over 3 months leaves 2 cents for the last row.
        let schedule = generate_schedule(
            Amount::from_minor(10_001),
            Rate::from_basis_points(0),
            3,
            date(2024, 1, 1),
            InterestMethod::Flat,
        );

        assert_eq!(Amount::from_minor(3_333), schedule[0].principal_due);
        assert_eq!(Amount::from_minor(3_333), schedule[1].principal_due);
        assert_eq!(Amount::from_minor(3_335), schedule[2].principal_due);

        let total_principal: Amount = schedule.iter().map(|row| row.principal_due).sum();
        assert_eq!(Amount::from_minor(10_001), total_principal);
    }

    #[test]
    fn due_dates_advance_monthly() {
        let schedule = generate_schedule(
            Amount::from_minor(10_000),
            Rate::from_basis_points(1000),
            3,
            date(2024, 3, 15),
            InterestMethod::Flat,
        );

        let due_dates: Vec<NaiveDate> = schedule.iter().map(|row| row.due_date).collect();
        assert_eq!(
            vec![date(2024, 4, 15), date(2024, 5, 15), date(2024, 6, 15)],
            due_dates
        );
    }

    #[test]
    fn due_date_day_is_clamped_to_month_length() {
        let schedule = generate_schedule(
            Amount::from_minor(10_000),
            Rate::from_basis_points(1000),
            3,
            date(2024, 1, 31),
            InterestMethod::Flat,
        );

        let due_dates: Vec<NaiveDate> = schedule.iter().map(|row| row.due_date).collect();
        // 2024 is a leap year.
        assert_eq!(
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)],
            due_dates
        );
    }

    #[test]
    fn due_dates_cross_year_boundaries() {
        let schedule = generate_schedule(
            Amount::from_minor(10_000),
            Rate::from_basis_points(1000),
            3,
            date(2024, 11, 30),
            InterestMethod::Flat,
        );

        let due_dates: Vec<NaiveDate> = schedule.iter().map(|row| row.due_date).collect();
        assert_eq!(
            vec![date(2024, 12, 30), date(2025, 1, 30), date(2025, 2, 28)],
            due_dates
        );
    }

    #[test]
    fn zero_tenor_yields_no_installments() {
        for method in [InterestMethod::Reducing, InterestMethod::Flat] {
            let schedule = generate_schedule(
                Amount::from_minor(10_000),
                Rate::from_basis_points(1200),
                0,
                date(2024, 1, 1),
                method,
            );

            assert!(schedule.is_empty());
        }
    }

    #[test]
    fn single_installment_settles_everything() {
        let schedule = generate_schedule(
            Amount::from_minor(50_000),
            Rate::from_basis_points(1200),
            1,
            date(2024, 1, 1),
            InterestMethod::Reducing,
        );

        assert_eq!(1, schedule.len());
        assert_eq!(Amount::from_minor(50_000), schedule[0].principal_due);
        // One month's interest at 1%.
        assert_eq!(Amount::from_minor(500), schedule[0].interest_due);
    }
}
