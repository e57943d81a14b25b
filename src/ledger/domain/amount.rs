use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::Serialize;

/// The number of decimal places carried by every monetary amount.
const MINOR_UNITS: u32 = 2;

/// A monetary amount at fixed two-decimal precision.
///
/// The value is always stored as a whole number of minor units (cents) so
/// that balance checks can use exact equality with no floating point
/// involvement.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum AmountParseError {
    /// The provided amount could not be parsed as a number.
    #[error("'{0}' is not a valid amount")]
    InvalidNumber(String),
    /// The provided amount carried more decimal places than the currency
    /// allows. The parameter is the number of decimals found.
    #[error("amounts allow at most 2 decimal places, found {0}")]
    TooManyDecimals(usize),
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_minor(value: i64) -> Self {
        Self(value)
    }

    /// Parse an amount from a string representation.
    ///
    /// The input may contain thousands separators (commas or spaces) and up
    /// to two decimal places. The parsed value is returned in minor units.
    pub fn parse(raw_amount: &str) -> Result<Self, AmountParseError> {
        let cleaned = raw_amount.replace(',', "").replace(' ', "");

        let number_to_parse = match cleaned.rsplit_once('.') {
            // No decimal point, so pad with zeroes for the minor units.
            None => format!("{}{}", cleaned, "0".repeat(MINOR_UNITS as usize)),
            Some((whole_part, decimal_part)) => {
                if decimal_part.len() <= MINOR_UNITS as usize {
                    format!(
                        "{}{:0<width$}",
                        whole_part,
                        decimal_part,
                        width = MINOR_UNITS as usize,
                    )
                } else {
                    return Err(AmountParseError::TooManyDecimals(decimal_part.len()));
                }
            }
        };

        number_to_parse
            .parse()
            .map(Self)
            .map_err(|_| AmountParseError::InvalidNumber(raw_amount.to_owned()))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The larger of this amount and zero.
    pub fn clamp_non_negative(self) -> Self {
        Self(self.0.max(0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Preserve the sign, then work with the absolute value so padding
        // doesn't have to account for a leading minus.
        let sign = if self.0.is_negative() { "-" } else { "" };
        let padded = format!("{:0>width$}", self.0.abs(), width = MINOR_UNITS as usize + 1);
        let decimal_location = padded.len() - MINOR_UNITS as usize;

        write!(
            f,
            "{}{}.{}",
            sign,
            &padded[..decimal_location],
            &padded[decimal_location..]
        )
    }
}

/// An annual interest rate in basis points.
///
/// Basis points preserve the original two-decimal percent figures exactly,
/// e.g. 12.50% is 1250 bps.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rate(i64);

impl Rate {
    pub fn from_basis_points(basis_points: i64) -> Self {
        Self(basis_points)
    }

    /// Parse a percentage with up to two decimal places, e.g. "12.5".
    pub fn from_percent_str(raw_rate: &str) -> Result<Self, AmountParseError> {
        // A percent at two decimals has the same shape as a currency amount.
        Amount::parse(raw_rate).map(|amount| Self(amount.value()))
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }

    /// One month's interest on the given amount, rounded half-up to the
    /// nearest minor unit.
    pub fn monthly_interest_on(&self, amount: Amount) -> Amount {
        // amount * (bps / 10_000) / 12, carried out in minor units. The
        // intermediate product fits comfortably in an i128.
        let numerator = i128::from(amount.value()) * i128::from(self.0);
        let denominator: i128 = 10_000 * 12;
        let rounded = (2 * numerator + denominator) / (2 * denominator);

        Amount::from_minor(rounded as i64)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", Amount::from_minor(self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_whole_number() {
        let parsed = Amount::parse("12").expect("failed to parse whole number");

        assert_eq!(1200, parsed.value());
    }

    #[test]
    fn parse_decimal() {
        let parsed = Amount::parse("128.93").expect("failed to parse decimal");

        assert_eq!(12893, parsed.value());
    }

    #[test]
    fn parse_single_decimal_place() {
        let parsed = Amount::parse("128.9").expect("failed to parse decimal");

        assert_eq!(12890, parsed.value());
    }

    #[test]
    fn parse_with_separators() {
        let parsed = Amount::parse("8,675,309").expect("failed to parse with separators");

        assert_eq!(867_530_900, parsed.value());
    }

    #[test]
    fn parse_no_whole_digits() {
        let parsed = Amount::parse(".07").expect("failed to parse bare decimal");

        assert_eq!(7, parsed.value());
    }

    #[test]
    fn parse_negative() {
        let parsed = Amount::parse("-3.14").expect("failed to parse negative");

        assert_eq!(-314, parsed.value());
    }

    #[test]
    fn parse_too_many_decimals() {
        let error = Amount::parse("1.234").expect_err("three decimals should be rejected");

        assert_eq!(AmountParseError::TooManyDecimals(3), error);
    }

    #[test]
    fn parse_invalid_number() {
        let error = Amount::parse("squirrel").expect_err("non-number should be rejected");

        assert_eq!(AmountParseError::InvalidNumber("squirrel".to_owned()), error);
    }

    #[test]
    fn format_longer_than_padding() {
        assert_eq!("123.45", Amount::from_minor(12345).to_string());
    }

    #[test]
    fn format_tens_place_only() {
        assert_eq!("0.70", Amount::from_minor(70).to_string());
    }

    #[test]
    fn format_hundredths_place_only() {
        assert_eq!("0.07", Amount::from_minor(7).to_string());
    }

    #[test]
    fn format_negative_decimal() {
        assert_eq!("-0.07", Amount::from_minor(-7).to_string());
    }

    #[test]
    fn rate_from_percent() {
        let rate = Rate::from_percent_str("12.5").expect("failed to parse rate");

        assert_eq!(1250, rate.basis_points());
    }

    #[test]
    fn monthly_interest_rounds_half_up() {
        // 12% annually is 1% per month. 1% of 100.50 is 1.005, which rounds
        // up to 1.01.
        let rate = Rate::from_basis_points(1200);

        let interest = rate.monthly_interest_on(Amount::from_minor(10050));

        assert_eq!(Amount::from_minor(101), interest);
    }

    #[test]
    fn monthly_interest_on_zero() {
        let rate = Rate::from_basis_points(1200);

        assert_eq!(Amount::ZERO, rate.monthly_interest_on(Amount::ZERO));
    }
}
