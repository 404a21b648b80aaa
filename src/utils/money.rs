//! Money helpers built on `rust_decimal`.
//!
//! Catalog and configuration amounts arrive as decimals in major units (rupees).
//! They are converted to integer minor units (paise) once, here, and every
//! downstream calculation that must balance exactly works on those integers.

use rust_decimal::prelude::*;
use thiserror::Error;

/// Minor-unit decimal places (1 rupee = 100 paise)
const MINOR_PLACES: u32 = 2;

/// Largest unit price accepted from a catalog row (₹10,00,000)
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Amount must be non-negative, got {0}")]
    Negative(Decimal),

    #[error("Amount exceeds maximum allowed unit price, got {0}")]
    TooLarge(Decimal),
}

/// Parse a published major-unit price such as `"299"`, `"₹1,299.50"` or `" 45.5 "`.
pub fn parse_major(value: &str) -> Result<Decimal, MoneyError> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let amount = Decimal::from_str(cleaned.trim())
        .map_err(|_| MoneyError::InvalidAmount(value.to_string()))?;

    check_amount(amount)
}

/// Reject negative amounts and amounts beyond [`MAX_UNIT_PRICE`].
pub fn check_amount(amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }
    if amount > MAX_UNIT_PRICE {
        return Err(MoneyError::TooLarge(amount));
    }
    Ok(amount)
}

/// Convert a major-unit amount to minor units, rounding half away from zero.
#[inline]
pub fn to_minor(major: Decimal) -> i64 {
    round_minor(major * Decimal::ONE_HUNDRED)
}

/// Convert minor units back to a major-unit decimal (`23000` -> `230.00`).
#[inline]
pub fn to_major(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_PLACES)
}

/// Round a fractional minor-unit amount to a whole minor unit, half away from zero.
/// Values beyond the `i64` range saturate.
#[inline]
pub fn round_minor(value: Decimal) -> i64 {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// `minor * rate`, rounded to a whole minor unit.
#[inline]
pub fn apply_rate(minor: i64, rate: Decimal) -> i64 {
    round_minor(Decimal::from(minor) * rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major_plain_and_decorated() {
        assert_eq!(parse_major("299").unwrap(), Decimal::from(299));
        assert_eq!(parse_major(" 45.5 ").unwrap(), Decimal::new(455, 1));
        assert_eq!(parse_major("₹1,299.50").unwrap(), Decimal::new(129950, 2));
    }

    #[test]
    fn test_parse_major_rejects_garbage() {
        assert!(matches!(
            parse_major("free"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(parse_major(""), Err(MoneyError::InvalidAmount(_))));
        assert!(matches!(parse_major("-5"), Err(MoneyError::Negative(_))));
        assert!(matches!(
            parse_major("1000001"),
            Err(MoneyError::TooLarge(_))
        ));
    }

    #[test]
    fn test_to_minor_rounds_half_away_from_zero() {
        assert_eq!(to_minor(Decimal::new(230, 0)), 23000);
        assert_eq!(to_minor(Decimal::new(10005, 3)), 1001); // 10.005
        assert_eq!(to_minor(Decimal::new(10004, 3)), 1000); // 10.004
    }

    #[test]
    fn test_round_minor_saturates() {
        assert_eq!(round_minor(Decimal::MAX), i64::MAX);
        assert_eq!(round_minor(Decimal::MIN), i64::MIN);
        assert_eq!(to_minor(Decimal::from(i64::MAX)), i64::MAX);
    }

    #[test]
    fn test_to_major() {
        assert_eq!(to_major(23000), Decimal::new(23000, 2));
        assert_eq!(to_major(23000).to_string(), "230.00");
        assert_eq!(to_major(1).to_string(), "0.01");
    }

    #[test]
    fn test_apply_rate() {
        let five_percent = Decimal::new(5, 2);
        assert_eq!(apply_rate(20000, five_percent), 1000);
        // 5% of ₹3.33 = 16.65 paise
        assert_eq!(apply_rate(333, five_percent), 17);
        assert_eq!(apply_rate(0, five_percent), 0);
    }
}
