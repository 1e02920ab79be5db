//! Minor-unit price conversion
//!
//! Catalog prices are stored as major-unit decimals; payment providers and
//! the order ledger work in minor units. Rounding is half-up so 12.505
//! becomes 1251, matching what the catalog promises at display time.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert a major-unit decimal price to minor units, rounding half-up.
///
/// Returns None only for amounts outside the i64 range.
pub fn to_minor_units(price: Decimal) -> Option<i64> {
    (price * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert minor units back to a major-unit decimal, for display surfaces
pub fn amount_major(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_exact_conversion() {
        assert_eq!(to_minor_units(Decimal::from_str("12.50").unwrap()), Some(1250));
        assert_eq!(to_minor_units(Decimal::from_str("0.99").unwrap()), Some(99));
        assert_eq!(to_minor_units(Decimal::from(5)), Some(500));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_half_up_rounding() {
        assert_eq!(to_minor_units(Decimal::from_str("12.505").unwrap()), Some(1251));
        assert_eq!(to_minor_units(Decimal::from_str("12.504").unwrap()), Some(1250));
        assert_eq!(to_minor_units(Decimal::from_str("0.005").unwrap()), Some(1));
    }

    #[test]
    fn test_amount_major() {
        assert_eq!(amount_major(1250), Decimal::from_str("12.50").unwrap());
        assert_eq!(amount_major(1250).to_string(), "12.50");
        assert_eq!(amount_major(99), Decimal::from_str("0.99").unwrap());
    }
}
