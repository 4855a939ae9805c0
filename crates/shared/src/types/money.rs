//! Monetary rounding and validation helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` values in a single currency
//! per record; currency conversion is out of scope.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places using Banker's Rounding.
///
/// Banker's Rounding (round half to even) avoids systematic bias when
/// summing many rounded amounts.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if the amount is a valid monetary value: non-negative
/// and with at most 2 decimal places.
#[must_use]
pub fn is_valid_amount(amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount == round2(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.00))] // half to even: 0 is even
    #[case(dec!(10.015), dec!(10.02))]
    #[case(dec!(10.014), dec!(10.01))]
    #[case(dec!(10.016), dec!(10.02))]
    #[case(dec!(10), dec!(10))]
    fn test_round2(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round2(input), expected);
    }

    #[test]
    fn test_is_valid_amount() {
        assert!(is_valid_amount(dec!(0)));
        assert!(is_valid_amount(dec!(12000)));
        assert!(is_valid_amount(dec!(99.99)));
        assert!(!is_valid_amount(dec!(-0.01)));
        assert!(!is_valid_amount(dec!(1.005)));
    }
}
