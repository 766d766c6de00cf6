//! Position sizing: turn a percentage into an order amount.
//!
//! Buys are a cash value (percentage of account value, to the penny).
//! Sells are a whole number of units (percentage of units held), rounded
//! half-to-even as the site does.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{AmountKind, Side, form_number};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrderSize {
    pub kind: AmountKind,
    pub amount: f64,
}

impl OrderSize {
    /// Amount as posted in the order form.
    pub fn form_amount(&self) -> String {
        form_number(self.amount)
    }
}

/// Size an order. `percentage` must be within `[0, 100]`.
pub fn calculate(
    side: Side,
    percentage: f64,
    account_value: f64,
    units_held: f64,
) -> Result<OrderSize> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(Error::InvalidRequest(format!(
            "percentage must be within [0, 100], got {percentage}"
        )));
    }

    match side {
        Side::Buy => {
            if !account_value.is_finite() || account_value < 0.0 {
                return Err(Error::InvalidRequest(format!(
                    "account value must be a non-negative amount, got {account_value}"
                )));
            }
            let value = account_value * (percentage / 100.0);
            Ok(OrderSize {
                kind: AmountKind::Value,
                amount: (value * 100.0).round_ties_even() / 100.0,
            })
        }
        Side::Sell => {
            if !units_held.is_finite() || units_held < 0.0 {
                return Err(Error::InvalidRequest(format!(
                    "units held must be non-negative, got {units_held}"
                )));
            }
            Ok(OrderSize {
                kind: AmountKind::Quantity,
                amount: (units_held * (percentage / 100.0)).round_ties_even().trunc(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn buy_is_value_to_the_penny() {
        let size = calculate(Side::Buy, 10.0, 12_345.678, 0.0).unwrap();
        assert_eq!(size.kind, AmountKind::Value);
        assert_eq!(size.amount, 1_234.57);
    }

    #[test]
    fn sell_half_of_300() {
        let size = calculate(Side::Sell, 50.0, 0.0, 300.0).unwrap();
        assert_eq!(size.kind, AmountKind::Quantity);
        assert_eq!(size.amount, 150.0);
        assert_eq!(size.form_amount(), "150");
    }

    #[test]
    fn sell_rounds_half_to_even() {
        assert_eq!(calculate(Side::Sell, 50.0, 0.0, 5.0).unwrap().amount, 2.0);
        assert_eq!(calculate(Side::Sell, 50.0, 0.0, 7.0).unwrap().amount, 4.0);
        assert_eq!(calculate(Side::Sell, 33.0, 0.0, 10.0).unwrap().amount, 3.0);
    }

    #[test]
    fn rejects_out_of_range_percentage() {
        for pct in [-1.0, 100.5, f64::NAN] {
            assert!(matches!(
                calculate(Side::Buy, pct, 1_000.0, 0.0),
                Err(Error::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn zero_percent_is_zero() {
        assert_eq!(calculate(Side::Buy, 0.0, 5_000.0, 0.0).unwrap().amount, 0.0);
        assert_eq!(calculate(Side::Sell, 0.0, 0.0, 5_000.0).unwrap().amount, 0.0);
    }

    proptest! {
        #[test]
        fn full_buy_is_whole_account(pennies in 0u64..10_000_000_000) {
            let value = pennies as f64 / 100.0;
            let size = calculate(Side::Buy, 100.0, value, 0.0).unwrap();
            prop_assert_eq!(size.kind, AmountKind::Value);
            prop_assert!((size.amount - value).abs() < 1e-6);
        }

        #[test]
        fn full_sell_is_whole_holding(units in 0u32..10_000_000) {
            let size = calculate(Side::Sell, 100.0, 0.0, units as f64).unwrap();
            prop_assert_eq!(size.amount, units as f64);
        }

        #[test]
        fn sell_never_exceeds_holding(units in 0u32..1_000_000, pct in 0.0f64..=100.0) {
            let size = calculate(Side::Sell, pct, 0.0, units as f64).unwrap();
            prop_assert!(size.amount <= units as f64);
            prop_assert_eq!(size.amount.fract(), 0.0);
        }
    }
}
