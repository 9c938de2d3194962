//! Order total arithmetic.
//!
//! Every amount is a [`Decimal`]. Quotes are kept exact; rounding to cents happens
//! once, through [`OrderTotals::rounded`], right before the totals are persisted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    /// Orders whose subtotal is strictly above this ship for free.
    pub free_shipping_threshold: Decimal,
    pub shipping_fee: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Decimal::new(5000, 2),
            shipping_fee: Decimal::new(599, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl PricingPolicy {
    /// Quote a set of `(unit_price, quantity)` lines.
    pub fn quote<I>(&self, lines: I) -> OrderTotals
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let subtotal: Decimal = lines
            .into_iter()
            .map(|(price, quantity)| line_total(price, quantity))
            .sum();
        let tax = subtotal * self.tax_rate;
        let shipping = self.shipping_for(subtotal);
        OrderTotals {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }
}

impl OrderTotals {
    /// Round each component to cents; the total is re-derived from the rounded
    /// parts so `total == subtotal + tax + shipping` holds on what gets stored.
    pub fn rounded(self) -> OrderTotals {
        let subtotal = round_money(self.subtotal);
        let tax = round_money(self.tax);
        let shipping = round_money(self.shipping);
        OrderTotals {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::{PricingPolicy, round_money};

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn two_hundred_dollar_cart_ships_free() {
        let totals = PricingPolicy::default()
            .quote([(d("100.00"), 2)])
            .rounded();
        assert_eq!(totals.subtotal, d("200.00"));
        assert_eq!(totals.tax, d("16.00"));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, d("216.00"));
    }

    #[test]
    fn small_cart_pays_flat_shipping() {
        let totals = PricingPolicy::default()
            .quote([(d("12.50"), 1), (d("7.25"), 2)])
            .rounded();
        assert_eq!(totals.subtotal, d("27.00"));
        assert_eq!(totals.tax, d("2.16"));
        assert_eq!(totals.shipping, d("5.99"));
        assert_eq!(totals.total, d("35.15"));
    }

    #[test]
    fn threshold_itself_is_not_free() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping_for(d("50.00")), d("5.99"));
        assert_eq!(policy.shipping_for(d("50.01")), Decimal::ZERO);
    }

    #[test]
    fn tax_rounds_once_half_away_from_zero() {
        // 0.08 * 10.3125 = 0.825 exactly
        let totals = PricingPolicy::default().quote([(d("10.3125"), 1)]);
        assert_eq!(totals.tax, d("0.825"));
        let rounded = totals.rounded();
        assert_eq!(rounded.tax, d("0.83"));
        assert_eq!(
            rounded.total,
            rounded.subtotal + rounded.tax + rounded.shipping
        );
    }

    #[test]
    fn decimal_sum_has_no_float_drift() {
        let lines = std::iter::repeat_n((d("0.10"), 1), 30);
        let totals = PricingPolicy::default().quote(lines);
        assert_eq!(totals.subtotal, d("3.00"));
    }

    #[test]
    fn custom_policy_is_honoured() {
        let policy = PricingPolicy {
            tax_rate: d("0.10"),
            free_shipping_threshold: d("100"),
            shipping_fee: d("7.50"),
        };
        let totals = policy.quote([(d("40.00"), 2)]).rounded();
        assert_eq!(totals.tax, d("8.00"));
        assert_eq!(totals.shipping, d("7.50"));
        assert_eq!(totals.total, d("95.50"));
    }

    #[test]
    fn round_money_keeps_two_places() {
        assert_eq!(round_money(d("1.005")), d("1.01"));
        assert_eq!(round_money(d("1.004")), d("1.00"));
    }
}
