//! Property tests for invoice totals.

use clinic_billing_core::billing::{compute_totals, Discount};
use clinic_billing_core::models::DiscountType;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn prices() -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec((0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2)), 0..20)
}

proptest! {
    /// Percent discounts in range take exactly `value` percent off.
    #[test]
    fn percent_discount_is_proportional(
        prices in prices(),
        percent in (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2)),
    ) {
        let discount = Discount::new(DiscountType::Percent, percent).unwrap();
        let totals = compute_totals(prices.iter().copied(), &discount);
        let net: Decimal = prices.iter().copied().sum();

        prop_assert_eq!(totals.net, net);
        prop_assert_eq!(totals.final_amount, net - net * percent / Decimal::ONE_HUNDRED);
        prop_assert!(totals.final_amount >= Decimal::ZERO);
    }

    /// Amount discounts are capped at net, so the final never goes negative.
    #[test]
    fn amount_discount_is_capped(
        prices in prices(),
        value in (0i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2)),
    ) {
        let discount = Discount::new(DiscountType::Amount, value).unwrap();
        let totals = compute_totals(prices.iter().copied(), &discount);

        prop_assert_eq!(totals.discount, value.min(totals.net));
        prop_assert_eq!(totals.final_amount, totals.net - totals.discount);
        prop_assert!(totals.final_amount >= Decimal::ZERO);
    }

    /// Negative discount values never construct.
    #[test]
    fn negative_discount_rejected(cents in 1i64..1_000_000, percent in any::<bool>()) {
        let kind = if percent { DiscountType::Percent } else { DiscountType::Amount };
        prop_assert!(Discount::new(kind, Decimal::new(-cents, 2)).is_err());
    }

    /// Percent discounts above 100 fail the range check.
    #[test]
    fn percent_over_hundred_out_of_range(bp in 10_001i64..1_000_000) {
        let discount = Discount::new(DiscountType::Percent, Decimal::new(bp, 2)).unwrap();
        prop_assert!(discount.ensure_percent_in_range().is_err());
    }
}
