//! Net / discount / final computation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DiscountType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("Discount value cannot be negative")]
    NegativeValue,

    #[error("Percent discount cannot exceed 100")]
    PercentOutOfRange,

    #[error("Discount amount cannot exceed the total price")]
    ExceedsTotal,
}

/// A discount with a non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    kind: DiscountType,
    value: Decimal,
}

impl Discount {
    pub fn new(kind: DiscountType, value: Decimal) -> Result<Self, DiscountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DiscountError::NegativeValue);
        }
        Ok(Self { kind, value })
    }

    pub fn none() -> Self {
        Self {
            kind: DiscountType::Percent,
            value: Decimal::ZERO,
        }
    }

    pub fn kind(&self) -> DiscountType {
        self.kind
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Reject percentages above 100.
    pub fn ensure_percent_in_range(&self) -> Result<(), DiscountError> {
        if self.kind == DiscountType::Percent && self.value > Decimal::ONE_HUNDRED {
            return Err(DiscountError::PercentOutOfRange);
        }
        Ok(())
    }

    /// Reject flat amounts larger than `net`. Used by the wizard, which
    /// refuses to advance instead of silently capping.
    pub fn ensure_within(&self, net: Decimal) -> Result<(), DiscountError> {
        self.ensure_percent_in_range()?;
        if self.kind == DiscountType::Amount && self.value > net {
            return Err(DiscountError::ExceedsTotal);
        }
        Ok(())
    }
}

impl Default for Discount {
    fn default() -> Self {
        Self::none()
    }
}

/// Derived invoice totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub net: Decimal,
    pub discount: Decimal,
    #[serde(rename = "final")]
    pub final_amount: Decimal,
}

/// Compute totals for a set of prices.
///
/// - percent: `discount = net * value / 100`
/// - amount: `discount = min(value, net)`
///
/// `final_amount` is clamped at zero for every input combination. A percent
/// product too large to represent discounts the whole net.
pub fn compute_totals<I>(prices: I, discount: &Discount) -> Totals
where
    I: IntoIterator<Item = Decimal>,
{
    let net: Decimal = prices.into_iter().sum();
    let amount = match discount.kind {
        DiscountType::Percent => net
            .checked_mul(discount.value)
            .map_or(net, |product| product / Decimal::ONE_HUNDRED),
        DiscountType::Amount => discount.value.min(net),
    };
    let final_amount = (net - amount).max(Decimal::ZERO);

    Totals {
        net,
        discount: amount,
        final_amount,
    }
}

/// Round to two decimal places (half away from zero) with a fixed scale of 2.
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
