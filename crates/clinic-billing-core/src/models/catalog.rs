//! Lab test catalog models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type LabTestId = i64;

/// A priced catalog item. Referenced by invoice lines, never owned by them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: LabTestId,
    pub name: String,
    /// Current price (two decimal places)
    pub price: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

/// A validated catalog entry ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLabTest {
    pub name: String,
    pub price: Decimal,
}

/// Raw create / update payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabTestInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabTestChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

impl LabTestChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_accepts_number_or_string() {
        let a: LabTestInput = serde_json::from_str(r#"{"name":"CBC","price":120.5}"#).unwrap();
        let b: LabTestInput = serde_json::from_str(r#"{"name":"CBC","price":"120.50"}"#).unwrap();
        assert_eq!(a.price, Some(dec!(120.5)));
        assert_eq!(a.price, b.price);
    }
}
