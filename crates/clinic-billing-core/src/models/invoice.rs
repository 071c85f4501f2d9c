//! Invoice models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LabTestId, Patient, PatientId};

pub type InvoiceId = i64;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage of the net total
    #[default]
    Percent,
    /// Flat currency amount
    Amount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Amount => "amount",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "percent" => Ok(DiscountType::Percent),
            "amount" => Ok(DiscountType::Amount),
            other => Err(format!("unknown discount type: {other}")),
        }
    }
}

/// A persisted invoice header. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    /// Human-facing number, `INV-<millis>`
    pub invoice_number: String,
    pub patient_id: PatientId,
    /// Sum of the selected test prices at creation time
    pub total_amount: Decimal,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Total after discount, never negative
    pub final_amount: Decimal,
    /// Idempotency key the invoice was created under, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_key: Option<String>,
    pub created_at: String,
}

/// One line item: a test billed on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: i64,
    pub invoice_id: InvoiceId,
    pub test_id: LabTestId,
    /// Price charged at creation time
    pub price: Decimal,
    pub created_at: String,
}

/// Create-invoice request body. Prices are never taken from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub patient_id: Option<PatientId>,
    #[serde(default)]
    pub test_ids: Vec<LabTestId>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
}

/// Invoice line joined with the test name, for receipts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub test_id: LabTestId,
    pub name: String,
    pub price: Decimal,
}

/// Everything needed to print a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub patient: Patient,
    pub lines: Vec<InvoiceLine>,
}

/// Invoice row for the listing screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub patient_name: String,
    pub patient_phone: String,
}

/// Optional listing filters (substring, case-insensitive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFilter {
    pub invoice_number: Option<String>,
    pub patient_name: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}
