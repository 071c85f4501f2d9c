//! Dashboard aggregates.
//!
//! Sums are taken in Rust over the stored decimal strings, so no amount ever
//! passes through floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::to_money;
use crate::db::Database;
use crate::error::BillingResult;

/// Invoice totals for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyInvoiceSummary {
    /// `YYYY-MM-DD`
    pub date: String,
    pub invoice_count: u64,
    /// Sum of pre-discount totals
    pub total_amount: Decimal,
    /// Sum of final amounts
    pub collected_amount: Decimal,
}

/// Per-day invoice count and amounts, newest day first.
pub fn daily_invoice_report(db: &Database) -> BillingResult<Vec<DailyInvoiceSummary>> {
    let mut days: Vec<DailyInvoiceSummary> = Vec::new();

    for row in db.invoice_amounts_by_day()? {
        match days.last_mut() {
            Some(day) if day.date == row.date => {
                day.invoice_count += 1;
                day.total_amount += row.total_amount;
                day.collected_amount += row.final_amount;
            }
            _ => days.push(DailyInvoiceSummary {
                date: row.date,
                invoice_count: 1,
                total_amount: row.total_amount,
                collected_amount: row.final_amount,
            }),
        }
    }

    for day in &mut days {
        day.total_amount = to_money(day.total_amount);
        day.collected_amount = to_money(day.collected_amount);
    }
    Ok(days)
}
