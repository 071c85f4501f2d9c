//! Dashboard endpoints.

use axum::extract::State;
use axum::Json;

use clinic_billing_core::report::{daily_invoice_report, DailyInvoiceSummary};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/v1/invoice-report`: per-day totals, newest first.
pub async fn invoice_report(
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyInvoiceSummary>>, ApiError> {
    let report = state.with_db(|db| daily_invoice_report(db)).await?;
    Ok(Json(report))
}
