//! Invoice endpoints.
//!
//! - `POST /api/v1/invoice` create (honours `Idempotency-Key`)
//! - `GET /api/v1/invoice/:id` receipt detail
//! - `GET /api/v1/invoices` paged listing

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use clinic_billing_core::models::{InvoiceFilter, InvoiceSummary, Page};
use clinic_billing_core::{Invoice, InvoiceDetail, InvoiceLedger, InvoiceQuery, InvoiceRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Debug, Serialize)]
pub struct InvoiceCreatedResponse {
    pub message: &'static str,
    pub invoice: Invoice,
}

/// `POST /api/v1/invoice`: 201 on creation, 200 when the idempotency key
/// was already used (the stored invoice is returned).
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<InvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceCreatedResponse>), ApiError> {
    let request_key = match headers.get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::bad_request("Idempotency-Key must be visible ASCII"))?
                .to_string(),
        ),
        None => None,
    };
    let Json(request) = body?;

    let numbers = state.numbers();
    let outcome = state
        .with_db(move |db| {
            InvoiceLedger::new(db, &numbers).create(&request, request_key.as_deref())
        })
        .await?;

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(InvoiceCreatedResponse {
            message: "Invoice created successfully",
            invoice: outcome.into_invoice(),
        }),
    ))
}

/// `GET /api/v1/invoice/:id`
pub async fn detail(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<InvoiceDetail>, ApiError> {
    let Path(id) = id?;
    let detail = state
        .with_db(move |db| InvoiceQuery::new(db).detail(id))
        .await?;
    Ok(Json(detail))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub invoice_number: Option<String>,
    pub patient_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

/// `GET /api/v1/invoices?page=&limit=&invoiceNumber=&patientName=`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<InvoiceListQuery>, QueryRejection>,
) -> Result<Json<InvoiceListResponse>, ApiError> {
    let Query(query) = query?;
    let page = Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));
    let filter = InvoiceFilter {
        invoice_number: query.invoice_number,
        patient_name: query.patient_name,
    };

    let paged = state
        .with_db(move |db| InvoiceQuery::new(db).list(&filter, page))
        .await?;
    Ok(Json(InvoiceListResponse {
        invoices: paged.items,
        current_page: paged.current_page,
        total_pages: paged.total_pages,
        total_items: paged.total_items,
    }))
}
