//! Invoice persistence.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{compute_totals, Discount, InvoiceNumberGenerator};
use crate::db::{insert_invoice, insert_test_result, Database, DbResult, NewInvoice};
use crate::error::{BillingError, BillingResult};
use crate::models::{
    now_timestamp, Invoice, InvoiceDetail, InvoiceFilter, InvoiceId, InvoiceRequest,
    InvoiceSummary, LabTestId, Page, Paged,
};
use crate::validation::Violations;

/// Longest accepted `Idempotency-Key`.
pub const REQUEST_KEY_MAX_CHARS: usize = 128;

/// Most distinct tests one invoice may bill. Keeps the catalog lookup
/// below SQLite's bound-parameter limit.
pub const MAX_TESTS_PER_INVOICE: usize = 100;

/// Result of [`InvoiceLedger::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceOutcome {
    /// A new invoice was written.
    Created(Invoice),
    /// The request key was already used; nothing was written.
    Replayed(Invoice),
}

impl InvoiceOutcome {
    pub fn invoice(&self) -> &Invoice {
        match self {
            InvoiceOutcome::Created(i) | InvoiceOutcome::Replayed(i) => i,
        }
    }

    pub fn into_invoice(self) -> Invoice {
        match self {
            InvoiceOutcome::Created(i) | InvoiceOutcome::Replayed(i) => i,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InvoiceOutcome::Created(_))
    }
}

impl InvoiceNumberGenerator {
    /// Generator that continues after the highest number already stored.
    pub fn for_database(db: &Database) -> DbResult<Self> {
        Ok(match db.latest_invoice_sequence()? {
            Some(last) => Self::seeded(last),
            None => Self::new(),
        })
    }
}

/// Validated request, ready for catalog lookup.
struct CheckedRequest {
    patient_id: i64,
    test_ids: Vec<LabTestId>,
    discount: Discount,
}

/// Writes invoices. Client-supplied totals never reach this point: prices
/// come from the catalog at call time.
pub struct InvoiceLedger<'a> {
    db: &'a mut Database,
    numbers: &'a InvoiceNumberGenerator,
}

impl<'a> InvoiceLedger<'a> {
    pub fn new(db: &'a mut Database, numbers: &'a InvoiceNumberGenerator) -> Self {
        Self { db, numbers }
    }

    /// Create an invoice and its line items in one transaction.
    ///
    /// With a `request_key` that was already used, the stored invoice is
    /// returned as [`InvoiceOutcome::Replayed`] and nothing is written.
    pub fn create(
        &mut self,
        request: &InvoiceRequest,
        request_key: Option<&str>,
    ) -> BillingResult<InvoiceOutcome> {
        let checked = check_request(request, request_key)?;

        if let Some(key) = request_key {
            if let Some(existing) = self.db.find_invoice_by_request_key(key)? {
                debug!(invoice_number = %existing.invoice_number, "Replaying invoice for request key");
                return Ok(InvoiceOutcome::Replayed(existing));
            }
        }

        if self.db.get_patient(checked.patient_id)?.is_none() {
            return Err(BillingError::NotFound("Patient not found".into()));
        }

        let tests = self.db.get_lab_tests_by_ids(&checked.test_ids)?;
        let missing: Vec<String> = checked
            .test_ids
            .iter()
            .filter(|id| !tests.contains_key(*id))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(BillingError::NotFound(format!(
                "Test(s) not found: {}",
                missing.join(", ")
            )));
        }

        let lines: Vec<_> = checked
            .test_ids
            .iter()
            .filter_map(|id| tests.get(id))
            .map(|t| (t.id, t.price))
            .collect();
        let totals = compute_totals(lines.iter().map(|(_, price)| *price), &checked.discount);

        let invoice_number = self.numbers.next_number();
        let created_at = now_timestamp();
        let header = NewInvoice {
            invoice_number: &invoice_number,
            patient_id: checked.patient_id,
            totals,
            discount: checked.discount,
            request_key,
            created_at: &created_at,
        };

        let written = {
            let tx = self.db.transaction()?;
            match write_invoice(&tx, &header, &lines) {
                Ok(invoice) => {
                    tx.commit()?;
                    Ok(invoice)
                }
                Err(e) => Err(e),
            }
        };

        match written {
            Ok(invoice) => {
                info!(
                    invoice_number = %invoice.invoice_number,
                    patient_id = invoice.patient_id,
                    lines = lines.len(),
                    final_amount = %invoice.final_amount,
                    "Created invoice"
                );
                Ok(InvoiceOutcome::Created(invoice))
            }
            Err(e) if e.is_unique_violation() => {
                // Another writer used the same request key first
                if let Some(key) = request_key {
                    if let Some(existing) = self.db.find_invoice_by_request_key(key)? {
                        return Ok(InvoiceOutcome::Replayed(existing));
                    }
                }
                Err(e.into())
            }
            Err(e) => {
                warn!(error = %e, "Invoice write rolled back");
                Err(e.into())
            }
        }
    }
}

fn write_invoice(
    conn: &rusqlite::Connection,
    header: &NewInvoice<'_>,
    lines: &[(LabTestId, rust_decimal::Decimal)],
) -> DbResult<Invoice> {
    let invoice = insert_invoice(conn, header)?;
    for (test_id, price) in lines {
        insert_test_result(conn, invoice.id, *test_id, *price, header.created_at)?;
    }
    Ok(invoice)
}

fn check_request(request: &InvoiceRequest, request_key: Option<&str>) -> BillingResult<CheckedRequest> {
    let mut v = Violations::new();

    let patient_id = v.require(request.patient_id, "Patient ID is required");

    // Each distinct test is billed once, in first-seen order
    let mut seen = HashSet::new();
    let test_ids: Vec<LabTestId> = request
        .test_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();
    if test_ids.is_empty() {
        v.push("At least one test must be selected");
    } else if test_ids.len() > MAX_TESTS_PER_INVOICE {
        v.push(format!(
            "At most {MAX_TESTS_PER_INVOICE} tests can be billed on one invoice"
        ));
    }

    let kind = request.discount_type.unwrap_or_default();
    let value = request.discount_value.unwrap_or_default();
    let discount = v.check(
        Discount::new(kind, value)
            .and_then(|d| d.ensure_percent_in_range().map(|()| d))
            .map_err(|e| e.to_string()),
    );

    if let Some(key) = request_key {
        let len = key.chars().count();
        if len == 0 || len > REQUEST_KEY_MAX_CHARS {
            v.push(format!(
                "Idempotency key must be 1 to {REQUEST_KEY_MAX_CHARS} characters"
            ));
        }
    }

    v.into_result()?;
    let (Some(patient_id), Some(discount)) = (patient_id, discount) else {
        return Err(BillingError::Internal("Invoice fields missing after validation".into()));
    };

    Ok(CheckedRequest {
        patient_id,
        test_ids,
        discount,
    })
}

/// Read side of the invoice store.
pub struct InvoiceQuery<'a> {
    db: &'a Database,
}

impl<'a> InvoiceQuery<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Header, patient and line items for a receipt.
    pub fn detail(&self, id: InvoiceId) -> BillingResult<InvoiceDetail> {
        let invoice = self
            .db
            .get_invoice(id)?
            .ok_or_else(|| BillingError::NotFound("Invoice not found".into()))?;
        let patient = self.db.get_patient(invoice.patient_id)?.ok_or_else(|| {
            BillingError::Internal(format!("Invoice {id} references a missing patient"))
        })?;
        let lines = self.db.get_invoice_lines(id)?;

        Ok(InvoiceDetail {
            invoice,
            patient,
            lines,
        })
    }

    pub fn list(&self, filter: &InvoiceFilter, page: Page) -> BillingResult<Paged<InvoiceSummary>> {
        Ok(self.db.list_invoices(filter, page)?)
    }
}
