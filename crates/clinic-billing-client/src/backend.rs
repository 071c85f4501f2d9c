//! The seam between the wizard and the billing API.

use std::future::Future;

use clinic_billing_core::models::PatientInput;
use clinic_billing_core::{Invoice, InvoiceRequest, LabTest, Patient};

use crate::error::ClientResult;

/// Remote operations the invoice wizard needs.
///
/// [`crate::HttpBackend`] talks to the REST API; tests substitute an
/// in-process fake.
pub trait BillingBackend: Send + Sync {
    /// Read-only lookup used for prefill. Never creates a patient.
    fn find_patient_by_phone(
        &self,
        phone: &str,
    ) -> impl Future<Output = ClientResult<Option<Patient>>> + Send;

    fn list_tests(&self) -> impl Future<Output = ClientResult<Vec<LabTest>>> + Send;

    /// Create-or-fetch by phone.
    fn resolve_patient(
        &self,
        input: &PatientInput,
    ) -> impl Future<Output = ClientResult<Patient>> + Send;

    /// Create an invoice. Repeating a call with the same `idempotency_key`
    /// returns the original invoice.
    fn create_invoice(
        &self,
        request: &InvoiceRequest,
        idempotency_key: &str,
    ) -> impl Future<Output = ClientResult<Invoice>> + Send;
}
