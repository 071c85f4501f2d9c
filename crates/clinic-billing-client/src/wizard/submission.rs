//! Submit lifecycle.

use rust_decimal::Decimal;

use clinic_billing_core::models::{DiscountType, LabTestId, PatientId, PatientInput};
use clinic_billing_core::{Invoice, InvoiceRequest};

use crate::error::ClientError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Submission {
    #[default]
    Idle,
    InFlight,
    /// Terminal until reset
    Completed(Invoice),
    /// Retry allowed; the idempotency key is kept
    Failed { message: String, error: ClientError },
}

impl Submission {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Submission::InFlight)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Submission::Completed(_))
    }
}

/// Everything a submission needs, captured when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    /// Known when the phone lookup found the patient
    pub patient_id: Option<PatientId>,
    pub patient: PatientInput,
    pub test_ids: Vec<LabTestId>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub idempotency_key: String,
}

impl SubmitTicket {
    pub fn invoice_request(&self, patient_id: PatientId) -> InvoiceRequest {
        InvoiceRequest {
            patient_id: Some(patient_id),
            test_ids: self.test_ids.clone(),
            discount_type: Some(self.discount_type),
            discount_value: Some(self.discount_value),
        }
    }
}
