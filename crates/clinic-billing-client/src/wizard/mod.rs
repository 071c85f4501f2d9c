//! Invoice wizard state machine.
//!
//! ```text
//! PatientInfo ──next──► SelectTests ──next──► Summary ──submit──► Completed
//!      ◄──back──────────────◄──back───────────────┘                 │
//!      ◄──────────────────────── reset ─────────────────────────────┘
//! ```
//!
//! The wizard does no I/O. [`crate::WizardDriver`] performs the remote calls
//! and feeds results back through tickets, so a result that arrives after the
//! state moved on is recognised and dropped.

mod form;
mod submission;

pub use form::*;
pub use submission::*;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use clinic_billing_core::billing::{compute_totals, Discount, DiscountError, Totals};
use clinic_billing_core::models::{DiscountType, Gender, LabTest, LabTestId, Patient, PatientId};
use clinic_billing_core::validation;
use clinic_billing_core::Invoice;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PatientInfo,
    SelectTests,
    Summary,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Patient details are read-only for a registered phone number")]
    Locked,

    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Already at the first step")]
    NoPreviousStep,

    #[error("Use submit on the summary step")]
    NoNextStep,

    #[error("Submit is only available on the summary step")]
    NotAtSummary,

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("This invoice has already been created")]
    AlreadySubmitted,

    #[error("Unknown test {0}")]
    UnknownTest(LabTestId),
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    form: PatientForm,
    patient_id: Option<PatientId>,
    lookup: LookupState,
    lookup_generation: u64,
    catalog: Vec<LabTest>,
    selected: Vec<LabTestId>,
    discount_type: DiscountType,
    discount_value: Decimal,
    submission: Submission,
    idempotency_key: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::PatientInfo,
            form: PatientForm::default(),
            patient_id: None,
            lookup: LookupState::Idle,
            lookup_generation: 0,
            catalog: Vec::new(),
            selected: Vec::new(),
            discount_type: DiscountType::Percent,
            discount_value: Decimal::ZERO,
            submission: Submission::Idle,
            idempotency_key: None,
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn lookup(&self) -> &LookupState {
        &self.lookup
    }

    /// Known patient id (from lookup or from a resolved submission).
    pub fn patient_id(&self) -> Option<PatientId> {
        self.patient_id
    }

    /// Details are read-only while a looked-up patient is shown.
    pub fn is_locked(&self) -> bool {
        matches!(self.lookup, LookupState::Found(_))
    }

    pub fn catalog(&self) -> &[LabTest] {
        &self.catalog
    }

    pub fn selected_ids(&self) -> &[LabTestId] {
        &self.selected
    }

    /// Selected tests in selection order.
    pub fn selected_tests(&self) -> Vec<&LabTest> {
        self.selected
            .iter()
            .filter_map(|id| self.catalog.iter().find(|t| t.id == *id))
            .collect()
    }

    pub fn discount_type(&self) -> DiscountType {
        self.discount_type
    }

    pub fn discount_value(&self) -> Decimal {
        self.discount_value
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        match &self.submission {
            Submission::Completed(invoice) => Some(invoice),
            _ => None,
        }
    }

    /// User-facing failure message, if the last submission failed.
    pub fn notification(&self) -> Option<&str> {
        match &self.submission {
            Submission::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    // =====================================================================
    // Patient step
    // =====================================================================

    /// Record a phone edit. Returns a ticket when the new phone is complete
    /// and should be looked up.
    ///
    /// Any edit invalidates outstanding lookups. A previously found patient is
    /// released and its prefilled details cleared.
    pub fn set_phone(&mut self, phone: &str) -> Result<Option<LookupTicket>, WizardError> {
        self.ensure_idle()?;
        let phone = phone.trim();
        if phone == self.form.phone {
            return Ok(None);
        }

        self.edited();
        self.lookup_generation += 1;
        self.form.phone = phone.to_string();
        if self.is_locked() {
            self.form.clear_details();
        }
        self.patient_id = None;

        if validation::is_valid_phone(phone) {
            self.lookup = LookupState::Pending;
            Ok(Some(LookupTicket {
                generation: self.lookup_generation,
                phone: phone.to_string(),
            }))
        } else {
            self.lookup = LookupState::Idle;
            Ok(None)
        }
    }

    pub fn is_current(&self, ticket: &LookupTicket) -> bool {
        ticket.generation == self.lookup_generation
    }

    /// Apply a lookup result. Returns false, changing nothing, when the
    /// ticket is stale or a submission has already captured the form.
    pub fn apply_lookup(
        &mut self,
        ticket: &LookupTicket,
        result: Result<Option<Patient>, ClientError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(phone = %ticket.phone, "Discarding stale lookup result");
            return false;
        }
        if self.ensure_idle().is_err() {
            debug!(phone = %ticket.phone, "Discarding lookup result during submission");
            return false;
        }

        self.lookup = match result {
            Ok(Some(patient)) => {
                self.form.fill_from(&patient);
                self.patient_id = Some(patient.id);
                LookupState::Found(patient.id)
            }
            Ok(None) => LookupState::NotFound,
            Err(e) => LookupState::Failed(e.to_string()),
        };
        true
    }

    /// Detail fields accept edits only while idle and not locked.
    fn begin_detail_edit(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if self.is_locked() {
            return Err(WizardError::Locked);
        }
        self.edited();
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), WizardError> {
        self.begin_detail_edit()?;
        self.form.name = name.to_string();
        Ok(())
    }

    pub fn set_gender(&mut self, gender: Gender) -> Result<(), WizardError> {
        self.begin_detail_edit()?;
        self.form.gender = Some(gender);
        Ok(())
    }

    pub fn set_age(&mut self, age: i64) -> Result<(), WizardError> {
        self.begin_detail_edit()?;
        self.form.age = Some(age);
        Ok(())
    }

    pub fn set_address(&mut self, address: &str) -> Result<(), WizardError> {
        self.begin_detail_edit()?;
        self.form.address = address.to_string();
        Ok(())
    }

    // =====================================================================
    // Test selection
    // =====================================================================

    /// Replace the catalog. Selections no longer offered are dropped.
    pub fn set_catalog(&mut self, tests: Vec<LabTest>) {
        self.catalog = tests;
        let catalog = &self.catalog;
        self.selected.retain(|id| catalog.iter().any(|t| t.id == *id));
    }

    /// Flip a test's selection. Returns whether it is now selected.
    pub fn toggle_test(&mut self, id: LabTestId) -> Result<bool, WizardError> {
        self.ensure_idle()?;
        if !self.catalog.iter().any(|t| t.id == id) {
            return Err(WizardError::UnknownTest(id));
        }
        self.edited();
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(id);
            Ok(true)
        }
    }

    pub fn set_discount(&mut self, kind: DiscountType, value: Decimal) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if (kind, value) != (self.discount_type, self.discount_value) {
            self.edited();
            self.discount_type = kind;
            self.discount_value = value;
        }
        Ok(())
    }

    /// The entered discount, if it is non-negative and a percentage is at
    /// most 100.
    fn checked_discount(&self) -> Result<Discount, DiscountError> {
        let discount = Discount::new(self.discount_type, self.discount_value)?;
        discount.ensure_percent_in_range()?;
        Ok(discount)
    }

    fn net(&self) -> Decimal {
        self.selected_tests().iter().map(|t| t.price).sum()
    }

    /// Live totals for the current selection and discount. An invalid
    /// discount previews as no discount; [`Wizard::selection_errors`]
    /// reports it.
    pub fn totals(&self) -> Totals {
        let discount = self.checked_discount().unwrap_or_default();
        compute_totals(self.selected_tests().iter().map(|t| t.price), &discount)
    }

    /// Reasons the selection step cannot advance.
    pub fn selection_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.selected.is_empty() {
            errors.push("Select at least one test".to_string());
        }
        if let Err(e) = self
            .checked_discount()
            .and_then(|d| d.ensure_within(self.net()))
        {
            errors.push(e.to_string());
        }
        errors
    }

    // =====================================================================
    // Navigation
    // =====================================================================

    fn ensure_idle(&self) -> Result<(), WizardError> {
        match self.submission {
            Submission::InFlight => Err(WizardError::SubmissionInProgress),
            Submission::Completed(_) => Err(WizardError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    /// An edit after a failed submission makes it a different request: the
    /// failure is cleared and the next submit gets a fresh idempotency key.
    fn edited(&mut self) {
        if matches!(self.submission, Submission::Failed { .. }) {
            self.submission = Submission::Idle;
            self.idempotency_key = None;
        }
    }

    pub fn next(&mut self) -> Result<Step, WizardError> {
        self.ensure_idle()?;
        let next = match self.step {
            Step::PatientInfo => {
                let errors = self.form.errors();
                if !errors.is_empty() {
                    return Err(WizardError::Invalid(errors));
                }
                Step::SelectTests
            }
            Step::SelectTests => {
                let errors = self.selection_errors();
                if !errors.is_empty() {
                    return Err(WizardError::Invalid(errors));
                }
                Step::Summary
            }
            Step::Summary => return Err(WizardError::NoNextStep),
        };
        self.step = next;
        Ok(next)
    }

    pub fn back(&mut self) -> Result<Step, WizardError> {
        self.ensure_idle()?;
        let prev = match self.step {
            Step::PatientInfo => return Err(WizardError::NoPreviousStep),
            Step::SelectTests => Step::PatientInfo,
            Step::Summary => Step::SelectTests,
        };
        self.step = prev;
        Ok(prev)
    }

    // =====================================================================
    // Submission
    // =====================================================================

    /// Start a submission. At most one can be in flight, and none after one
    /// has succeeded.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, WizardError> {
        self.ensure_idle()?;
        if self.step != Step::Summary {
            return Err(WizardError::NotAtSummary);
        }

        let mut errors = self.form.errors();
        errors.extend(self.selection_errors());
        if !errors.is_empty() {
            return Err(WizardError::Invalid(errors));
        }

        let key = self
            .idempotency_key
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        self.submission = Submission::InFlight;

        Ok(SubmitTicket {
            patient_id: self.patient_id,
            patient: self.form.to_input(),
            test_ids: self.selected.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            idempotency_key: key,
        })
    }

    /// Remember the patient resolved for `ticket` so a retry does not
    /// resolve again. Ignored unless that submission is still in flight for
    /// the phone currently entered.
    pub fn record_patient(&mut self, ticket: &SubmitTicket, id: PatientId) -> bool {
        let same_phone = ticket.patient.phone.as_deref() == Some(self.form.phone.as_str());
        if !self.submission.is_in_flight() || !same_phone {
            debug!(patient_id = id, "Ignoring patient resolved for a stale submission");
            return false;
        }
        self.patient_id = Some(id);
        true
    }

    pub fn complete_submit(&mut self, invoice: Invoice) {
        self.submission = Submission::Completed(invoice);
    }

    pub fn fail_submit(&mut self, message: impl Into<String>, error: ClientError) {
        self.submission = Submission::Failed {
            message: message.into(),
            error,
        };
    }

    /// Clear all state and return to the first step. The catalog is kept.
    /// Refused while a submission is in flight.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        if self.submission.is_in_flight() {
            return Err(WizardError::SubmissionInProgress);
        }
        let catalog = std::mem::take(&mut self.catalog);
        let generation = self.lookup_generation + 1;
        *self = Self::new();
        self.catalog = catalog;
        self.lookup_generation = generation;
        Ok(())
    }
}
