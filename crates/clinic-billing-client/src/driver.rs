//! Async glue between a [`Wizard`] and a [`BillingBackend`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use clinic_billing_core::Invoice;

use crate::backend::BillingBackend;
use crate::error::{ClientError, ClientResult};
use crate::wizard::{Wizard, WizardError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Backend(#[from] ClientError),
}

/// Runs the wizard's remote calls.
///
/// The wizard lock is only taken between awaits, so the UI can read state
/// while a call is in flight.
pub struct WizardDriver<B> {
    backend: Arc<B>,
    wizard: Arc<Mutex<Wizard>>,
    debounce: Duration,
}

impl<B> Clone for WizardDriver<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            wizard: Arc::clone(&self.wizard),
            debounce: self.debounce,
        }
    }
}

impl<B: BillingBackend> WizardDriver<B> {
    pub fn new(backend: B, debounce: Duration) -> Self {
        Self {
            backend: Arc::new(backend),
            wizard: Arc::new(Mutex::new(Wizard::new())),
            debounce,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `f` against the wizard under the lock.
    pub fn update<T>(&self, f: impl FnOnce(&mut Wizard) -> T) -> T {
        let mut guard = self.wizard.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Wizard {
        self.update(|w| w.clone())
    }

    /// Record a phone edit and, once the debounce window passes without a
    /// newer edit, look the phone up. Returns whether a result was applied.
    ///
    /// Fails without waiting when the wizard refuses the edit.
    pub async fn phone_changed(&self, phone: &str) -> Result<bool, WizardError> {
        let Some(ticket) = self.update(|w| w.set_phone(phone))? else {
            return Ok(false);
        };

        tokio::time::sleep(self.debounce).await;
        if !self.update(|w| w.is_current(&ticket)) {
            return Ok(false);
        }

        let result = self.backend.find_patient_by_phone(&ticket.phone).await;
        if let Err(e) = &result {
            warn!(phone = %ticket.phone, error = %e, "Patient lookup failed");
        }
        Ok(self.update(|w| w.apply_lookup(&ticket, result)))
    }

    /// Fetch the test catalog into the wizard. Returns the number of tests.
    pub async fn load_catalog(&self) -> ClientResult<usize> {
        let tests = self.backend.list_tests().await?;
        let count = tests.len();
        self.update(|w| w.set_catalog(tests));
        Ok(count)
    }

    /// Submit the summary: resolve the patient if the lookup did not find
    /// one, then create the invoice under the wizard's idempotency key.
    pub async fn submit(&self) -> Result<Invoice, SubmitError> {
        let ticket = self.update(Wizard::begin_submit)?;

        let patient_id = match ticket.patient_id {
            Some(id) => id,
            None => match self.backend.resolve_patient(&ticket.patient).await {
                Ok(patient) => {
                    self.update(|w| w.record_patient(&ticket, patient.id));
                    patient.id
                }
                Err(e) => {
                    warn!(error = %e, "Patient resolution failed");
                    self.update(|w| w.fail_submit("Failed to create patient", e.clone()));
                    return Err(e.into());
                }
            },
        };

        let request = ticket.invoice_request(patient_id);
        match self
            .backend
            .create_invoice(&request, &ticket.idempotency_key)
            .await
        {
            Ok(invoice) => {
                info!(invoice_number = %invoice.invoice_number, "Invoice submitted");
                self.update(|w| w.complete_submit(invoice.clone()));
                Ok(invoice)
            }
            Err(e) => {
                warn!(error = %e, "Invoice creation failed");
                self.update(|w| w.fail_submit("Failed to create invoice", e.clone()));
                Err(e.into())
            }
        }
    }
}
