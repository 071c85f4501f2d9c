//! Clinic Billing Client
//!
//! The invoice creation wizard and an HTTP backend for the billing API.
//!
//! ```text
//! UI events ──► WizardDriver ──► Wizard (pure state machine)
//!                    │
//!                    ▼
//!            BillingBackend ──► HttpBackend (reqwest, retry, timeout)
//! ```
//!
//! Totals shown while selecting tests come from
//! [`clinic_billing_core::compute_totals`], the same function the server
//! uses, so the preview matches the stored invoice.

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod session;
pub mod wizard;

pub use backend::BillingBackend;
pub use config::{ClientConfig, RetryPolicy};
pub use driver::{SubmitError, WizardDriver};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use session::Session;
pub use wizard::{LookupState, PatientForm, Step, Submission, Wizard, WizardError};
