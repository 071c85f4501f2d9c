//! Clinic Billing Core Library
//!
//! Patient lookup, lab test catalog and invoice creation for a small clinic.
//!
//! # Architecture
//!
//! ```text
//! phone ──► PatientResolver ──► Patient (existing or created)
//!                                   │
//! test ids ──► LabTest catalog ─────┤
//!                                   ▼
//!                  billing::compute_totals (net, discount, final)
//!                                   │
//!                   ┌───────────────▼───────────────┐
//!                   │   InvoiceLedger (one SQLite   │
//!                   │   transaction: header + lines)│
//!                   └───────────────┬───────────────┘
//!                                   │
//!                                   ▼
//!                          Invoice (immutable)
//! ```
//!
//! # Core Principle
//!
//! **Never trust client totals.** Prices are read from the catalog and totals
//! are recomputed server-side for every invoice. The same [`billing`] module
//! drives the live preview in the client wizard.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence
//! - [`models`]: Domain types (Patient, LabTest, Invoice, ...)
//! - [`validation`]: Field constraints shared by server and client
//! - [`billing`]: Totals computation, invoice numbers, invoice persistence
//! - [`resolver`]: Patient lookup-or-create
//! - [`catalog`]: Lab test catalog CRUD
//! - [`report`]: Dashboard aggregates

pub mod billing;
pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod resolver;
pub mod validation;

// Re-export commonly used types
pub use billing::{
    compute_totals, Discount, DiscountError, InvoiceLedger, InvoiceNumberGenerator,
    InvoiceOutcome, InvoiceQuery, Totals,
};
pub use catalog::TestCatalog;
pub use db::Database;
pub use error::{BillingError, BillingResult};
pub use models::{
    DiscountType, Gender, Invoice, InvoiceDetail, InvoiceRequest, LabTest, LabTestId, Patient,
    PatientId, TestResult,
};
pub use report::DailyInvoiceSummary;
pub use resolver::{PatientResolver, Resolution};
