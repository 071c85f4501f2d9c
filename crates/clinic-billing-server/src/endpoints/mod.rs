//! Route handlers, one module per resource.

pub mod health;
pub mod invoices;
pub mod patients;
pub mod reports;

use serde::Serialize;

/// `{ "message": .. }` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
