//! Domain error taxonomy.
//!
//! Every failure surfaced by the core maps onto one of four kinds, which the
//! HTTP layer turns into 400 / 404 / 409 / 500 respectively.

use thiserror::Error;

use crate::billing::DiscountError;
use crate::db::DbError;

#[derive(Error, Debug)]
pub enum BillingError {
    /// Malformed or missing input. Carries one message per violated rule.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique key or reference constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(vec![message.into()])
    }
}

impl From<DbError> for BillingError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => BillingError::NotFound(what),
            e if e.is_unique_violation() => {
                BillingError::Conflict("A record with the same unique value already exists".into())
            }
            e if e.is_foreign_key_violation() => {
                BillingError::Conflict("The record is still referenced by other records".into())
            }
            other => BillingError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for BillingError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::from(e).into()
    }
}

impl From<DiscountError> for BillingError {
    fn from(e: DiscountError) -> Self {
        BillingError::validation(e.to_string())
    }
}
