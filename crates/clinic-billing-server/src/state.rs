//! Shared handler state.

use std::sync::{Arc, Mutex};

use clinic_billing_core::db::DbResult;
use clinic_billing_core::{BillingResult, Database, InvoiceNumberGenerator};

use crate::config::ServerConfig;
use crate::error::ApiError;

/// One SQLite connection behind a mutex, plus the process-wide invoice
/// number generator.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    numbers: Arc<InvoiceNumberGenerator>,
}

impl AppState {
    /// Wrap an open database. The number generator continues after the
    /// highest stored invoice number.
    pub fn new(db: Database) -> DbResult<Self> {
        let numbers = InvoiceNumberGenerator::for_database(&db)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            numbers: Arc::new(numbers),
        })
    }

    pub fn open(config: &ServerConfig) -> DbResult<Self> {
        let db = if config.is_in_memory() {
            Database::open_in_memory()?
        } else {
            Database::open(&config.db_path)?
        };
        Self::new(db)
    }

    pub fn numbers(&self) -> Arc<InvoiceNumberGenerator> {
        Arc::clone(&self.numbers)
    }

    /// Run `f` with exclusive access to the database on the blocking pool.
    pub async fn with_db<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Database) -> BillingResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
            f(&mut guard).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("database task failed: {e}")))?
    }
}
