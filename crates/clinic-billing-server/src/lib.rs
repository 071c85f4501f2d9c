//! Clinic Billing REST API
//!
//! axum handlers over [`clinic_billing_core`]. Every database call runs on
//! the blocking pool through [`AppState::with_db`]; errors leave the core as
//! [`clinic_billing_core::BillingError`] and reach the client as
//! [`ApiError`] JSON bodies.

pub mod config;
pub mod endpoints;
pub mod error;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::{api_router, app};
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
