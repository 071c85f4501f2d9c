//! API router.
//!
//! All routes are nested under `/api/v1`. Layers (outermost first):
//! CORS, then request tracing.

use axum::http::{header, HeaderName, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::endpoints::{self, invoices::IDEMPOTENCY_KEY_HEADER};
use crate::state::AppState;

/// Routes plus tracing, without CORS.
pub fn api_router(state: AppState) -> Router {
    // NOTE: Path params use `:param` syntax (axum 0.7).
    let v1 = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patient",
            get(endpoints::patients::list).post(endpoints::patients::create_or_fetch),
        )
        .route(
            "/patient/:id",
            get(endpoints::patients::detail)
                .patch(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/patient-gender-ratio", get(endpoints::patients::gender_ratio))
        .route("/create-test", post(endpoints::lab_tests::create))
        .route("/get-all-test", get(endpoints::lab_tests::list))
        .route("/update-test/:id", patch(endpoints::lab_tests::update))
        .route("/delete-test/:id", delete(endpoints::lab_tests::remove))
        .route("/search/:name", get(endpoints::lab_tests::search))
        .route("/invoice", post(endpoints::invoices::create))
        .route("/invoice/:id", get(endpoints::invoices::detail))
        .route("/invoices", get(endpoints::invoices::list))
        .route("/invoice-report", get(endpoints::reports::invoice_report))
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
}

/// Full application: routes, tracing and CORS for the configured origin.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(config.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(IDEMPOTENCY_KEY_HEADER),
        ]);

    api_router(state).layer(cors)
}
