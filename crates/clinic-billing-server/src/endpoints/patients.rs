//! Patient endpoints.
//!
//! - `GET /api/v1/patient` lookup and listing (never creates)
//! - `POST /api/v1/patient` create-or-fetch by phone
//! - `GET|PATCH|DELETE /api/v1/patient/:id`

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use clinic_billing_core::models::{GenderRatio, Page, Patient, PatientInput, PatientUpdate};
use clinic_billing_core::PatientResolver;

use super::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PatientListQuery {
    /// Paging applies only when at least one of `page` / `limit` is given.
    fn page(&self) -> Option<Page> {
        match (self.page, self.limit) {
            (None, None) => None,
            (page, limit) => Some(Page::new(page.unwrap_or(1), limit.unwrap_or(10))),
        }
    }
}

/// `GET /api/v1/patient?search=&page=&limit=`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PatientListQuery>, QueryRejection>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let Query(query) = query?;
    let page = query.page();
    let patients = state
        .with_db(move |db| PatientResolver::new(db).search(query.search.as_deref(), page))
        .await?;
    Ok(Json(patients))
}

/// `POST /api/v1/patient`: 200 with the stored record when the phone is
/// known, 201 when a patient was created.
pub async fn create_or_fetch(
    State(state): State<AppState>,
    body: Result<Json<PatientInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(input) = body?;
    let resolution = state
        .with_db(move |db| PatientResolver::new(db).resolve_or_create(&input))
        .await?;

    let status = if resolution.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(resolution.into_patient())))
}

/// `GET /api/v1/patient/:id`
pub async fn detail(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Path(id) = id?;
    let patient = state
        .with_db(move |db| PatientResolver::new(db).get(id))
        .await?;
    Ok(Json(patient))
}

/// `PATCH /api/v1/patient/:id`
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    let patient = state
        .with_db(move |db| PatientResolver::new(db).update(id, &update))
        .await?;
    Ok(Json(patient))
}

/// `DELETE /api/v1/patient/:id`
pub async fn remove(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state
        .with_db(move |db| PatientResolver::new(db).delete(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "Patient deleted successfully",
    }))
}

/// `GET /api/v1/patient-gender-ratio`
pub async fn gender_ratio(State(state): State<AppState>) -> Result<Json<GenderRatio>, ApiError> {
    let ratio = state
        .with_db(|db| PatientResolver::new(db).gender_ratio())
        .await?;
    Ok(Json(ratio))
}
