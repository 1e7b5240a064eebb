//! HTTP routes.

use std::sync::{Arc, Mutex};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use patient_records_core::{
    Collection, PatientFields, PatientId, PatientRecord, PatientService, PatientUpdate,
    RecordsResult,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Shared handler state.
///
/// The mutex makes each request's load-modify-save cycle exclusive. It is
/// only taken on the blocking pool, never on a runtime worker.
#[derive(Clone)]
pub struct AppState {
    service: Arc<Mutex<PatientService>>,
}

impl AppState {
    pub fn new(service: PatientService) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
        }
    }

    /// Run one operation under the lock on tokio's blocking pool, since
    /// every operation does synchronous file I/O.
    async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&PatientService) -> RecordsResult<T> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
            let guard = service.lock()?;
            let value = op(&*guard)?;
            Ok(value)
        })
        .await?
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/home", get(home))
        .route("/patients", get(list_patients))
        .route("/patients/:patient_id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:patient_id", put(update_patient))
        .route("/delete/:patient_id", delete(delete_patient))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =========================================================================
// Response bodies
// =========================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub patient_id: PatientId,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub message: &'static str,
    pub patient_id: PatientId,
    pub patient: PatientRecord,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub deleted_patient: PatientRecord,
    pub new_patient_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SortParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

// =========================================================================
// Handlers
// =========================================================================

async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Patient Record System",
    })
}

async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "This is an API that shows Patients records",
    })
}

async fn list_patients(State(state): State<AppState>) -> Result<Json<Collection>, ApiError> {
    let patients = state.run(|service| service.list()).await?;
    Ok(Json(patients))
}

async fn view_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let record = state.run(move |service| service.get(&patient_id)).await?;
    Ok(Json(record))
}

async fn sort_patients(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    let sort_by = params.sort_by.unwrap_or_default();
    let order = params.order.unwrap_or_else(|| "asc".to_string());

    let records = state
        .run(move |service| service.sort(&sort_by, &order))
        .await?;
    Ok(Json(records))
}

async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<PatientFields>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(fields) = payload?;

    let patient_id = state.run(move |service| service.create(fields)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Patient created successfully",
            patient_id,
        }),
    ))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let Json(update) = payload?;

    let patient = state
        .run(move |service| service.update(&patient_id, update))
        .await?;
    Ok(Json(UpdatedResponse {
        message: "Patient updated successfully",
        patient_id: patient.id,
        patient: patient.record,
    }))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state
        .run(move |service| service.delete(&patient_id))
        .await?;
    Ok(Json(DeletedResponse {
        message: "Patient deleted successfully and IDs renumbered",
        deleted_patient: deleted.record,
        new_patient_count: deleted.remaining,
    }))
}
