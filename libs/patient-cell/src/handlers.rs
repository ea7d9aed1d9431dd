use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{PatientFilters, PatientInput, PatientView};
use crate::services::PatientService;

pub const PATIENTS_TAG: &str = "patients";

#[utoipa::path(
    get,
    path = "/patients",
    tag = PATIENTS_TAG,
    params(PatientFilters),
    responses((status = 200, description = "Filtered patients", body = Page<PatientView>))
)]
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<PatientFilters>,
) -> Result<Json<Page<PatientView>>, AppError> {
    let service = PatientService::new(&state);
    let page = service.list_patients(&filters).await?;
    Ok(Json(page.map(|patient| service.describe(patient))))
}

#[utoipa::path(
    post,
    path = "/patients",
    tag = PATIENTS_TAG,
    request_body = PatientInput,
    responses(
        (status = 201, description = "Patient registered", body = PatientView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<PatientInput>,
) -> Result<(StatusCode, Json<PatientView>), AppError> {
    let service = PatientService::new(&state);
    let patient = service.create_patient(input).await?;
    Ok((StatusCode::CREATED, Json(service.describe(patient))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = PATIENTS_TAG,
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PatientView>, AppError> {
    let service = PatientService::new(&state);
    let patient = service.get_patient(id).await?;
    Ok(Json(service.describe(patient)))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    tag = PATIENTS_TAG,
    params(("id" = i64, Path, description = "Patient id")),
    request_body = PatientInput,
    responses(
        (status = 200, description = "Patient updated", body = PatientView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<PatientInput>,
) -> Result<Json<PatientView>, AppError> {
    let service = PatientService::new(&state);
    let patient = service.update_patient(id, input).await?;
    Ok(Json(service.describe(patient)))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    tag = PATIENTS_TAG,
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Consultations still reference the patient")
    )
)]
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    PatientService::new(&state).delete_patient(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
