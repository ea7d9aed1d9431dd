use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{DoctorFilters, DoctorInput, DoctorView, SpecialtyFilters, SpecialtyInput, SpecialtyView};
use crate::services::{DoctorService, SpecialtyService};

pub const SPECIALTIES_TAG: &str = "specialties";
pub const DOCTORS_TAG: &str = "doctors";

// ==============================================================================
// SPECIALTY HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/specialties",
    tag = SPECIALTIES_TAG,
    params(SpecialtyFilters),
    responses((status = 200, description = "Filtered specialties", body = Page<SpecialtyView>))
)]
#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<SpecialtyFilters>,
) -> Result<Json<Page<SpecialtyView>>, AppError> {
    let service = SpecialtyService::new(&state);
    let page = service.list_specialties(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/specialties",
    tag = SPECIALTIES_TAG,
    request_body = SpecialtyInput,
    responses(
        (status = 201, description = "Specialty created", body = SpecialtyView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_specialty(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<SpecialtyInput>,
) -> Result<(StatusCode, Json<SpecialtyView>), AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.create_specialty(input).await?;
    let view = service.describe_one(specialty).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/specialties/{id}",
    tag = SPECIALTIES_TAG,
    params(("id" = i64, Path, description = "Specialty id")),
    responses(
        (status = 200, description = "Specialty", body = SpecialtyView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_specialty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SpecialtyView>, AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.get_specialty(id).await?;
    Ok(Json(service.describe_one(specialty).await?))
}

#[utoipa::path(
    put,
    path = "/specialties/{id}",
    tag = SPECIALTIES_TAG,
    params(("id" = i64, Path, description = "Specialty id")),
    request_body = SpecialtyInput,
    responses(
        (status = 200, description = "Specialty updated", body = SpecialtyView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_specialty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<SpecialtyInput>,
) -> Result<Json<SpecialtyView>, AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.update_specialty(id, input).await?;
    Ok(Json(service.describe_one(specialty).await?))
}

#[utoipa::path(
    delete,
    path = "/specialties/{id}",
    tag = SPECIALTIES_TAG,
    params(("id" = i64, Path, description = "Specialty id")),
    responses(
        (status = 204, description = "Specialty deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Doctors still reference the specialty")
    )
)]
#[axum::debug_handler]
pub async fn delete_specialty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    SpecialtyService::new(&state).delete_specialty(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/doctors",
    tag = DOCTORS_TAG,
    params(DoctorFilters),
    responses((status = 200, description = "Filtered doctors", body = Page<DoctorView>))
)]
#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<DoctorFilters>,
) -> Result<Json<Page<DoctorView>>, AppError> {
    let service = DoctorService::new(&state);
    let page = service.list_doctors(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/doctors",
    tag = DOCTORS_TAG,
    request_body = DoctorInput,
    responses(
        (status = 201, description = "Doctor created", body = DoctorView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<DoctorInput>,
) -> Result<(StatusCode, Json<DoctorView>), AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.create_doctor(input).await?;
    let view = service.describe_one(doctor).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/doctors/{id}",
    tag = DOCTORS_TAG,
    params(("id" = i64, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Doctor", body = DoctorView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DoctorView>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.get_doctor(id).await?;
    Ok(Json(service.describe_one(doctor).await?))
}

#[utoipa::path(
    put,
    path = "/doctors/{id}",
    tag = DOCTORS_TAG,
    params(("id" = i64, Path, description = "Doctor id")),
    request_body = DoctorInput,
    responses(
        (status = 200, description = "Doctor updated", body = DoctorView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<DoctorInput>,
) -> Result<Json<DoctorView>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.update_doctor(id, input).await?;
    Ok(Json(service.describe_one(doctor).await?))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    tag = DOCTORS_TAG,
    params(("id" = i64, Path, description = "Doctor id")),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Consultations still reference the doctor")
    )
)]
#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    DoctorService::new(&state).delete_doctor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
