use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{Laboratory, LaboratoryFilters, LaboratoryInput, MedicationFilters, MedicationInput, MedicationView};
use crate::services::{LaboratoryService, MedicationService};

pub const LABORATORIES_TAG: &str = "laboratories";
pub const MEDICATIONS_TAG: &str = "medications";

// ==============================================================================
// LABORATORY HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/laboratories",
    tag = LABORATORIES_TAG,
    params(LaboratoryFilters),
    responses((status = 200, description = "Filtered laboratories", body = Page<Laboratory>))
)]
#[axum::debug_handler]
pub async fn list_laboratories(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<LaboratoryFilters>,
) -> Result<Json<Page<Laboratory>>, AppError> {
    let page = LaboratoryService::new(&state).list_laboratories(&filters).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/laboratories",
    tag = LABORATORIES_TAG,
    request_body = LaboratoryInput,
    responses(
        (status = 201, description = "Laboratory created", body = Laboratory),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_laboratory(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<LaboratoryInput>,
) -> Result<(StatusCode, Json<Laboratory>), AppError> {
    let laboratory = LaboratoryService::new(&state).create_laboratory(input).await?;
    Ok((StatusCode::CREATED, Json(laboratory)))
}

#[utoipa::path(
    get,
    path = "/laboratories/{id}",
    tag = LABORATORIES_TAG,
    params(("id" = i64, Path, description = "Laboratory id")),
    responses(
        (status = 200, description = "Laboratory", body = Laboratory),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_laboratory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Laboratory>, AppError> {
    Ok(Json(LaboratoryService::new(&state).get_laboratory(id).await?))
}

#[utoipa::path(
    put,
    path = "/laboratories/{id}",
    tag = LABORATORIES_TAG,
    params(("id" = i64, Path, description = "Laboratory id")),
    request_body = LaboratoryInput,
    responses(
        (status = 200, description = "Laboratory updated", body = Laboratory),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_laboratory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<LaboratoryInput>,
) -> Result<Json<Laboratory>, AppError> {
    Ok(Json(LaboratoryService::new(&state).update_laboratory(id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/laboratories/{id}",
    tag = LABORATORIES_TAG,
    params(("id" = i64, Path, description = "Laboratory id")),
    responses(
        (status = 204, description = "Laboratory deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Medications still reference the laboratory")
    )
)]
#[axum::debug_handler]
pub async fn delete_laboratory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    LaboratoryService::new(&state).delete_laboratory(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// MEDICATION HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/medications",
    tag = MEDICATIONS_TAG,
    params(MedicationFilters),
    responses((status = 200, description = "Filtered medications", body = Page<MedicationView>))
)]
#[axum::debug_handler]
pub async fn list_medications(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<MedicationFilters>,
) -> Result<Json<Page<MedicationView>>, AppError> {
    let service = MedicationService::new(&state);
    let page = service.list_medications(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/medications",
    tag = MEDICATIONS_TAG,
    request_body = MedicationInput,
    responses(
        (status = 201, description = "Medication created", body = MedicationView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_medication(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<MedicationInput>,
) -> Result<(StatusCode, Json<MedicationView>), AppError> {
    let service = MedicationService::new(&state);
    let medication = service.create_medication(input).await?;
    let view = service.describe_one(medication).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/medications/{id}",
    tag = MEDICATIONS_TAG,
    params(("id" = i64, Path, description = "Medication id")),
    responses(
        (status = 200, description = "Medication", body = MedicationView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_medication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MedicationView>, AppError> {
    let service = MedicationService::new(&state);
    let medication = service.get_medication(id).await?;
    Ok(Json(service.describe_one(medication).await?))
}

#[utoipa::path(
    put,
    path = "/medications/{id}",
    tag = MEDICATIONS_TAG,
    params(("id" = i64, Path, description = "Medication id")),
    request_body = MedicationInput,
    responses(
        (status = 200, description = "Medication updated", body = MedicationView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_medication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<MedicationInput>,
) -> Result<Json<MedicationView>, AppError> {
    let service = MedicationService::new(&state);
    let medication = service.update_medication(id, input).await?;
    Ok(Json(service.describe_one(medication).await?))
}

#[utoipa::path(
    delete,
    path = "/medications/{id}",
    tag = MEDICATIONS_TAG,
    params(("id" = i64, Path, description = "Medication id")),
    responses(
        (status = 204, description = "Medication deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Prescriptions still reference the medication")
    )
)]
#[axum::debug_handler]
pub async fn delete_medication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    MedicationService::new(&state).delete_medication(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
