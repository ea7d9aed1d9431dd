use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{
    PrescriptionFilters, PrescriptionInput, PrescriptionView, TreatmentFilters, TreatmentInput, TreatmentView,
};
use crate::services::{PrescriptionService, TreatmentService};

pub const TREATMENTS_TAG: &str = "treatments";
pub const PRESCRIPTIONS_TAG: &str = "prescriptions";

// ==============================================================================
// TREATMENT HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/treatments",
    tag = TREATMENTS_TAG,
    params(TreatmentFilters),
    responses(
        (status = 200, description = "Filtered treatments", body = Page<TreatmentView>),
        (status = 400, description = "Malformed filter value")
    )
)]
#[axum::debug_handler]
pub async fn list_treatments(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<TreatmentFilters>,
) -> Result<Json<Page<TreatmentView>>, AppError> {
    let service = TreatmentService::new(&state);
    let page = service.list_treatments(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/treatments",
    tag = TREATMENTS_TAG,
    request_body = TreatmentInput,
    responses(
        (status = 201, description = "Treatment created", body = TreatmentView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_treatment(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<TreatmentInput>,
) -> Result<(StatusCode, Json<TreatmentView>), AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service.create_treatment(input).await?;
    let view = service.describe_one(treatment).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/treatments/{id}",
    tag = TREATMENTS_TAG,
    params(("id" = i64, Path, description = "Treatment id")),
    responses(
        (status = 200, description = "Treatment", body = TreatmentView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_treatment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TreatmentView>, AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service.get_treatment(id).await?;
    Ok(Json(service.describe_one(treatment).await?))
}

#[utoipa::path(
    put,
    path = "/treatments/{id}",
    tag = TREATMENTS_TAG,
    params(("id" = i64, Path, description = "Treatment id")),
    request_body = TreatmentInput,
    responses(
        (status = 200, description = "Treatment updated", body = TreatmentView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_treatment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<TreatmentInput>,
) -> Result<Json<TreatmentView>, AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service.update_treatment(id, input).await?;
    Ok(Json(service.describe_one(treatment).await?))
}

#[utoipa::path(
    delete,
    path = "/treatments/{id}",
    tag = TREATMENTS_TAG,
    params(("id" = i64, Path, description = "Treatment id")),
    responses(
        (status = 204, description = "Treatment deleted along with its prescriptions"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_treatment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    TreatmentService::new(&state).delete_treatment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// PRESCRIPTION HANDLERS
// ==============================================================================

#[utoipa::path(
    get,
    path = "/prescriptions",
    tag = PRESCRIPTIONS_TAG,
    params(PrescriptionFilters),
    responses(
        (status = 200, description = "Filtered prescriptions", body = Page<PrescriptionView>),
        (status = 400, description = "Malformed filter value")
    )
)]
#[axum::debug_handler]
pub async fn list_prescriptions(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<PrescriptionFilters>,
) -> Result<Json<Page<PrescriptionView>>, AppError> {
    let service = PrescriptionService::new(&state);
    let page = service.list_prescriptions(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    tag = PRESCRIPTIONS_TAG,
    request_body = PrescriptionInput,
    responses(
        (status = 201, description = "Prescription issued", body = PrescriptionView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<PrescriptionInput>,
) -> Result<(StatusCode, Json<PrescriptionView>), AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.create_prescription(input).await?;
    let view = service.describe_one(prescription).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/prescriptions/{id}",
    tag = PRESCRIPTIONS_TAG,
    params(("id" = i64, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription", body = PrescriptionView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PrescriptionView>, AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.get_prescription(id).await?;
    Ok(Json(service.describe_one(prescription).await?))
}

#[utoipa::path(
    put,
    path = "/prescriptions/{id}",
    tag = PRESCRIPTIONS_TAG,
    params(("id" = i64, Path, description = "Prescription id")),
    request_body = PrescriptionInput,
    responses(
        (status = 200, description = "Prescription updated", body = PrescriptionView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_prescription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<PrescriptionInput>,
) -> Result<Json<PrescriptionView>, AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.update_prescription(id, input).await?;
    Ok(Json(service.describe_one(prescription).await?))
}

#[utoipa::path(
    delete,
    path = "/prescriptions/{id}",
    tag = PRESCRIPTIONS_TAG,
    params(("id" = i64, Path, description = "Prescription id")),
    responses(
        (status = 204, description = "Prescription deleted"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_prescription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    PrescriptionService::new(&state).delete_prescription(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
