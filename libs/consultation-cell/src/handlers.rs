use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{ConsultationFilters, ConsultationInput, ConsultationView};
use crate::services::ConsultationService;

pub const CONSULTATIONS_TAG: &str = "consultations";

#[utoipa::path(
    get,
    path = "/consultations",
    tag = CONSULTATIONS_TAG,
    params(ConsultationFilters),
    responses(
        (status = 200, description = "Filtered consultations", body = Page<ConsultationView>),
        (status = 400, description = "Malformed filter value")
    )
)]
#[axum::debug_handler]
pub async fn list_consultations(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ConsultationFilters>,
) -> Result<Json<Page<ConsultationView>>, AppError> {
    let service = ConsultationService::new(&state);
    let page = service.list_consultations(&filters).await?;
    let results = service.describe(page.results).await?;
    Ok(Json(Page::new(page.count, results)))
}

#[utoipa::path(
    post,
    path = "/consultations",
    tag = CONSULTATIONS_TAG,
    request_body = ConsultationInput,
    responses(
        (status = 201, description = "Consultation booked", body = ConsultationView),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_consultation(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<ConsultationInput>,
) -> Result<(StatusCode, Json<ConsultationView>), AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service.create_consultation(input).await?;
    let view = service.describe_one(consultation).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/consultations/{id}",
    tag = CONSULTATIONS_TAG,
    params(("id" = i64, Path, description = "Consultation id")),
    responses(
        (status = 200, description = "Consultation", body = ConsultationView),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_consultation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ConsultationView>, AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service.get_consultation(id).await?;
    Ok(Json(service.describe_one(consultation).await?))
}

#[utoipa::path(
    put,
    path = "/consultations/{id}",
    tag = CONSULTATIONS_TAG,
    params(("id" = i64, Path, description = "Consultation id")),
    request_body = ConsultationInput,
    responses(
        (status = 200, description = "Consultation updated", body = ConsultationView),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_consultation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<ConsultationInput>,
) -> Result<Json<ConsultationView>, AppError> {
    let service = ConsultationService::new(&state);
    let consultation = service.update_consultation(id, input).await?;
    Ok(Json(service.describe_one(consultation).await?))
}

#[utoipa::path(
    delete,
    path = "/consultations/{id}",
    tag = CONSULTATIONS_TAG,
    params(("id" = i64, Path, description = "Consultation id")),
    responses(
        (status = 204, description = "Consultation deleted along with its treatments"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_consultation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ConsultationService::new(&state).delete_consultation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
