use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use shared_database::AppState;
use shared_models::{AppError, Page};
use shared_utils::JsonBody;

use crate::models::{User, UserFilters, UserInput};
use crate::services::UserService;

pub const USERS_TAG: &str = "users";

#[utoipa::path(
    get,
    path = "/users",
    tag = USERS_TAG,
    params(UserFilters),
    responses((status = 200, description = "Filtered users", body = Page<User>))
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<UserFilters>,
) -> Result<Json<Page<User>>, AppError> {
    Ok(Json(UserService::new(&state).list_users(&filters).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_TAG,
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::new(&state).create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = USERS_TAG,
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::new(&state).get_user(id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = USERS_TAG,
    params(("id" = i64, Path, description = "User id")),
    request_body = UserInput,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::new(&state).update_user(id, input).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = USERS_TAG,
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    UserService::new(&state).delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
