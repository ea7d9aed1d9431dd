use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa_axum::{router::OpenApiRouter, routes};

use shared_database::AppState;

use crate::handlers::*;
use crate::views;

pub fn consultation_api() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_consultations, create_consultation))
        .routes(routes!(get_consultation, update_consultation, delete_consultation))
}

pub fn consultation_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/consultations", get(views::consultation_list_page))
        .route(
            "/consultations/new",
            get(views::new_consultation_page).post(views::create_consultation_page),
        )
        .route(
            "/consultations/{id}/edit",
            get(views::edit_consultation_page).post(views::update_consultation_page),
        )
        .route(
            "/consultations/{id}/delete",
            get(views::confirm_delete_consultation_page).post(views::delete_consultation_page),
        )
}
