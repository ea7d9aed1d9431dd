use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa_axum::{router::OpenApiRouter, routes};

use shared_database::AppState;

use crate::handlers::*;
use crate::views;

/// REST endpoints for laboratories and medications.
pub fn pharmacy_api() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_laboratories, create_laboratory))
        .routes(routes!(get_laboratory, update_laboratory, delete_laboratory))
        .routes(routes!(list_medications, create_medication))
        .routes(routes!(get_medication, update_medication, delete_medication))
}

pub fn pharmacy_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/laboratories", get(views::laboratory_list_page))
        .route(
            "/laboratories/new",
            get(views::new_laboratory_page).post(views::create_laboratory_page),
        )
        .route(
            "/laboratories/{id}/edit",
            get(views::edit_laboratory_page).post(views::update_laboratory_page),
        )
        .route(
            "/laboratories/{id}/delete",
            get(views::confirm_delete_laboratory_page).post(views::delete_laboratory_page),
        )
        .route("/medications", get(views::medication_list_page))
        .route(
            "/medications/new",
            get(views::new_medication_page).post(views::create_medication_page),
        )
        .route(
            "/medications/{id}/edit",
            get(views::edit_medication_page).post(views::update_medication_page),
        )
        .route(
            "/medications/{id}/delete",
            get(views::confirm_delete_medication_page).post(views::delete_medication_page),
        )
}
