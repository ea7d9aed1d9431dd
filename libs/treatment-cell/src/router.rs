use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa_axum::{router::OpenApiRouter, routes};

use shared_database::AppState;

use crate::handlers::*;
use crate::views;

/// REST endpoints for treatments and their prescriptions.
pub fn treatment_api() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_treatments, create_treatment))
        .routes(routes!(get_treatment, update_treatment, delete_treatment))
        .routes(routes!(list_prescriptions, create_prescription))
        .routes(routes!(get_prescription, update_prescription, delete_prescription))
}

pub fn treatment_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/treatments", get(views::treatment_list_page))
        .route(
            "/treatments/new",
            get(views::new_treatment_page).post(views::create_treatment_page),
        )
        .route(
            "/treatments/{id}/edit",
            get(views::edit_treatment_page).post(views::update_treatment_page),
        )
        .route(
            "/treatments/{id}/delete",
            get(views::confirm_delete_treatment_page).post(views::delete_treatment_page),
        )
        .route("/prescriptions", get(views::prescription_list_page))
        .route(
            "/prescriptions/new",
            get(views::new_prescription_page).post(views::create_prescription_page),
        )
        .route(
            "/prescriptions/{id}/edit",
            get(views::edit_prescription_page).post(views::update_prescription_page),
        )
        .route(
            "/prescriptions/{id}/delete",
            get(views::confirm_delete_prescription_page).post(views::delete_prescription_page),
        )
}
