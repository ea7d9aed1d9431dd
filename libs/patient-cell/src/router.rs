use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa_axum::{router::OpenApiRouter, routes};

use shared_database::AppState;

use crate::handlers::*;
use crate::views;

pub fn patient_api() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_patients, create_patient))
        .routes(routes!(get_patient, update_patient, delete_patient))
}

pub fn patient_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/patients", get(views::patient_list_page))
        .route("/patients/new", get(views::new_patient_page).post(views::create_patient_page))
        .route(
            "/patients/{id}/edit",
            get(views::edit_patient_page).post(views::update_patient_page),
        )
        .route(
            "/patients/{id}/delete",
            get(views::confirm_delete_patient_page).post(views::delete_patient_page),
        )
}
