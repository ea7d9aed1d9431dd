use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa_axum::{router::OpenApiRouter, routes};

use shared_database::AppState;

use crate::handlers::*;
use crate::views;

/// REST endpoints for specialties and doctors, mounted under `/api` by the app.
pub fn doctor_api() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .routes(routes!(list_specialties, create_specialty))
        .routes(routes!(get_specialty, update_specialty, delete_specialty))
        .routes(routes!(list_doctors, create_doctor))
        .routes(routes!(get_doctor, update_doctor, delete_doctor))
}

pub fn doctor_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/specialties", get(views::specialty_list_page))
        .route(
            "/specialties/new",
            get(views::new_specialty_page).post(views::create_specialty_page),
        )
        .route(
            "/specialties/{id}/edit",
            get(views::edit_specialty_page).post(views::update_specialty_page),
        )
        .route(
            "/specialties/{id}/delete",
            get(views::confirm_delete_specialty_page).post(views::delete_specialty_page),
        )
        .route("/doctors", get(views::doctor_list_page))
        .route("/doctors/new", get(views::new_doctor_page).post(views::create_doctor_page))
        .route(
            "/doctors/{id}/edit",
            get(views::edit_doctor_page).post(views::update_doctor_page),
        )
        .route(
            "/doctors/{id}/delete",
            get(views::confirm_delete_doctor_page).post(views::delete_doctor_page),
        )
}
