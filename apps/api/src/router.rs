use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::openapi::InfoBuilder;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use consultation_cell::{consultation_api, consultation_pages};
use doctor_cell::{doctor_api, doctor_pages};
use patient_cell::{patient_api, patient_pages};
use pharmacy_cell::{pharmacy_api, pharmacy_pages};
use shared_database::AppState;
use treatment_cell::{treatment_api, treatment_pages};
use user_cell::user_api;

use crate::home;

const RESOURCES: [&str; 9] = [
    "specialties",
    "patients",
    "doctors",
    "laboratories",
    "medications",
    "consultations",
    "treatments",
    "prescriptions",
    "users",
];

async fn api_index() -> Json<Value> {
    let resources: Map<String, Value> = RESOURCES
        .iter()
        .map(|name| (name.to_string(), Value::String(format!("/api/{}", name))))
        .collect();
    Json(json!({
        "resources": resources,
        "schema": "/api/schema",
        "docs": "/api/docs",
    }))
}

fn api_routes() -> OpenApiRouter<Arc<AppState>> {
    OpenApiRouter::new()
        .route("/", get(api_index))
        .merge(doctor_api())
        .merge(patient_api())
        .merge(pharmacy_api())
        .merge(consultation_api())
        .merge(treatment_api())
        .merge(user_api())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let (api, mut openapi) = OpenApiRouter::new().nest("/api", api_routes()).split_for_parts();
    openapi.info = InfoBuilder::new()
        .title("Clinic API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    Router::new()
        .route("/", get(home::dashboard))
        .merge(api)
        .merge(SwaggerUi::new("/api/docs").url("/api/schema", openapi))
        .merge(doctor_pages())
        .merge(patient_pages())
        .merge(pharmacy_pages())
        .merge(consultation_pages())
        .merge(treatment_pages())
        .with_state(state)
}
