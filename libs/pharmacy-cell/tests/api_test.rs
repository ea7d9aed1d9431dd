use std::sync::Arc;

use axum::{http::StatusCode, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use pharmacy_cell::{pharmacy_api, pharmacy_pages};
use shared_database::{AppState, Table};
use shared_utils::test_utils::{flash_of, form_request, get, json_request, location, read_json, read_text, TestConfig};
use shared_utils::FlashLevel;

fn create_test_app(state: Arc<AppState>) -> Router {
    let (api, _) = pharmacy_api().split_for_parts();
    Router::new().nest("/api", api).merge(pharmacy_pages()).with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(json_request(method, uri, body)).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json(response).await)
}

async fn create_laboratory(app: &Router, name: &str, country: &str) -> i64 {
    let (status, body) = send(app, "POST", "/api/laboratories", Some(json!({ "name": name, "country": country }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

fn medication_body(laboratory_id: i64, name: &str, stock: i32) -> Value {
    json!({
        "name": name,
        "active_ingredient": name,
        "form": "Tablet",
        "concentration": "500mg",
        "laboratory_id": laboratory_id,
        "stock": stock
    })
}

/// Writes a prescription for the medication through the store, along with
/// the records it hangs from.
async fn prescribe(state: &AppState, medication_id: i64) {
    let store = &state.store;
    let specialty = store
        .insert(Table::Specialties, json!({ "name": "General", "description": "", "active": true, "created_at": "2024-01-01T00:00:00Z" }))
        .await
        .unwrap();
    let doctor = store
        .insert(
            Table::Doctors,
            json!({
                "national_id": "99999999-9", "first_name": "Eva", "paternal_surname": "Lagos",
                "maternal_surname": "", "specialty_id": specialty["id"], "phone": "",
                "email": "eva@clinic.cl", "registration_number": "REG-900", "shift": "FULL_TIME",
                "active": true, "hired_on": "2020-01-01"
            }),
        )
        .await
        .unwrap();
    let patient = store
        .insert(
            Table::Patients,
            json!({
                "national_id": "12345678-5", "first_name": "Juan", "paternal_surname": "Perez",
                "maternal_surname": "", "birth_date": "1980-01-01", "phone": "", "email": "",
                "address": "", "coverage": "FONASA", "active": true, "registered_at": "2024-01-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();
    let consultation = store
        .insert(
            Table::Consultations,
            json!({
                "patient_id": patient["id"], "doctor_id": doctor["id"],
                "scheduled_at": "2024-05-01T10:00:00Z", "reason": "Headache", "diagnosis": "Migraine",
                "notes": "", "status": "COMPLETED", "created_at": "2024-04-01T00:00:00Z"
            }),
        )
        .await
        .unwrap();
    let treatment = store
        .insert(
            Table::Treatments,
            json!({
                "consultation_id": consultation["id"], "description": "Pain relief",
                "start_date": "2024-05-01", "end_date": null, "instructions": "Rest", "active": true
            }),
        )
        .await
        .unwrap();
    store
        .insert(
            Table::Prescriptions,
            json!({
                "treatment_id": treatment["id"], "medication_id": medication_id,
                "dosage": "1 tablet", "frequency": "Every 8 hours", "duration": "5 days",
                "total_quantity": 15, "special_instructions": "", "issued_on": "2024-05-01"
            }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn prescribed_medication_cannot_be_deleted() {
    let state = TestConfig::default().to_state();
    let app = create_test_app(state.clone());
    let laboratory_id = create_laboratory(&app, "Laboratorio Chile", "Chile").await;

    let (status, medication) = send(&app, "POST", "/api/medications", Some(medication_body(laboratory_id, "Paracetamol", 500))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(medication["laboratory_name"], "Laboratorio Chile");
    assert_eq!(medication["stock"], 500);
    let id = medication["id"].as_i64().unwrap();
    prescribe(&state, id).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/medications/{}", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["blocked_by"], "prescriptions");
    assert_eq!(body["dependents"], 1);

    let (status, _) = send(&app, "GET", &format!("/api/medications/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn laboratory_with_medications_cannot_be_deleted() {
    let app = create_test_app(TestConfig::default().to_state());
    let laboratory_id = create_laboratory(&app, "Recalcine", "Chile").await;
    send(&app, "POST", "/api/medications", Some(medication_body(laboratory_id, "Ibuprofen", 10))).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/laboratories/{}", laboratory_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["blocked_by"], "medications");

    let response = app
        .clone()
        .oneshot(get(&format!("/laboratories/{}/delete", laboratory_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/laboratories"));
    assert_eq!(flash_of(&response).unwrap().level, FlashLevel::Error);
}

#[tokio::test]
async fn laboratory_validation() {
    let app = create_test_app(TestConfig::default().to_state());
    create_laboratory(&app, "Bayer", "Germany").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/laboratories",
        Some(json!({ "name": "Ab", "country": "", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["name"][0], "Laboratory name is too short.");
    assert_eq!(body["fields"]["country"][0], "This field is required.");
    assert_eq!(body["fields"]["email"][0], "Enter a valid email address.");

    let (status, body) = send(&app, "POST", "/api/laboratories", Some(json!({ "name": "Bayer", "country": "Germany" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["name"][0], "Laboratory with this name already exists.");
}

#[tokio::test]
async fn negative_stock_and_unknown_laboratory_are_rejected() {
    let app = create_test_app(TestConfig::default().to_state());

    let (status, body) = send(&app, "POST", "/api/medications", Some(medication_body(42, "Aspirin", -1))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["stock"][0], "Stock cannot be negative.");
    assert_eq!(body["fields"]["laboratory_id"][0], "Select a valid laboratory.");
}

#[tokio::test]
async fn medications_filter_by_laboratory_name_and_order_by_stock() {
    let app = create_test_app(TestConfig::default().to_state());
    let chile = create_laboratory(&app, "Laboratorio Chile", "Chile").await;
    let bayer = create_laboratory(&app, "Bayer", "Germany").await;
    send(&app, "POST", "/api/medications", Some(medication_body(chile, "Paracetamol", 500))).await;
    send(&app, "POST", "/api/medications", Some(medication_body(chile, "Loratadine", 20))).await;
    send(&app, "POST", "/api/medications", Some(medication_body(bayer, "Aspirin", 300))).await;

    let (_, body) = send(&app, "GET", "/api/medications?laboratory_name=chile&ordering=-stock", None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["name"], "Paracetamol");
    assert_eq!(body["results"][1]["name"], "Loratadine");

    let (_, body) = send(&app, "GET", "/api/medications?search=bayer", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Aspirin");

    let (_, body) = send(&app, "GET", "/api/medications", None).await;
    assert_eq!(body["results"][0]["name"], "Aspirin");
}

#[tokio::test]
async fn laboratory_country_filter_is_exact() {
    let app = create_test_app(TestConfig::default().to_state());
    create_laboratory(&app, "Laboratorio Chile", "Chile").await;
    create_laboratory(&app, "Andromaco", "Chile").await;
    create_laboratory(&app, "Bayer", "Germany").await;

    let (_, body) = send(&app, "GET", "/api/laboratories?country=Chile", None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["name"], "Andromaco");

    let (_, body) = send(&app, "GET", "/api/laboratories?country=Chil", None).await;
    assert_eq!(body["count"], 0);

    let response = app.clone().oneshot(get("/laboratories")).await.unwrap();
    let html = read_text(response).await;
    assert!(html.contains("Germany"));
    assert!(html.contains("3 record(s)"));
}

#[tokio::test]
async fn medication_form_reports_bad_numbers() {
    let state = TestConfig::default().to_state();
    let app = create_test_app(state);
    let laboratory_id = create_laboratory(&app, "Bayer", "Germany").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/medications/new",
            &[("name", "Aspirin"), ("laboratory_id", &laboratory_id.to_string()), ("stock", "lots")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_text(response).await.contains("Enter a whole number."));

    let response = app
        .clone()
        .oneshot(form_request(
            "/medications/new",
            &[
                ("name", "Aspirin"),
                ("active_ingredient", "Acetylsalicylic acid"),
                ("form", "Tablet"),
                ("concentration", "100mg"),
                ("laboratory_id", &laboratory_id.to_string()),
                ("stock", "30"),
                ("active", "true"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_of(&response).unwrap().level, FlashLevel::Success);

    let (_, body) = send(&app, "GET", "/api/medications?requires_prescription=false", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["stock"], 30);
}
