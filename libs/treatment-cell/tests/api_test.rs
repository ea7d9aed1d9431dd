use std::sync::Arc;

use axum::{http::StatusCode, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use consultation_cell::models::ConsultationInput;
use consultation_cell::services::ConsultationService;
use doctor_cell::models::{DoctorInput, SpecialtyInput};
use doctor_cell::services::{DoctorService, SpecialtyService};
use patient_cell::models::PatientInput;
use patient_cell::services::PatientService;
use pharmacy_cell::models::{LaboratoryInput, MedicationInput};
use pharmacy_cell::services::{LaboratoryService, MedicationService};
use shared_database::{AppState, Table};
use shared_utils::test_utils::{flash_of, form_request, get, json_request, read_json, read_text, TestConfig};
use shared_utils::FlashLevel;
use treatment_cell::{treatment_api, treatment_pages};

fn create_test_app(state: Arc<AppState>) -> Router {
    let (api, _) = treatment_api().split_for_parts();
    Router::new().nest("/api", api).merge(treatment_pages()).with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(json_request(method, uri, body)).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json(response).await)
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

struct Fixture {
    patient: i64,
    other_patient: i64,
    completed: i64,
    scheduled: i64,
    other_completed: i64,
    paracetamol: i64,
    ibuprofen: i64,
}

async fn seed(state: &AppState) -> Fixture {
    let specialty = SpecialtyService::new(state)
        .create_specialty(from_json::<SpecialtyInput>(json!({ "name": "General Medicine" })))
        .await
        .unwrap();
    let doctor = DoctorService::new(state)
        .create_doctor(from_json::<DoctorInput>(json!({
            "national_id": "11111111-1",
            "first_name": "Carlos",
            "paternal_surname": "Rojas",
            "specialty_id": specialty.id,
            "email": "carlos@clinic.cl",
            "registration_number": "REG-001",
            "hired_on": "2018-03-01"
        })))
        .await
        .unwrap();

    let patients = PatientService::new(state);
    let patient = |national_id: &str, first_name: &str| -> PatientInput {
        from_json(json!({
            "national_id": national_id,
            "first_name": first_name,
            "paternal_surname": "Soto",
            "birth_date": "1970-06-15"
        }))
    };
    let juan = patients.create_patient(patient("33333333-3", "Juan")).await.unwrap().id;
    let maria = patients.create_patient(patient("44444444-4", "Maria")).await.unwrap().id;

    let consultations = ConsultationService::new(state);
    let consultation = |patient_id: i64, status: &str, at: &str| -> ConsultationInput {
        from_json(json!({
            "patient_id": patient_id,
            "doctor_id": doctor.id,
            "scheduled_at": at,
            "reason": "Fever",
            "status": status
        }))
    };
    let completed = consultations
        .create_consultation(consultation(juan, "COMPLETED", "2025-01-10T10:00:00Z"))
        .await
        .unwrap()
        .id;
    let scheduled = consultations
        .create_consultation(consultation(juan, "SCHEDULED", "2025-02-10T10:00:00Z"))
        .await
        .unwrap()
        .id;
    let other_completed = consultations
        .create_consultation(consultation(maria, "COMPLETED", "2025-01-12T10:00:00Z"))
        .await
        .unwrap()
        .id;

    let lab = LaboratoryService::new(state)
        .create_laboratory(from_json::<LaboratoryInput>(json!({ "name": "Laboratorio Chile", "country": "Chile" })))
        .await
        .unwrap();
    let medications = MedicationService::new(state);
    let medication = |name: &str| -> MedicationInput {
        from_json(json!({
            "name": name,
            "active_ingredient": name,
            "form": "Tablet",
            "concentration": "500mg",
            "laboratory_id": lab.id,
            "stock": 100
        }))
    };
    let paracetamol = medications.create_medication(medication("Paracetamol")).await.unwrap().id;
    let ibuprofen = medications.create_medication(medication("Ibuprofen")).await.unwrap().id;

    Fixture {
        patient: juan,
        other_patient: maria,
        completed,
        scheduled,
        other_completed,
        paracetamol,
        ibuprofen,
    }
}

fn treatment_body(consultation_id: i64, description: &str) -> Value {
    json!({
        "consultation_id": consultation_id,
        "description": description,
        "start_date": "2025-01-10",
        "end_date": "2025-01-20",
        "instructions": "Rest and fluids"
    })
}

fn prescription_body(treatment_id: i64, medication_id: i64) -> Value {
    json!({
        "treatment_id": treatment_id,
        "medication_id": medication_id,
        "dosage": "1 tablet",
        "frequency": "Every 8 hours",
        "duration": "5 days",
        "total_quantity": 15
    })
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, created) = send(app, "POST", uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created
}

#[tokio::test]
async fn treatments_only_follow_completed_consultations() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state);

    let (status, body) = send(&app, "POST", "/api/treatments", Some(treatment_body(fixture.scheduled, "Antipyretic"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["consultation_id"][0], "Treatments can only be added to completed consultations.");

    let mut reversed = treatment_body(fixture.completed, "Antipyretic");
    reversed["end_date"] = json!("2025-01-01");
    let (status, body) = send(&app, "POST", "/api/treatments", Some(reversed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["end_date"][0], "End date cannot be before the start date.");

    let treatment = create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;
    assert_eq!(treatment["consultation_info"]["id"], fixture.completed);
    assert_eq!(treatment["consultation_info"]["patient"], "Juan Soto");
    assert_eq!(treatment["consultation_info"]["doctor"], "Dr(a). Carlos Rojas");
    assert_eq!(treatment["end_date"], "2025-01-20");

    let mut open_ended = treatment_body(fixture.completed, "Antipyretic");
    open_ended["end_date"] = Value::Null;
    let (status, updated) = send(&app, "PUT", &format!("/api/treatments/{}", treatment["id"]), Some(open_ended)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["end_date"], Value::Null);
}

#[tokio::test]
async fn treatments_filter_by_patient_through_the_consultation() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state);

    create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;
    let mut later = treatment_body(fixture.other_completed, "Physiotherapy");
    later["start_date"] = json!("2025-01-12");
    later["end_date"] = Value::Null;
    create(&app, "/api/treatments", later).await;

    let (_, body) = send(&app, "GET", &format!("/api/treatments?patient={}", fixture.other_patient), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["description"], "Physiotherapy");

    // Latest start first by default.
    let (_, body) = send(&app, "GET", "/api/treatments", None).await;
    assert_eq!(body["results"][0]["description"], "Physiotherapy");

    let (_, body) = send(&app, "GET", "/api/treatments?start_date=2025-01-10&search=fluids", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["description"], "Antipyretic");
}

#[tokio::test]
async fn prescription_is_stamped_with_the_issue_date() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state.clone());
    let treatment = create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;
    let treatment_id = treatment["id"].as_i64().unwrap();

    let prescription = create(&app, "/api/prescriptions", prescription_body(treatment_id, fixture.paracetamol)).await;
    let today = Utc::now().date_naive().to_string();
    assert_eq!(prescription["issued_on"], today.as_str());
    assert_eq!(prescription["medication_name"], "Paracetamol");
    assert_eq!(prescription["treatment_info"]["description"], "Antipyretic");
    assert_eq!(prescription["treatment_info"]["patient"], "Juan Soto");

    // An older issue date survives an update.
    let id = prescription["id"].as_i64().unwrap();
    let mut row = state.store.get(Table::Prescriptions, id).await.unwrap().unwrap();
    row["issued_on"] = json!("2025-01-10");
    state.store.update(Table::Prescriptions, id, row).await.unwrap();

    let mut body = prescription_body(treatment_id, fixture.paracetamol);
    body["dosage"] = json!("2 tablets");
    let (status, updated) = send(&app, "PUT", &format!("/api/prescriptions/{}", id), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["issued_on"], "2025-01-10");
    assert_eq!(updated["dosage"], "2 tablets");
}

#[tokio::test]
async fn prescription_validation() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state.clone());
    let treatment = create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;

    let mut medication = state.store.get(Table::Medications, fixture.ibuprofen).await.unwrap().unwrap();
    medication["active"] = json!(false);
    state.store.update(Table::Medications, fixture.ibuprofen, medication).await.unwrap();

    let mut body = prescription_body(treatment["id"].as_i64().unwrap(), fixture.ibuprofen);
    body["total_quantity"] = json!(0);
    body["frequency"] = json!("");
    let (status, errors) = send(&app, "POST", "/api/prescriptions", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["fields"]["total_quantity"][0], "Total quantity must be at least 1.");
    assert_eq!(errors["fields"]["medication_id"][0], "Select an active medication.");
    assert_eq!(errors["fields"]["frequency"][0], "This field is required.");

    let (status, errors) = send(&app, "POST", "/api/prescriptions", Some(prescription_body(999, fixture.paracetamol))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["fields"]["treatment_id"][0], "Select a valid treatment.");
}

#[tokio::test]
async fn prescriptions_filter_by_patient_medication_and_date() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state);
    let juan_treatment = create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;
    let maria_treatment = create(&app, "/api/treatments", treatment_body(fixture.other_completed, "Analgesia")).await;

    create(&app, "/api/prescriptions", prescription_body(juan_treatment["id"].as_i64().unwrap(), fixture.paracetamol)).await;
    create(&app, "/api/prescriptions", prescription_body(maria_treatment["id"].as_i64().unwrap(), fixture.ibuprofen)).await;

    let (_, body) = send(&app, "GET", &format!("/api/prescriptions?patient={}", fixture.patient), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["medication_name"], "Paracetamol");

    let (_, body) = send(&app, "GET", "/api/prescriptions?search=IBUPRO", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["treatment_info"]["patient"], "Maria Soto");

    let today = Utc::now().date_naive().to_string();
    let (_, body) = send(&app, "GET", &format!("/api/prescriptions?date_from={}&date_to={}", today, today), None).await;
    assert_eq!(body["count"], 2);
    let (_, body) = send(&app, "GET", "/api/prescriptions?date_to=2000-01-01", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn deleting_a_treatment_removes_its_prescriptions() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state.clone());
    let treatment = create(&app, "/api/treatments", treatment_body(fixture.completed, "Antipyretic")).await;
    let prescription =
        create(&app, "/api/prescriptions", prescription_body(treatment["id"].as_i64().unwrap(), fixture.paracetamol)).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/treatments/{}", treatment["id"]), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/prescriptions/{}", prescription["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // The medication itself is untouched.
    assert!(state.store.get(Table::Medications, fixture.paracetamol).await.unwrap().is_some());
}

#[tokio::test]
async fn treatment_form_only_offers_completed_consultations() {
    let state = TestConfig::default().to_state();
    let fixture = seed(&state).await;
    let app = create_test_app(state);

    let html = read_text(app.clone().oneshot(get("/treatments/new")).await.unwrap()).await;
    assert!(html.contains(&format!("value=\"{}\"", fixture.completed)));
    assert!(html.contains("2025-01-10 - Juan Soto"));
    assert!(!html.contains("2025-02-10"));

    let completed = fixture.completed.to_string();
    let response = app
        .clone()
        .oneshot(form_request(
            "/treatments/new",
            &[
                ("consultation_id", completed.as_str()),
                ("description", "Antipyretic"),
                ("start_date", "2025-01-10"),
                ("end_date", ""),
                ("instructions", "Rest"),
                ("active", "true"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_of(&response).unwrap().level, FlashLevel::Success);

    let scheduled = fixture.scheduled.to_string();
    let response = app
        .oneshot(form_request(
            "/treatments/new",
            &[
                ("consultation_id", scheduled.as_str()),
                ("description", "Antipyretic"),
                ("start_date", "2025-02-10"),
                ("instructions", "Rest"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_text(response).await.contains("Treatments can only be added to completed consultations."));
}
