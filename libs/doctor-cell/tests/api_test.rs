use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use doctor_cell::{doctor_api, doctor_pages};
use shared_database::{AppState, ClinicStore, MemoryStore, RecordQuery, Selection, StoreError, Table};
use shared_models::AppError;
use shared_utils::test_utils::{flash_of, form_request, get, json_request, location, read_json, TestConfig};
use shared_utils::pages::IN_USE;
use shared_utils::FlashLevel;

fn create_test_app(state: Arc<AppState>) -> Router {
    let (api, _) = doctor_api().split_for_parts();
    Router::new().nest("/api", api).merge(doctor_pages()).with_state(state)
}

fn doctor_body(specialty_id: i64, national_id: &str, registration_number: &str) -> Value {
    json!({
        "national_id": national_id,
        "first_name": "Ana",
        "paternal_surname": "Pérez",
        "maternal_surname": "Soto",
        "specialty_id": specialty_id,
        "phone": "+56911111111",
        "email": "ana.perez@clinic.cl",
        "registration_number": registration_number,
        "shift": "PART_TIME",
        "hired_on": "2021-04-01"
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(json_request(method, uri, body)).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json(response).await)
}

async fn create_specialty(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, "POST", "/api/specialties", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn specialty_delete_is_refused_while_a_doctor_references_it() {
    let app = create_test_app(TestConfig::default().to_state());

    let specialty_id = create_specialty(&app, "Cardiology").await;
    let (status, doctor) = send(&app, "POST", "/api/doctors", Some(doctor_body(specialty_id, "12345678-9", "REG-001"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doctor["full_name"], "Dr(a). Ana Pérez Soto");
    assert_eq!(doctor["specialty_name"], "Cardiology");
    assert_eq!(doctor["shift"], "PART_TIME");
    assert_eq!(doctor["active"], true);

    let (status, body) = send(&app, "DELETE", &format!("/api/specialties/{}", specialty_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["blocked_by"], "doctors");
    assert_eq!(body["dependents"], 1);
    assert!(body["error"].as_str().unwrap().contains("Cannot delete this specialty"));

    let (status, _) = send(&app, "DELETE", &format!("/api/doctors/{}", doctor["id"]), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("/api/specialties/{}", specialty_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get(&format!("/api/specialties/{}", specialty_id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_specialty_name_is_a_field_error() {
    let app = create_test_app(TestConfig::default().to_state());
    let original = json!({ "name": "Pediatrics", "description": "Children up to 15" });
    let (status, _) = send(&app, "POST", "/api/specialties", Some(original)).await;
    assert_eq!(status, StatusCode::CREATED);

    let duplicate = json!({ "name": "  Pediatrics ", "description": "Adolescents", "active": false });
    let (status, body) = send(&app, "POST", "/api/specialties", Some(duplicate)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["name"][0], "Specialty with this name already exists.");

    let (_, body) = send(&app, "GET", "/api/specialties", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Pediatrics");
    assert_eq!(body["results"][0]["description"], "Children up to 15");
    assert_eq!(body["results"][0]["active"], true);
}

#[tokio::test]
async fn specialty_counts_only_active_doctors() {
    let app = create_test_app(TestConfig::default().to_state());
    let specialty_id = create_specialty(&app, "Neurology").await;

    send(&app, "POST", "/api/doctors", Some(doctor_body(specialty_id, "11111111-1", "REG-101"))).await;
    let mut inactive = doctor_body(specialty_id, "22222222-2", "REG-102");
    inactive["active"] = json!(false);
    inactive["email"] = json!("second@clinic.cl");
    send(&app, "POST", "/api/doctors", Some(inactive)).await;

    let (status, body) = send(&app, "GET", &format!("/api/specialties/{}", specialty_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_doctor_count"], 1);
}

#[tokio::test]
async fn doctor_validation_reports_each_bad_field() {
    let app = create_test_app(TestConfig::default().to_state());
    let (_, inactive) = send(
        &app,
        "POST",
        "/api/specialties",
        Some(json!({ "name": "Dermatology", "active": false })),
    )
    .await;

    let mut body = doctor_body(inactive["id"].as_i64().unwrap(), "123", "REG-001");
    body["email"] = json!("not-an-email");
    let (status, errors) = send(&app, "POST", "/api/doctors", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["fields"]["national_id"][0], "National ID must have at least 7 characters.");
    assert_eq!(errors["fields"]["email"][0], "Enter a valid email address.");
    assert_eq!(errors["fields"]["specialty_id"][0], "Select an active specialty.");
}

#[tokio::test]
async fn doctor_uniqueness_ignores_the_row_being_updated() {
    let app = create_test_app(TestConfig::default().to_state());
    let specialty_id = create_specialty(&app, "Cardiology").await;

    let (_, first) = send(&app, "POST", "/api/doctors", Some(doctor_body(specialty_id, "12345678-9", "REG-001"))).await;
    let (status, errors) = send(&app, "POST", "/api/doctors", Some(doctor_body(specialty_id, "12345678-9", "REG-001"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(errors["fields"]["national_id"].is_array());
    assert!(errors["fields"]["registration_number"].is_array());

    let mut update = doctor_body(specialty_id, "12345678-9", "REG-001");
    update["shift"] = json!("ON_CALL");
    let (status, updated) = send(&app, "PUT", &format!("/api/doctors/{}", first["id"]), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["shift"], "ON_CALL");
}

#[tokio::test]
async fn missing_json_field_is_reported_as_required() {
    let app = create_test_app(TestConfig::default().to_state());

    let (status, body) = send(&app, "POST", "/api/specialties", Some(json!({ "description": "x" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["name"][0], "This field is required.");
}

#[tokio::test]
async fn doctors_filter_by_specialty_name_and_search() {
    let app = create_test_app(TestConfig::default().to_state());
    let cardiology = create_specialty(&app, "Cardiology").await;
    let pediatrics = create_specialty(&app, "Pediatrics").await;

    send(&app, "POST", "/api/doctors", Some(doctor_body(cardiology, "11111111-1", "REG-001"))).await;
    let mut other = doctor_body(pediatrics, "22222222-2", "REG-002");
    other["first_name"] = json!("Bruno");
    other["paternal_surname"] = json!("Araya");
    send(&app, "POST", "/api/doctors", Some(other)).await;

    let (_, body) = send(&app, "GET", "/api/doctors?specialty_name=cardio", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["first_name"], "Ana");

    let (_, body) = send(&app, "GET", "/api/doctors?search=pediatr", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["first_name"], "Bruno");

    // Default order is by paternal surname.
    let (_, body) = send(&app, "GET", "/api/doctors", None).await;
    assert_eq!(body["results"][0]["paternal_surname"], "Araya");

    let (_, body) = send(&app, "GET", "/api/doctors?ordering=-first_name&limit=1", None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["first_name"], "Bruno");
}

/// Memory store that never reports doctors, so the delete guard sees no
/// dependents and the store's own key check is what refuses the delete.
struct UncountedDoctors(MemoryStore);

#[async_trait]
impl ClinicStore for UncountedDoctors {
    async fn select(&self, table: Table, query: &RecordQuery) -> Result<Selection, StoreError> {
        self.0.select(table, query).await
    }

    async fn get(&self, table: Table, id: i64) -> Result<Option<Value>, StoreError> {
        self.0.get(table, id).await
    }

    async fn insert(&self, table: Table, record: Value) -> Result<Value, StoreError> {
        self.0.insert(table, record).await
    }

    async fn update(&self, table: Table, id: i64, record: Value) -> Result<Value, StoreError> {
        self.0.update(table, id, record).await
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        self.0.delete(table, id).await
    }

    async fn clear(&self, table: Table) -> Result<usize, StoreError> {
        self.0.clear(table).await
    }

    fn backend_name(&self) -> &'static str {
        "uncounted"
    }

    async fn count(&self, table: Table, query: &RecordQuery) -> Result<usize, StoreError> {
        if table == Table::Doctors {
            return Ok(0);
        }
        self.0.count(table, query).await
    }
}

#[tokio::test]
async fn delete_refused_by_the_store_is_a_server_error() {
    let store = Arc::new(UncountedDoctors(MemoryStore::new()));
    let state = Arc::new(AppState::new(TestConfig::default().to_app_config(), store.clone()));
    let app = create_test_app(state);

    let specialty = store
        .insert(Table::Specialties, json!({ "name": "Cardiology", "description": "", "active": true }))
        .await
        .unwrap();
    let specialty_id = specialty["id"].as_i64().unwrap();
    store
        .insert(Table::Doctors, json!({ "first_name": "Ana", "specialty_id": specialty_id }))
        .await
        .unwrap();

    let err = store.delete(Table::Specialties, specialty_id).await.unwrap_err();
    assert_matches!(err, StoreError::ForeignKeyViolation { table: Table::Specialties, .. });
    let err = AppError::from(err);
    assert_matches!(err, AppError::Database(_));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, "DELETE", &format!("/api/specialties/{}", specialty_id), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .clone()
        .oneshot(form_request(&format!("/specialties/{}/delete", specialty_id), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/specialties"));
    let flash = flash_of(&response).unwrap();
    assert_eq!(flash.level, FlashLevel::Error);
    assert_eq!(flash.message, IN_USE);

    assert!(store.get(Table::Specialties, specialty_id).await.unwrap().is_some());
}
