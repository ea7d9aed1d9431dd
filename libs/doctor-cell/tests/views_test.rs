use std::sync::Arc;

use axum::{http::StatusCode, Router};
use chrono::NaiveDate;
use tower::ServiceExt;

use doctor_cell::models::{DoctorInput, DoctorShift, SpecialtyInput};
use doctor_cell::services::{DoctorService, SpecialtyService};
use doctor_cell::{doctor_api, doctor_pages};
use shared_database::AppState;
use shared_utils::test_utils::{flash_of, form_request, get, location, read_text, with_flash, TestConfig};
use shared_utils::{Flash, FlashLevel};

fn create_test_app(state: Arc<AppState>) -> Router {
    let (api, _) = doctor_api().split_for_parts();
    Router::new().nest("/api", api).merge(doctor_pages()).with_state(state)
}

async fn seed_specialty(state: &AppState, name: &str) -> i64 {
    SpecialtyService::new(state)
        .create_specialty(SpecialtyInput {
            name: name.to_string(),
            description: String::new(),
            active: true,
        })
        .await
        .unwrap()
        .id
}

async fn seed_doctor(state: &AppState, specialty_id: i64) -> i64 {
    DoctorService::new(state)
        .create_doctor(DoctorInput {
            national_id: "12345678-9".to_string(),
            first_name: "Carlos".to_string(),
            paternal_surname: "Muñoz".to_string(),
            maternal_surname: String::new(),
            specialty_id,
            phone: String::new(),
            email: "carlos@clinic.cl".to_string(),
            registration_number: "REG-001".to_string(),
            shift: DoctorShift::FullTime,
            active: true,
            hired_on: NaiveDate::from_ymd_opt(2019, 1, 15).unwrap(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn creating_a_specialty_redirects_with_a_notice() {
    let state = TestConfig::default().to_state();
    let app = create_test_app(state.clone());

    let response = app
        .clone()
        .oneshot(form_request("/specialties/new", &[("name", "Cardiology"), ("active", "true")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/specialties"));
    let flash = flash_of(&response).unwrap();
    assert_eq!(flash.level, FlashLevel::Success);
    assert!(flash.message.contains("Cardiology"));

    let specialties = SpecialtyService::new(&state).active_specialties().await.unwrap();
    assert_eq!(specialties.len(), 1);
}

#[tokio::test]
async fn invalid_specialty_form_is_redisplayed_with_errors() {
    let app = create_test_app(TestConfig::default().to_state());

    let response = app
        .oneshot(form_request("/specialties/new", &[("name", "   "), ("description", "kept")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = read_text(response).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains("kept"));
}

#[tokio::test]
async fn list_page_shows_and_clears_the_pending_notice() {
    let state = TestConfig::default().to_state();
    seed_specialty(&state, "Traumatology").await;
    let app = create_test_app(state);

    let request = with_flash(get("/specialties"), &Flash::success("Specialty saved."));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(flash_of(&response).is_none());
    let html = read_text(response).await;
    assert!(html.contains("Specialty saved."));
    assert!(html.contains("Traumatology"));
    assert!(html.contains("1 record(s)"));
}

#[tokio::test]
async fn delete_confirmation_bounces_back_when_doctors_remain() {
    let state = TestConfig::default().to_state();
    let specialty_id = seed_specialty(&state, "Cardiology").await;
    seed_doctor(&state, specialty_id).await;
    let app = create_test_app(state);

    let response = app
        .clone()
        .oneshot(get(&format!("/specialties/{}/delete", specialty_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let flash = flash_of(&response).unwrap();
    assert_eq!(flash.level, FlashLevel::Error);
    assert!(flash.message.contains("1 associated doctors"));

    let response = app
        .oneshot(form_request(&format!("/specialties/{}/delete", specialty_id), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_of(&response).unwrap().level, FlashLevel::Error);
}

#[tokio::test]
async fn doctor_can_be_deleted_after_confirmation() {
    let state = TestConfig::default().to_state();
    let specialty_id = seed_specialty(&state, "Cardiology").await;
    let doctor_id = seed_doctor(&state, specialty_id).await;
    let app = create_test_app(state.clone());

    let response = app
        .clone()
        .oneshot(get(&format!("/doctors/{}/delete", doctor_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(read_text(response).await.contains("Dr(a). Carlos Muñoz"));

    let response = app
        .oneshot(form_request(&format!("/doctors/{}/delete", doctor_id), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_of(&response).unwrap().level, FlashLevel::Success);
    assert!(DoctorService::new(&state).get_doctor(doctor_id).await.is_err());
}

#[tokio::test]
async fn doctor_form_reports_unparsable_values() {
    let state = TestConfig::default().to_state();
    seed_specialty(&state, "Cardiology").await;
    let app = create_test_app(state);

    let response = app
        .oneshot(form_request(
            "/doctors/new",
            &[("national_id", "12345678-9"), ("specialty_id", ""), ("shift", "NIGHTS"), ("hired_on", "someday")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = read_text(response).await;
    assert!(html.contains("Select a valid shift."));
    assert!(html.contains("Enter a valid date."));
    assert!(html.contains("12345678-9"));
}

#[tokio::test]
async fn unparsable_values_do_not_hide_other_field_errors() {
    let state = TestConfig::default().to_state();
    let specialty_id = seed_specialty(&state, "Cardiology").await;
    seed_doctor(&state, specialty_id).await;
    let app = create_test_app(state.clone());

    let response = app
        .oneshot(form_request(
            "/doctors/new",
            &[
                ("national_id", "12345678-9"),
                ("first_name", " "),
                ("paternal_surname", "Rojas"),
                ("specialty_id", ""),
                ("email", "not-an-email"),
                ("registration_number", "REG-777"),
                ("shift", "NIGHTS"),
                ("hired_on", "2020-02-01"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = read_text(response).await;
    assert!(html.contains("Select a valid shift."));
    assert!(html.contains("This field is required."));
    assert!(html.contains("Doctor with this national ID already exists."));
    assert!(html.contains("Enter a valid email address."));
    // A blank specialty is reported once, as missing.
    assert!(!html.contains("Select a valid specialty."));

    let doctors = DoctorService::new(&state).active_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
}

#[tokio::test]
async fn unknown_doctor_renders_not_found_page() {
    let app = create_test_app(TestConfig::default().to_state());

    let response = app.oneshot(get("/doctors/99/edit")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(read_text(response).await.contains("doctor 99 does not exist"));
}
