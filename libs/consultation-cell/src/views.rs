use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::CookieJar;

use doctor_cell::services::{DoctorService, SpecialtyService};
use patient_cell::services::PatientService;
use shared_database::AppState;
use shared_models::FieldErrors;
use shared_utils::html::{page, render_filter_form, render_list, render_table, FieldKind, FormField, TableRow};
use shared_utils::{
    confirm_delete, delete_redirect, form_page, redirect_with, saved, take_flash, Flash, FormInput, HtmlError, Saved,
};

use crate::models::{Consultation, ConsultationFilters, ConsultationInput, ConsultationStatus};
use crate::services::ConsultationService;

const LIST: &str = "/consultations";
const DATETIME_INPUT: &str = "%Y-%m-%dT%H:%M";

fn status_options() -> Vec<(String, String)> {
    ConsultationStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), status.label().to_string()))
        .collect()
}

fn with_blank(label: &str, options: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut all = vec![(String::new(), label.to_string())];
    all.extend(options);
    all
}

async fn patient_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let patients = PatientService::new(state).active_patients().await?;
    Ok(patients.into_iter().map(|p| (p.id.to_string(), p.full_name())).collect())
}

async fn doctor_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let doctors = DoctorService::new(state).active_doctors().await?;
    Ok(doctors.into_iter().map(|d| (d.id.to_string(), d.full_name())).collect())
}

async fn consultation_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &FormInput,
    errors: &FieldErrors,
) -> Result<Response, HtmlError> {
    let fields = vec![
        FormField::select("patient_id", "Patient", with_blank("Select a patient", patient_options(state).await?))
            .value(form.text("patient_id"))
            .required(),
        FormField::select("doctor_id", "Doctor", with_blank("Select a doctor", doctor_options(state).await?))
            .value(form.text("doctor_id"))
            .required(),
        FormField::new("scheduled_at", "Scheduled at", FieldKind::DateTime)
            .value(form.text("scheduled_at"))
            .required(),
        FormField::new("reason", "Reason", FieldKind::TextArea).value(form.text("reason")).required(),
        FormField::new("diagnosis", "Diagnosis", FieldKind::TextArea).value(form.text("diagnosis")),
        FormField::new("notes", "Notes", FieldKind::TextArea).value(form.text("notes")),
        FormField::select("status", "Status", status_options()).value(form.text("status")).required(),
    ];
    Ok(form_page(status, title, action, &fields, errors, "Save"))
}

fn consultation_values(consultation: &Consultation) -> FormInput {
    let values: HashMap<String, String> = [
        ("patient_id", consultation.patient_id.to_string()),
        ("doctor_id", consultation.doctor_id.to_string()),
        ("scheduled_at", consultation.scheduled_at.format(DATETIME_INPUT).to_string()),
        ("reason", consultation.reason.clone()),
        ("diagnosis", consultation.diagnosis.clone()),
        ("notes", consultation.notes.clone()),
        ("status", consultation.status.as_str().to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    FormInput::new(values)
}

fn consultation_from_form(form: &mut FormInput) -> Option<ConsultationInput> {
    let patient_id = form.parse::<i64>("patient_id", "Select a valid patient.");
    let doctor_id = form.parse::<i64>("doctor_id", "Select a valid doctor.");
    let scheduled_at = form.datetime("scheduled_at");
    let status = form.parse::<ConsultationStatus>("status", "Select a valid status.");

    Some(ConsultationInput {
        patient_id: patient_id?,
        doctor_id: doctor_id?,
        scheduled_at: scheduled_at?,
        reason: form.text("reason"),
        diagnosis: form.text("diagnosis"),
        notes: form.text("notes"),
        status: status?,
    })
}

pub async fn consultation_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<ConsultationFilters>,
) -> Result<Response, HtmlError> {
    let service = ConsultationService::new(&state);
    let listing = service.list_consultations(&filters).await?;
    let consultations = service.describe(listing.results).await?;

    let specialties = SpecialtyService::new(&state).active_specialties().await?;
    let filter_form = render_filter_form(
        LIST,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::select("doctor", "Doctor", with_blank("Any", doctor_options(&state).await?))
                .value(filters.doctor.map(|id| id.to_string()).unwrap_or_default()),
            FormField::select(
                "specialty",
                "Specialty",
                with_blank("Any", specialties.into_iter().map(|s| (s.id.to_string(), s.name)).collect()),
            )
            .value(filters.specialty.map(|id| id.to_string()).unwrap_or_default()),
            FormField::select("status", "Status", with_blank("Any", status_options()))
                .value(filters.status.map(|s| s.as_str().to_string()).unwrap_or_default()),
            FormField::new("date_from", "From", FieldKind::Date)
                .value(filters.date_from.map(|b| b.start().date_naive().to_string()).unwrap_or_default()),
            FormField::new("date_to", "To", FieldKind::Date)
                .value(filters.date_to.map(|b| b.end().date_naive().to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = consultations
        .into_iter()
        .map(|view| TableRow {
            id: view.consultation.id,
            cells: vec![
                view.consultation.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
                view.patient_name,
                view.doctor_name,
                view.specialty_name,
                view.consultation.reason,
                view.consultation.status.label().to_string(),
            ],
        })
        .collect();
    let table = render_table(LIST, &["Scheduled", "Patient", "Doctor", "Specialty", "Reason", "Status"], &rows);

    let (jar, flash) = take_flash(jar);
    let body = render_list(LIST, "New consultation", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Consultations", flash.as_ref(), &body))).into_response())
}

pub async fn new_consultation_page(State(state): State<Arc<AppState>>) -> Result<Response, HtmlError> {
    let defaults: HashMap<String, String> =
        [("status".to_string(), ConsultationStatus::default().as_str().to_string())].into_iter().collect();
    let form = FormInput::new(defaults);
    consultation_form(&state, StatusCode::OK, "New consultation", "/consultations/new", &form, &FieldErrors::new()).await
}

pub async fn create_consultation_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let title = "New consultation";
    let action = "/consultations/new";

    let Some(input) = consultation_from_form(&mut form) else {
        let errors = form.errors().clone();
        return consultation_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await;
    };

    match saved(ConsultationService::new(&state).create_consultation(input).await)? {
        Saved::Done(consultation) => Ok(redirect_with(
            jar,
            Flash::success(format!(
                "Consultation booked for {}.",
                consultation.scheduled_at.format("%Y-%m-%d %H:%M")
            )),
            LIST,
        )),
        Saved::Invalid(errors) => {
            consultation_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await
        }
    }
}

pub async fn edit_consultation_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let consultation = ConsultationService::new(&state).get_consultation(id).await?;
    let action = format!("/consultations/{}/edit", id);
    consultation_form(
        &state,
        StatusCode::OK,
        "Edit consultation",
        &action,
        &consultation_values(&consultation),
        &FieldErrors::new(),
    )
    .await
}

pub async fn update_consultation_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/consultations/{}/edit", id);
    let title = "Edit consultation";

    let Some(input) = consultation_from_form(&mut form) else {
        let errors = form.errors().clone();
        return consultation_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await;
    };

    match saved(ConsultationService::new(&state).update_consultation(id, input).await)? {
        Saved::Done(_) => Ok(redirect_with(jar, Flash::success("Consultation updated."), LIST)),
        Saved::Invalid(errors) => {
            consultation_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await
        }
    }
}

pub async fn confirm_delete_consultation_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let service = ConsultationService::new(&state);
    let description = match service.get_consultation(id).await {
        Ok(consultation) => service.describe_one(consultation).await.map(|view| {
            format!(
                "{} with {} on {}",
                view.patient_name,
                view.doctor_name,
                view.consultation.scheduled_at.format("%Y-%m-%d %H:%M")
            )
        }),
        Err(err) => Err(err),
    };
    confirm_delete(jar, description, LIST, id, "Delete consultation")
}

pub async fn delete_consultation_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = ConsultationService::new(&state).delete_consultation(id).await;
    delete_redirect(jar, result, LIST, "Consultation deleted.")
}
