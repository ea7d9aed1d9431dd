use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::CookieJar;

use shared_database::AppState;
use shared_models::FieldErrors;
use shared_utils::html::{bool_label, page, render_filter_form, render_list, render_table, FieldKind, FormField, TableRow};
use shared_utils::{
    confirm_delete, delete_redirect, form_page, redirect_with, saved, take_flash, Flash, FormInput, HtmlError, Saved,
};

use crate::models::{Coverage, Patient, PatientFilters, PatientInput};
use crate::services::PatientService;

const LIST: &str = "/patients";

fn coverage_options() -> Vec<(String, String)> {
    Coverage::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), c.label().to_string()))
        .collect()
}

fn patient_form(status: StatusCode, title: &str, action: &str, form: &FormInput, errors: &FieldErrors) -> Response {
    let fields = vec![
        FormField::text("national_id", "National ID").value(form.text("national_id")).required(),
        FormField::text("first_name", "First name").value(form.text("first_name")).required(),
        FormField::text("paternal_surname", "Paternal surname").value(form.text("paternal_surname")).required(),
        FormField::text("maternal_surname", "Maternal surname").value(form.text("maternal_surname")),
        FormField::new("birth_date", "Birth date", FieldKind::Date).value(form.text("birth_date")).required(),
        FormField::text("phone", "Phone").value(form.text("phone")),
        FormField::new("email", "Email", FieldKind::Email).value(form.text("email")),
        FormField::text("address", "Address").value(form.text("address")),
        FormField::select("coverage", "Coverage", coverage_options()).value(form.text("coverage")).required(),
        FormField::new("active", "Active", FieldKind::Checkbox).value(form.checkbox("active").to_string()),
    ];
    form_page(status, title, action, &fields, errors, "Save")
}

fn patient_values(patient: &Patient) -> FormInput {
    let values: HashMap<String, String> = [
        ("national_id", patient.national_id.clone()),
        ("first_name", patient.first_name.clone()),
        ("paternal_surname", patient.paternal_surname.clone()),
        ("maternal_surname", patient.maternal_surname.clone()),
        ("birth_date", patient.birth_date.to_string()),
        ("phone", patient.phone.clone()),
        ("email", patient.email.clone()),
        ("address", patient.address.clone()),
        ("coverage", patient.coverage.as_str().to_string()),
        ("active", patient.active.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    FormInput::new(values)
}

fn patient_from_form(form: &mut FormInput) -> Option<PatientInput> {
    let birth_date = form.date("birth_date");
    let coverage = form.parse::<Coverage>("coverage", "Select a valid coverage.");

    Some(PatientInput {
        national_id: form.text("national_id"),
        first_name: form.text("first_name"),
        paternal_surname: form.text("paternal_surname"),
        maternal_surname: form.text("maternal_surname"),
        birth_date: birth_date?,
        phone: form.text("phone"),
        email: form.text("email"),
        address: form.text("address"),
        coverage: coverage?,
        active: form.checkbox("active"),
    })
}

pub async fn patient_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<PatientFilters>,
) -> Result<Response, HtmlError> {
    let service = PatientService::new(&state);
    let listing = service.list_patients(&filters).await?;

    let mut coverages = vec![(String::new(), "Any".to_string())];
    coverages.extend(coverage_options());
    let filter_form = render_filter_form(
        LIST,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::text("last_name", "Last name").value(filters.last_name.clone().unwrap_or_default()),
            FormField::select("coverage", "Coverage", coverages)
                .value(filters.coverage.map(|c| c.as_str().to_string()).unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = listing
        .results
        .into_iter()
        .map(|patient| service.describe(patient))
        .map(|view| TableRow {
            id: view.patient.id,
            cells: vec![
                view.full_name,
                view.patient.national_id,
                view.age.to_string(),
                view.patient.coverage.label().to_string(),
                view.patient.phone,
                bool_label(view.patient.active),
            ],
        })
        .collect();
    let table = render_table(LIST, &["Name", "National ID", "Age", "Coverage", "Phone", "Active"], &rows);

    let (jar, flash) = take_flash(jar);
    let body = render_list(LIST, "New patient", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Patients", flash.as_ref(), &body))).into_response())
}

pub async fn new_patient_page() -> Response {
    let defaults: HashMap<String, String> = [
        ("coverage".to_string(), Coverage::default().as_str().to_string()),
        ("active".to_string(), "true".to_string()),
    ]
    .into_iter()
    .collect();
    patient_form(StatusCode::OK, "New patient", "/patients/new", &FormInput::new(defaults), &FieldErrors::new())
}

pub async fn create_patient_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let Some(input) = patient_from_form(&mut form) else {
        let errors = form.errors().clone();
        return Ok(patient_form(StatusCode::UNPROCESSABLE_ENTITY, "New patient", "/patients/new", &form, &errors));
    };

    match saved(PatientService::new(&state).create_patient(input).await)? {
        Saved::Done(patient) => Ok(redirect_with(
            jar,
            Flash::success(format!("Patient {} registered.", patient.full_name())),
            LIST,
        )),
        Saved::Invalid(errors) => Ok(patient_form(
            StatusCode::UNPROCESSABLE_ENTITY,
            "New patient",
            "/patients/new",
            &form,
            &errors,
        )),
    }
}

pub async fn edit_patient_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let patient = PatientService::new(&state).get_patient(id).await?;
    let action = format!("/patients/{}/edit", id);
    Ok(patient_form(StatusCode::OK, "Edit patient", &action, &patient_values(&patient), &FieldErrors::new()))
}

pub async fn update_patient_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/patients/{}/edit", id);
    let Some(input) = patient_from_form(&mut form) else {
        let errors = form.errors().clone();
        return Ok(patient_form(StatusCode::UNPROCESSABLE_ENTITY, "Edit patient", &action, &form, &errors));
    };

    match saved(PatientService::new(&state).update_patient(id, input).await)? {
        Saved::Done(patient) => Ok(redirect_with(
            jar,
            Flash::success(format!("Patient {} updated.", patient.full_name())),
            LIST,
        )),
        Saved::Invalid(errors) => Ok(patient_form(StatusCode::UNPROCESSABLE_ENTITY, "Edit patient", &action, &form, &errors)),
    }
}

pub async fn confirm_delete_patient_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = PatientService::new(&state).check_deletable(id).await;
    confirm_delete(jar, result.map(|p: Patient| p.full_name()), LIST, id, "Delete patient")
}

pub async fn delete_patient_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = PatientService::new(&state).delete_patient(id).await;
    delete_redirect(jar, result, LIST, "Patient deleted.")
}
