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
use shared_utils::html::{
    bool_label, page, render_filter_form, render_list, render_table, FieldKind,
    FormField, TableRow,
};
use shared_utils::{confirm_delete, delete_redirect, form_page, redirect_with, saved, take_flash, Flash, FormInput, HtmlError, Saved};

use crate::models::{Doctor, DoctorFilters, DoctorInput, DoctorShift, Specialty, SpecialtyFilters, SpecialtyInput};
use crate::services::{DoctorService, SpecialtyService};

// ==============================================================================
// SPECIALTY PAGES
// ==============================================================================

fn specialty_fields(name: &str, description: &str, active: bool) -> Vec<FormField> {
    vec![
        FormField::text("name", "Name").value(name).required(),
        FormField::new("description", "Description", FieldKind::TextArea).value(description),
        FormField::new("active", "Active", FieldKind::Checkbox).value(active.to_string()),
    ]
}

fn specialty_from_form(form: &FormInput) -> SpecialtyInput {
    SpecialtyInput {
        name: form.text("name"),
        description: form.text("description"),
        active: form.checkbox("active"),
    }
}

fn specialty_form(
    status: StatusCode,
    title: &str,
    action: &str,
    input: &SpecialtyInput,
    errors: &FieldErrors,
) -> Response {
    let fields = specialty_fields(&input.name, &input.description, input.active);
    form_page(status, title, action, &fields, errors, "Save")
}

pub async fn specialty_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<SpecialtyFilters>,
) -> Result<Response, HtmlError> {
    let service = SpecialtyService::new(&state);
    let listing = service.list_specialties(&filters).await?;
    let specialties = service.describe(listing.results).await?;

    let filter_form = render_filter_form(
        "/specialties",
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = specialties
        .iter()
        .map(|view| TableRow {
            id: view.specialty.id,
            cells: vec![
                view.specialty.name.clone(),
                view.specialty.description.clone(),
                bool_label(view.specialty.active),
                view.active_doctor_count.to_string(),
            ],
        })
        .collect();
    let table = render_table("/specialties", &["Name", "Description", "Active", "Active doctors"], &rows);

    let (jar, flash) = take_flash(jar);
    let body = render_list("/specialties", "New specialty", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Specialties", flash.as_ref(), &body))).into_response())
}

pub async fn new_specialty_page() -> Response {
    let input = SpecialtyInput {
        name: String::new(),
        description: String::new(),
        active: true,
    };
    specialty_form(StatusCode::OK, "New specialty", "/specialties/new", &input, &FieldErrors::new())
}

pub async fn create_specialty_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let input = specialty_from_form(&FormInput::new(values));

    match saved(SpecialtyService::new(&state).create_specialty(input.clone()).await)? {
        Saved::Done(specialty) => Ok(redirect_with(
            jar,
            Flash::success(format!("Specialty \"{}\" created.", specialty.name)),
            "/specialties",
        )),
        Saved::Invalid(errors) => Ok(specialty_form(
            StatusCode::UNPROCESSABLE_ENTITY,
            "New specialty",
            "/specialties/new",
            &input,
            &errors,
        )),
    }
}

pub async fn edit_specialty_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let specialty = SpecialtyService::new(&state).get_specialty(id).await?;
    let input = SpecialtyInput {
        name: specialty.name,
        description: specialty.description,
        active: specialty.active,
    };
    let action = format!("/specialties/{}/edit", id);
    Ok(specialty_form(StatusCode::OK, "Edit specialty", &action, &input, &FieldErrors::new()))
}

pub async fn update_specialty_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let input = specialty_from_form(&FormInput::new(values));

    match saved(SpecialtyService::new(&state).update_specialty(id, input.clone()).await)? {
        Saved::Done(specialty) => Ok(redirect_with(
            jar,
            Flash::success(format!("Specialty \"{}\" updated.", specialty.name)),
            "/specialties",
        )),
        Saved::Invalid(errors) => {
            let action = format!("/specialties/{}/edit", id);
            Ok(specialty_form(StatusCode::UNPROCESSABLE_ENTITY, "Edit specialty", &action, &input, &errors))
        }
    }
}

pub async fn confirm_delete_specialty_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = SpecialtyService::new(&state).check_deletable(id).await;
    confirm_delete(jar, result.map(|s: Specialty| s.name), "/specialties", id, "Delete specialty")
}

pub async fn delete_specialty_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = SpecialtyService::new(&state).delete_specialty(id).await;
    delete_redirect(jar, result, "/specialties", "Specialty deleted.")
}

// ==============================================================================
// DOCTOR PAGES
// ==============================================================================

fn shift_options() -> Vec<(String, String)> {
    DoctorShift::ALL
        .iter()
        .map(|shift| (shift.as_str().to_string(), shift.label().to_string()))
        .collect()
}

async fn specialty_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let specialties = SpecialtyService::new(state).active_specialties().await?;
    let mut options = vec![(String::new(), "Select a specialty".to_string())];
    options.extend(specialties.into_iter().map(|s| (s.id.to_string(), s.name)));
    Ok(options)
}

async fn doctor_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &FormInput,
    errors: &FieldErrors,
) -> Result<Response, HtmlError> {
    let fields = vec![
        FormField::text("national_id", "National ID").value(form.text("national_id")).required(),
        FormField::text("first_name", "First name").value(form.text("first_name")).required(),
        FormField::text("paternal_surname", "Paternal surname").value(form.text("paternal_surname")).required(),
        FormField::text("maternal_surname", "Maternal surname").value(form.text("maternal_surname")),
        FormField::select("specialty_id", "Specialty", specialty_options(state).await?)
            .value(form.text("specialty_id"))
            .required(),
        FormField::text("phone", "Phone").value(form.text("phone")),
        FormField::new("email", "Email", FieldKind::Email).value(form.text("email")).required(),
        FormField::text("registration_number", "Registration number")
            .value(form.text("registration_number"))
            .required(),
        FormField::select("shift", "Shift", shift_options()).value(form.text("shift")).required(),
        FormField::new("hired_on", "Hired on", FieldKind::Date).value(form.text("hired_on")).required(),
        FormField::new("active", "Active", FieldKind::Checkbox).value(form.checkbox("active").to_string()),
    ];
    Ok(form_page(status, title, action, &fields, errors, "Save"))
}

fn doctor_values(doctor: &Doctor) -> FormInput {
    let values: HashMap<String, String> = [
        ("national_id", doctor.national_id.clone()),
        ("first_name", doctor.first_name.clone()),
        ("paternal_surname", doctor.paternal_surname.clone()),
        ("maternal_surname", doctor.maternal_surname.clone()),
        ("specialty_id", doctor.specialty_id.to_string()),
        ("phone", doctor.phone.clone()),
        ("email", doctor.email.clone()),
        ("registration_number", doctor.registration_number.clone()),
        ("shift", doctor.shift.as_str().to_string()),
        ("hired_on", doctor.hired_on.to_string()),
        ("active", doctor.active.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    FormInput::new(values)
}

/// Unparseable fields get placeholders and leave their message on `form`.
fn doctor_from_form(form: &mut FormInput) -> DoctorInput {
    DoctorInput {
        national_id: form.text("national_id"),
        first_name: form.text("first_name"),
        paternal_surname: form.text("paternal_surname"),
        maternal_surname: form.text("maternal_surname"),
        specialty_id: form.parse::<i64>("specialty_id", "Select a valid specialty.").unwrap_or_default(),
        phone: form.text("phone"),
        email: form.text("email"),
        registration_number: form.text("registration_number"),
        shift: form.parse::<DoctorShift>("shift", "Select a valid shift.").unwrap_or_default(),
        active: form.checkbox("active"),
        hired_on: form.date("hired_on").unwrap_or_default(),
    }
}

/// Parse failures plus what the service finds wrong with the remaining fields.
async fn rejected_form(
    service: &DoctorService,
    form: &FormInput,
    input: DoctorInput,
    exclude_id: Option<i64>,
) -> Result<FieldErrors, HtmlError> {
    let mut errors = form.errors().clone();
    errors.merge_unreported(service.field_errors(input, exclude_id).await?);
    Ok(errors)
}

pub async fn doctor_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<DoctorFilters>,
) -> Result<Response, HtmlError> {
    let service = DoctorService::new(&state);
    let listing = service.list_doctors(&filters).await?;
    let doctors = service.describe(listing.results).await?;

    let mut shifts = vec![(String::new(), "Any".to_string())];
    shifts.extend(shift_options());
    let filter_form = render_filter_form(
        "/doctors",
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::select("specialty", "Specialty", specialty_options(&state).await?)
                .value(filters.specialty.map(|id| id.to_string()).unwrap_or_default()),
            FormField::select("shift", "Shift", shifts)
                .value(filters.shift.map(|s| s.as_str().to_string()).unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = doctors
        .iter()
        .map(|view| TableRow {
            id: view.doctor.id,
            cells: vec![
                view.full_name.clone(),
                view.doctor.national_id.clone(),
                view.specialty_name.clone(),
                view.doctor.shift.label().to_string(),
                view.doctor.email.clone(),
                bool_label(view.doctor.active),
            ],
        })
        .collect();
    let table = render_table(
        "/doctors",
        &["Name", "National ID", "Specialty", "Shift", "Email", "Active"],
        &rows,
    );

    let (jar, flash) = take_flash(jar);
    let body = render_list("/doctors", "New doctor", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Doctors", flash.as_ref(), &body))).into_response())
}

pub async fn new_doctor_page(State(state): State<Arc<AppState>>) -> Result<Response, HtmlError> {
    let defaults: HashMap<String, String> = [
        ("shift".to_string(), DoctorShift::default().as_str().to_string()),
        ("active".to_string(), "true".to_string()),
    ]
    .into_iter()
    .collect();
    let form = FormInput::new(defaults);
    doctor_form(&state, StatusCode::OK, "New doctor", "/doctors/new", &form, &FieldErrors::new()).await
}

pub async fn create_doctor_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let title = "New doctor";
    let action = "/doctors/new";

    let service = DoctorService::new(&state);
    let input = doctor_from_form(&mut form);
    if !form.is_valid() {
        let errors = rejected_form(&service, &form, input, None).await?;
        return doctor_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await;
    }

    match saved(service.create_doctor(input).await)? {
        Saved::Done(doctor) => Ok(redirect_with(
            jar,
            Flash::success(format!("{} created.", doctor.full_name())),
            "/doctors",
        )),
        Saved::Invalid(errors) => {
            doctor_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await
        }
    }
}

pub async fn edit_doctor_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let doctor = DoctorService::new(&state).get_doctor(id).await?;
    let action = format!("/doctors/{}/edit", id);
    doctor_form(
        &state,
        StatusCode::OK,
        "Edit doctor",
        &action,
        &doctor_values(&doctor),
        &FieldErrors::new(),
    )
    .await
}

pub async fn update_doctor_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/doctors/{}/edit", id);

    let service = DoctorService::new(&state);
    let input = doctor_from_form(&mut form);
    if !form.is_valid() {
        let errors = rejected_form(&service, &form, input, Some(id)).await?;
        return doctor_form(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit doctor", &action, &form, &errors).await;
    }

    match saved(service.update_doctor(id, input).await)? {
        Saved::Done(doctor) => Ok(redirect_with(
            jar,
            Flash::success(format!("{} updated.", doctor.full_name())),
            "/doctors",
        )),
        Saved::Invalid(errors) => {
            doctor_form(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit doctor", &action, &form, &errors).await
        }
    }
}

pub async fn confirm_delete_doctor_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = DoctorService::new(&state).check_deletable(id).await;
    confirm_delete(jar, result.map(|d: Doctor| d.full_name()), "/doctors", id, "Delete doctor")
}

pub async fn delete_doctor_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = DoctorService::new(&state).delete_doctor(id).await;
    delete_redirect(jar, result, "/doctors", "Doctor deleted.")
}
