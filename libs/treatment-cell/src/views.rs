use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use axum_extra::extract::CookieJar;

use consultation_cell::services::ConsultationService;
use patient_cell::services::PatientService;
use pharmacy_cell::services::MedicationService;
use shared_database::AppState;
use shared_models::FieldErrors;
use shared_utils::html::{bool_label, page, render_filter_form, render_list, render_table, FieldKind, FormField, TableRow};
use shared_utils::{
    confirm_delete, delete_redirect, form_page, redirect_with, saved, take_flash, Flash, FormInput, HtmlError, Saved,
};

use crate::models::{
    Prescription, PrescriptionFilters, PrescriptionInput, Treatment, TreatmentFilters, TreatmentInput,
};
use crate::services::{PrescriptionService, TreatmentService};

const TREATMENTS: &str = "/treatments";
const PRESCRIPTIONS: &str = "/prescriptions";

fn form_of(pairs: Vec<(&str, String)>) -> FormInput {
    FormInput::new(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn with_blank(label: &str, options: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut all = vec![(String::new(), label.to_string())];
    all.extend(options);
    all
}

// ==============================================================================
// TREATMENT PAGES
// ==============================================================================

/// Completed consultations whose patient is still active.
async fn consultation_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let active_patients: HashSet<i64> = PatientService::new(state)
        .active_patients()
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let service = ConsultationService::new(state);
    let completed = service.completed_consultations().await?;
    let views = service
        .describe(completed.into_iter().filter(|c| active_patients.contains(&c.patient_id)).collect())
        .await?;

    Ok(views
        .into_iter()
        .map(|view| {
            let label = format!(
                "{} - {} ({})",
                view.consultation.scheduled_at.format("%Y-%m-%d"),
                view.patient_name,
                view.doctor_name
            );
            (view.consultation.id.to_string(), label)
        })
        .collect())
}

async fn treatment_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &FormInput,
    errors: &FieldErrors,
) -> Result<Response, HtmlError> {
    let fields = vec![
        FormField::select(
            "consultation_id",
            "Consultation",
            with_blank("Select a consultation", consultation_options(state).await?),
        )
        .value(form.text("consultation_id"))
        .required(),
        FormField::new("description", "Description", FieldKind::TextArea)
            .value(form.text("description"))
            .required(),
        FormField::new("start_date", "Start date", FieldKind::Date).value(form.text("start_date")).required(),
        FormField::new("end_date", "End date", FieldKind::Date).value(form.text("end_date")),
        FormField::new("instructions", "Instructions", FieldKind::TextArea)
            .value(form.text("instructions"))
            .required(),
        FormField::new("active", "Active", FieldKind::Checkbox).value(form.checkbox("active").to_string()),
    ];
    Ok(form_page(status, title, action, &fields, errors, "Save"))
}

fn treatment_values(treatment: &Treatment) -> FormInput {
    form_of(vec![
        ("consultation_id", treatment.consultation_id.to_string()),
        ("description", treatment.description.clone()),
        ("start_date", treatment.start_date.to_string()),
        ("end_date", treatment.end_date.map(|d| d.to_string()).unwrap_or_default()),
        ("instructions", treatment.instructions.clone()),
        ("active", treatment.active.to_string()),
    ])
}

fn treatment_from_form(form: &mut FormInput) -> Option<TreatmentInput> {
    let consultation_id = form.parse::<i64>("consultation_id", "Select a valid consultation.");
    let start_date = form.date("start_date");
    let end_date = form.optional_date("end_date");

    Some(TreatmentInput {
        consultation_id: consultation_id?,
        description: form.text("description"),
        start_date: start_date?,
        end_date: end_date?,
        instructions: form.text("instructions"),
        active: form.checkbox("active"),
    })
}

pub async fn treatment_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<TreatmentFilters>,
) -> Result<Response, HtmlError> {
    let service = TreatmentService::new(&state);
    let listing = service.list_treatments(&filters).await?;
    let treatments = service.describe(listing.results).await?;

    let filter_form = render_filter_form(
        TREATMENTS,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::new("start_date", "Start date", FieldKind::Date)
                .value(filters.start_date.map(|d| d.to_string()).unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = treatments
        .into_iter()
        .map(|view| {
            let (patient, doctor) = view
                .consultation_info
                .map(|info| (info.patient, info.doctor))
                .unwrap_or_default();
            TableRow {
                id: view.treatment.id,
                cells: vec![
                    view.treatment.description,
                    patient,
                    doctor,
                    view.treatment.start_date.to_string(),
                    view.treatment.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    bool_label(view.treatment.active),
                ],
            }
        })
        .collect();
    let table = render_table(TREATMENTS, &["Description", "Patient", "Doctor", "Start", "End", "Active"], &rows);

    let (jar, flash) = take_flash(jar);
    let body = render_list(TREATMENTS, "New treatment", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Treatments", flash.as_ref(), &body))).into_response())
}

pub async fn new_treatment_page(State(state): State<Arc<AppState>>) -> Result<Response, HtmlError> {
    let form = form_of(vec![("active", "true".to_string())]);
    treatment_form(&state, StatusCode::OK, "New treatment", "/treatments/new", &form, &FieldErrors::new()).await
}

pub async fn create_treatment_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let title = "New treatment";
    let action = "/treatments/new";

    let Some(input) = treatment_from_form(&mut form) else {
        let errors = form.errors().clone();
        return treatment_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await;
    };

    match saved(TreatmentService::new(&state).create_treatment(input).await)? {
        Saved::Done(_) => Ok(redirect_with(jar, Flash::success("Treatment created."), TREATMENTS)),
        Saved::Invalid(errors) => {
            treatment_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await
        }
    }
}

pub async fn edit_treatment_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let treatment = TreatmentService::new(&state).get_treatment(id).await?;
    let action = format!("/treatments/{}/edit", id);
    treatment_form(
        &state,
        StatusCode::OK,
        "Edit treatment",
        &action,
        &treatment_values(&treatment),
        &FieldErrors::new(),
    )
    .await
}

pub async fn update_treatment_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/treatments/{}/edit", id);
    let title = "Edit treatment";

    let Some(input) = treatment_from_form(&mut form) else {
        let errors = form.errors().clone();
        return treatment_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await;
    };

    match saved(TreatmentService::new(&state).update_treatment(id, input).await)? {
        Saved::Done(_) => Ok(redirect_with(jar, Flash::success("Treatment updated."), TREATMENTS)),
        Saved::Invalid(errors) => {
            treatment_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await
        }
    }
}

pub async fn confirm_delete_treatment_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = TreatmentService::new(&state).get_treatment(id).await;
    confirm_delete(jar, result.map(|t: Treatment| t.description), TREATMENTS, id, "Delete treatment")
}

pub async fn delete_treatment_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = TreatmentService::new(&state).delete_treatment(id).await;
    delete_redirect(jar, result, TREATMENTS, "Treatment deleted.")
}

// ==============================================================================
// PRESCRIPTION PAGES
// ==============================================================================

async fn treatment_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let service = TreatmentService::new(state);
    let treatments = service.describe(service.active_treatments().await?).await?;
    Ok(treatments
        .into_iter()
        .map(|view| {
            let label = match view.consultation_info {
                Some(info) => format!("{} ({})", view.treatment.description, info.patient),
                None => view.treatment.description,
            };
            (view.treatment.id.to_string(), label)
        })
        .collect())
}

async fn medication_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let medications = MedicationService::new(state).active_medications().await?;
    Ok(medications.into_iter().map(|m| (m.id.to_string(), m.display_name())).collect())
}

async fn prescription_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &FormInput,
    errors: &FieldErrors,
) -> Result<Response, HtmlError> {
    let fields = vec![
        FormField::select("treatment_id", "Treatment", with_blank("Select a treatment", treatment_options(state).await?))
            .value(form.text("treatment_id"))
            .required(),
        FormField::select(
            "medication_id",
            "Medication",
            with_blank("Select a medication", medication_options(state).await?),
        )
        .value(form.text("medication_id"))
        .required(),
        FormField::text("dosage", "Dosage").value(form.text("dosage")).required(),
        FormField::text("frequency", "Frequency").value(form.text("frequency")).required(),
        FormField::text("duration", "Duration").value(form.text("duration")).required(),
        FormField::new("total_quantity", "Total quantity", FieldKind::Number)
            .value(form.text("total_quantity"))
            .required(),
        FormField::new("special_instructions", "Special instructions", FieldKind::TextArea)
            .value(form.text("special_instructions")),
    ];
    Ok(form_page(status, title, action, &fields, errors, "Save"))
}

fn prescription_values(prescription: &Prescription) -> FormInput {
    form_of(vec![
        ("treatment_id", prescription.treatment_id.to_string()),
        ("medication_id", prescription.medication_id.to_string()),
        ("dosage", prescription.dosage.clone()),
        ("frequency", prescription.frequency.clone()),
        ("duration", prescription.duration.clone()),
        ("total_quantity", prescription.total_quantity.to_string()),
        ("special_instructions", prescription.special_instructions.clone()),
    ])
}

fn prescription_from_form(form: &mut FormInput) -> Option<PrescriptionInput> {
    let treatment_id = form.parse::<i64>("treatment_id", "Select a valid treatment.");
    let medication_id = form.parse::<i64>("medication_id", "Select a valid medication.");
    let total_quantity = form.parse::<i32>("total_quantity", "Enter a whole number.");

    Some(PrescriptionInput {
        treatment_id: treatment_id?,
        medication_id: medication_id?,
        dosage: form.text("dosage"),
        frequency: form.text("frequency"),
        duration: form.text("duration"),
        total_quantity: total_quantity?,
        special_instructions: form.text("special_instructions"),
    })
}

pub async fn prescription_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<PrescriptionFilters>,
) -> Result<Response, HtmlError> {
    let service = PrescriptionService::new(&state);
    let listing = service.list_prescriptions(&filters).await?;
    let prescriptions = service.describe(listing.results).await?;

    let filter_form = render_filter_form(
        PRESCRIPTIONS,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::select("medication", "Medication", with_blank("Any", medication_options(&state).await?))
                .value(filters.medication.map(|id| id.to_string()).unwrap_or_default()),
            FormField::new("date_from", "Issued from", FieldKind::Date)
                .value(filters.date_from.map(|b| b.start().date_naive().to_string()).unwrap_or_default()),
            FormField::new("date_to", "Issued to", FieldKind::Date)
                .value(filters.date_to.map(|b| b.end().date_naive().to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = prescriptions
        .into_iter()
        .map(|view| TableRow {
            id: view.prescription.id,
            cells: vec![
                view.prescription.issued_on.to_string(),
                view.medication_name,
                view.treatment_info.map(|info| info.patient).unwrap_or_default(),
                view.prescription.dosage,
                view.prescription.frequency,
                view.prescription.total_quantity.to_string(),
            ],
        })
        .collect();
    let table = render_table(
        PRESCRIPTIONS,
        &["Issued", "Medication", "Patient", "Dosage", "Frequency", "Quantity"],
        &rows,
    );

    let (jar, flash) = take_flash(jar);
    let body = render_list(PRESCRIPTIONS, "New prescription", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Prescriptions", flash.as_ref(), &body))).into_response())
}

pub async fn new_prescription_page(State(state): State<Arc<AppState>>) -> Result<Response, HtmlError> {
    let form = form_of(vec![("total_quantity", "1".to_string())]);
    prescription_form(&state, StatusCode::OK, "New prescription", "/prescriptions/new", &form, &FieldErrors::new()).await
}

pub async fn create_prescription_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let title = "New prescription";
    let action = "/prescriptions/new";

    let Some(input) = prescription_from_form(&mut form) else {
        let errors = form.errors().clone();
        return prescription_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await;
    };

    match saved(PrescriptionService::new(&state).create_prescription(input).await)? {
        Saved::Done(_) => Ok(redirect_with(jar, Flash::success("Prescription issued."), PRESCRIPTIONS)),
        Saved::Invalid(errors) => {
            prescription_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await
        }
    }
}

pub async fn edit_prescription_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let prescription = PrescriptionService::new(&state).get_prescription(id).await?;
    let action = format!("/prescriptions/{}/edit", id);
    prescription_form(
        &state,
        StatusCode::OK,
        "Edit prescription",
        &action,
        &prescription_values(&prescription),
        &FieldErrors::new(),
    )
    .await
}

pub async fn update_prescription_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/prescriptions/{}/edit", id);
    let title = "Edit prescription";

    let Some(input) = prescription_from_form(&mut form) else {
        let errors = form.errors().clone();
        return prescription_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await;
    };

    match saved(PrescriptionService::new(&state).update_prescription(id, input).await)? {
        Saved::Done(_) => Ok(redirect_with(jar, Flash::success("Prescription updated."), PRESCRIPTIONS)),
        Saved::Invalid(errors) => {
            prescription_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, &action, &form, &errors).await
        }
    }
}

pub async fn confirm_delete_prescription_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let service = PrescriptionService::new(&state);
    let description = match service.get_prescription(id).await {
        Ok(prescription) => service
            .describe_one(prescription)
            .await
            .map(|view| format!("{} issued {}", view.medication_name, view.prescription.issued_on)),
        Err(err) => Err(err),
    };
    confirm_delete(jar, description, PRESCRIPTIONS, id, "Delete prescription")
}

pub async fn delete_prescription_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = PrescriptionService::new(&state).delete_prescription(id).await;
    delete_redirect(jar, result, PRESCRIPTIONS, "Prescription deleted.")
}
