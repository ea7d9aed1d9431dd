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

use crate::models::{Laboratory, LaboratoryFilters, LaboratoryInput, Medication, MedicationFilters, MedicationInput};
use crate::services::{LaboratoryService, MedicationService};

const LABORATORIES: &str = "/laboratories";
const MEDICATIONS: &str = "/medications";

fn form_of(pairs: Vec<(&str, String)>) -> FormInput {
    FormInput::new(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

// ==============================================================================
// LABORATORY PAGES
// ==============================================================================

fn laboratory_form(status: StatusCode, title: &str, action: &str, form: &FormInput, errors: &FieldErrors) -> Response {
    let fields = vec![
        FormField::text("name", "Name").value(form.text("name")).required(),
        FormField::text("country", "Country").value(form.text("country")).required(),
        FormField::new("address", "Address", FieldKind::TextArea).value(form.text("address")),
        FormField::text("phone", "Phone").value(form.text("phone")),
        FormField::new("email", "Email", FieldKind::Email).value(form.text("email")),
        FormField::new("active", "Active", FieldKind::Checkbox).value(form.checkbox("active").to_string()),
    ];
    form_page(status, title, action, &fields, errors, "Save")
}

fn laboratory_values(laboratory: &Laboratory) -> FormInput {
    form_of(vec![
        ("name", laboratory.name.clone()),
        ("country", laboratory.country.clone()),
        ("address", laboratory.address.clone()),
        ("phone", laboratory.phone.clone()),
        ("email", laboratory.email.clone()),
        ("active", laboratory.active.to_string()),
    ])
}

fn laboratory_from_form(form: &FormInput) -> LaboratoryInput {
    LaboratoryInput {
        name: form.text("name"),
        country: form.text("country"),
        address: form.text("address"),
        phone: form.text("phone"),
        email: form.text("email"),
        active: form.checkbox("active"),
    }
}

pub async fn laboratory_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<LaboratoryFilters>,
) -> Result<Response, HtmlError> {
    let service = LaboratoryService::new(&state);
    let listing = service.list_laboratories(&filters).await?;

    let mut countries = vec![(String::new(), "Any".to_string())];
    countries.extend(service.countries().await?.into_iter().map(|c| (c.clone(), c)));
    let filter_form = render_filter_form(
        LABORATORIES,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::select("country", "Country", countries).value(filters.country.clone().unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = listing
        .results
        .into_iter()
        .map(|lab| TableRow {
            id: lab.id,
            cells: vec![lab.name, lab.country, lab.phone, lab.email, bool_label(lab.active)],
        })
        .collect();
    let table = render_table(LABORATORIES, &["Name", "Country", "Phone", "Email", "Active"], &rows);

    let (jar, flash) = take_flash(jar);
    let body = render_list(LABORATORIES, "New laboratory", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Laboratories", flash.as_ref(), &body))).into_response())
}

pub async fn new_laboratory_page() -> Response {
    let form = form_of(vec![("active", "true".to_string())]);
    laboratory_form(StatusCode::OK, "New laboratory", "/laboratories/new", &form, &FieldErrors::new())
}

pub async fn create_laboratory_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let form = FormInput::new(values);
    let input = laboratory_from_form(&form);

    match saved(LaboratoryService::new(&state).create_laboratory(input).await)? {
        Saved::Done(lab) => Ok(redirect_with(
            jar,
            Flash::success(format!("Laboratory \"{}\" created.", lab.name)),
            LABORATORIES,
        )),
        Saved::Invalid(errors) => Ok(laboratory_form(
            StatusCode::UNPROCESSABLE_ENTITY,
            "New laboratory",
            "/laboratories/new",
            &form,
            &errors,
        )),
    }
}

pub async fn edit_laboratory_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let lab = LaboratoryService::new(&state).get_laboratory(id).await?;
    let action = format!("/laboratories/{}/edit", id);
    Ok(laboratory_form(StatusCode::OK, "Edit laboratory", &action, &laboratory_values(&lab), &FieldErrors::new()))
}

pub async fn update_laboratory_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let form = FormInput::new(values);
    let action = format!("/laboratories/{}/edit", id);
    let input = laboratory_from_form(&form);

    match saved(LaboratoryService::new(&state).update_laboratory(id, input).await)? {
        Saved::Done(lab) => Ok(redirect_with(
            jar,
            Flash::success(format!("Laboratory \"{}\" updated.", lab.name)),
            LABORATORIES,
        )),
        Saved::Invalid(errors) => {
            Ok(laboratory_form(StatusCode::UNPROCESSABLE_ENTITY, "Edit laboratory", &action, &form, &errors))
        }
    }
}

pub async fn confirm_delete_laboratory_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = LaboratoryService::new(&state).check_deletable(id).await;
    confirm_delete(jar, result.map(|lab: Laboratory| lab.name), LABORATORIES, id, "Delete laboratory")
}

pub async fn delete_laboratory_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = LaboratoryService::new(&state).delete_laboratory(id).await;
    delete_redirect(jar, result, LABORATORIES, "Laboratory deleted.")
}

// ==============================================================================
// MEDICATION PAGES
// ==============================================================================

async fn laboratory_options(state: &AppState) -> Result<Vec<(String, String)>, HtmlError> {
    let laboratories = LaboratoryService::new(state).active_laboratories().await?;
    let mut options = vec![(String::new(), "Select a laboratory".to_string())];
    options.extend(laboratories.into_iter().map(|lab| (lab.id.to_string(), lab.name)));
    Ok(options)
}

async fn medication_form(
    state: &AppState,
    status: StatusCode,
    title: &str,
    action: &str,
    form: &FormInput,
    errors: &FieldErrors,
) -> Result<Response, HtmlError> {
    let fields = vec![
        FormField::text("name", "Name").value(form.text("name")).required(),
        FormField::text("active_ingredient", "Active ingredient").value(form.text("active_ingredient")).required(),
        FormField::text("form", "Form").value(form.text("form")).required(),
        FormField::text("concentration", "Concentration").value(form.text("concentration")).required(),
        FormField::select("laboratory_id", "Laboratory", laboratory_options(state).await?)
            .value(form.text("laboratory_id"))
            .required(),
        FormField::new("requires_prescription", "Requires prescription", FieldKind::Checkbox)
            .value(form.checkbox("requires_prescription").to_string()),
        FormField::new("stock", "Stock", FieldKind::Number).value(form.text("stock")).required(),
        FormField::new("active", "Active", FieldKind::Checkbox).value(form.checkbox("active").to_string()),
    ];
    Ok(form_page(status, title, action, &fields, errors, "Save"))
}

fn medication_values(medication: &Medication) -> FormInput {
    form_of(vec![
        ("name", medication.name.clone()),
        ("active_ingredient", medication.active_ingredient.clone()),
        ("form", medication.form.clone()),
        ("concentration", medication.concentration.clone()),
        ("laboratory_id", medication.laboratory_id.to_string()),
        ("requires_prescription", medication.requires_prescription.to_string()),
        ("stock", medication.stock.to_string()),
        ("active", medication.active.to_string()),
    ])
}

fn medication_from_form(form: &mut FormInput) -> Option<MedicationInput> {
    let laboratory_id = form.parse::<i64>("laboratory_id", "Select a valid laboratory.");
    let stock = form.parse::<i32>("stock", "Enter a whole number.");

    Some(MedicationInput {
        name: form.text("name"),
        active_ingredient: form.text("active_ingredient"),
        form: form.text("form"),
        concentration: form.text("concentration"),
        laboratory_id: laboratory_id?,
        requires_prescription: form.checkbox("requires_prescription"),
        stock: stock?,
        active: form.checkbox("active"),
    })
}

pub async fn medication_list_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(filters): Query<MedicationFilters>,
) -> Result<Response, HtmlError> {
    let service = MedicationService::new(&state);
    let listing = service.list_medications(&filters).await?;
    let medications = service.describe(listing.results).await?;

    let filter_form = render_filter_form(
        MEDICATIONS,
        &[
            FormField::text("search", "Search").value(filters.search.clone().unwrap_or_default()),
            FormField::select("laboratory", "Laboratory", laboratory_options(&state).await?)
                .value(filters.laboratory.map(|id| id.to_string()).unwrap_or_default()),
            FormField::tri_state("requires_prescription", "Requires prescription")
                .value(filters.requires_prescription.map(|v| v.to_string()).unwrap_or_default()),
            FormField::tri_state("active", "Active").value(filters.active.map(|a| a.to_string()).unwrap_or_default()),
        ],
    );
    let rows: Vec<TableRow> = medications
        .into_iter()
        .map(|view| TableRow {
            id: view.medication.id,
            cells: vec![
                view.medication.display_name(),
                view.medication.active_ingredient,
                view.laboratory_name,
                bool_label(view.medication.requires_prescription),
                view.medication.stock.to_string(),
                bool_label(view.medication.active),
            ],
        })
        .collect();
    let table = render_table(
        MEDICATIONS,
        &["Medication", "Active ingredient", "Laboratory", "Prescription", "Stock", "Active"],
        &rows,
    );

    let (jar, flash) = take_flash(jar);
    let body = render_list(MEDICATIONS, "New medication", &filter_form, listing.count, &table);
    Ok((jar, Html(page("Medications", flash.as_ref(), &body))).into_response())
}

pub async fn new_medication_page(State(state): State<Arc<AppState>>) -> Result<Response, HtmlError> {
    let form = form_of(vec![
        ("stock", "0".to_string()),
        ("requires_prescription", "true".to_string()),
        ("active", "true".to_string()),
    ]);
    medication_form(&state, StatusCode::OK, "New medication", "/medications/new", &form, &FieldErrors::new()).await
}

pub async fn create_medication_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let title = "New medication";
    let action = "/medications/new";

    let Some(input) = medication_from_form(&mut form) else {
        let errors = form.errors().clone();
        return medication_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await;
    };

    match saved(MedicationService::new(&state).create_medication(input).await)? {
        Saved::Done(medication) => Ok(redirect_with(
            jar,
            Flash::success(format!("Medication \"{}\" created.", medication.display_name())),
            MEDICATIONS,
        )),
        Saved::Invalid(errors) => {
            medication_form(&state, StatusCode::UNPROCESSABLE_ENTITY, title, action, &form, &errors).await
        }
    }
}

pub async fn edit_medication_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let medication = MedicationService::new(&state).get_medication(id).await?;
    let action = format!("/medications/{}/edit", id);
    medication_form(
        &state,
        StatusCode::OK,
        "Edit medication",
        &action,
        &medication_values(&medication),
        &FieldErrors::new(),
    )
    .await
}

pub async fn update_medication_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(values): Form<HashMap<String, String>>,
) -> Result<Response, HtmlError> {
    let mut form = FormInput::new(values);
    let action = format!("/medications/{}/edit", id);

    let Some(input) = medication_from_form(&mut form) else {
        let errors = form.errors().clone();
        return medication_form(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit medication", &action, &form, &errors)
            .await;
    };

    match saved(MedicationService::new(&state).update_medication(id, input).await)? {
        Saved::Done(medication) => Ok(redirect_with(
            jar,
            Flash::success(format!("Medication \"{}\" updated.", medication.display_name())),
            MEDICATIONS,
        )),
        Saved::Invalid(errors) => {
            medication_form(&state, StatusCode::UNPROCESSABLE_ENTITY, "Edit medication", &action, &form, &errors).await
        }
    }
}

pub async fn confirm_delete_medication_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = MedicationService::new(&state).check_deletable(id).await;
    confirm_delete(jar, result.map(|m: Medication| m.display_name()), MEDICATIONS, id, "Delete medication")
}

pub async fn delete_medication_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response, HtmlError> {
    let result = MedicationService::new(&state).delete_medication(id).await;
    delete_redirect(jar, result, MEDICATIONS, "Medication deleted.")
}
