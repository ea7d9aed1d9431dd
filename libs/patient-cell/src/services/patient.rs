use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::store::{decode_row, value_taken};
use shared_database::{ensure_deletable, guarded_delete, AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{date_value, parse_ordering, timestamp_value};

use crate::models::{Patient, PatientFilters, PatientInput, PatientView};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[
    ("last_name", "paternal_surname"),
    ("first_name", "first_name"),
    ("registered_at", "registered_at"),
];
const DEFAULT_ORDER: &[OrderBy] = &[
    OrderBy::asc("paternal_surname"),
    OrderBy::asc("maternal_surname"),
    OrderBy::asc("first_name"),
];

pub struct PatientService {
    state: AppState,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_patients(&self, filters: &PatientFilters) -> Result<Page<Patient>, AppError> {
        debug!("Listing patients with filters: {:?}", filters);

        let mut query = RecordQuery::new()
            .filter_opt(filters.first_name.as_ref().map(|v| Filter::contains("first_name", v)))
            .filter_opt(filters.last_name.as_ref().map(|v| Filter::contains("paternal_surname", v)))
            .filter_opt(filters.national_id.as_ref().map(|v| Filter::contains("national_id", v)))
            .filter_opt(filters.coverage.map(|c| Filter::eq("coverage", c.as_str())))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)));

        if let Some(term) = &filters.search {
            query = query.any(vec![
                Filter::contains("first_name", term),
                Filter::contains("paternal_surname", term),
                Filter::contains("maternal_surname", term),
                Filter::contains("national_id", term),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, patients) = self.state.store.select(Table::Patients, &query).await?.decode()?;
        Ok(Page::new(count, patients))
    }

    pub async fn get_patient(&self, id: i64) -> Result<Patient, AppError> {
        debug!("Fetching patient: {}", id);

        match self.state.store.get(Table::Patients, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("patient", id)),
        }
    }

    pub async fn create_patient(&self, input: PatientInput) -> Result<Patient, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Creating patient: {}", input.national_id);

        let row = Self::to_row(&input, Utc::now());
        let patient: Patient = decode_row(self.state.store.insert(Table::Patients, row).await?)?;

        info!("Patient created with ID: {}", patient.id);
        Ok(patient)
    }

    pub async fn update_patient(&self, id: i64, input: PatientInput) -> Result<Patient, AppError> {
        let existing = self.get_patient(id).await?;
        let input = self.validate(input, Some(id)).await?;
        debug!("Updating patient: {}", id);

        let row = Self::to_row(&input, existing.registered_at);
        let patient: Patient = decode_row(self.state.store.update(Table::Patients, id, row).await?)?;

        info!("Patient {} updated", id);
        Ok(patient)
    }

    /// Fails with `DeleteBlocked` while the patient has consultations.
    pub async fn check_deletable(&self, id: i64) -> Result<Patient, AppError> {
        let patient = self.get_patient(id).await?;
        ensure_deletable(self.state.store.as_ref(), Table::Patients, id).await?;
        Ok(patient)
    }

    pub async fn delete_patient(&self, id: i64) -> Result<(), AppError> {
        guarded_delete(self.state.store.as_ref(), Table::Patients, id).await
    }

    pub async fn active_patients(&self) -> Result<Vec<Patient>, AppError> {
        let filters = PatientFilters {
            active: Some(true),
            ..PatientFilters::default()
        };
        Ok(self.list_patients(&filters).await?.results)
    }

    pub fn describe(&self, patient: Patient) -> PatientView {
        PatientView::new(patient, Utc::now().date_naive())
    }

    fn to_row(input: &PatientInput, registered_at: chrono::DateTime<Utc>) -> Value {
        json!({
            "national_id": input.national_id,
            "first_name": input.first_name,
            "paternal_surname": input.paternal_surname,
            "maternal_surname": input.maternal_surname,
            "birth_date": date_value(input.birth_date),
            "phone": input.phone,
            "email": input.email,
            "address": input.address,
            "coverage": input.coverage.as_str(),
            "active": input.active,
            "registered_at": timestamp_value(registered_at),
        })
    }

    async fn validate(&self, input: PatientInput, exclude_id: Option<i64>) -> Result<PatientInput, AppError> {
        let mut errors = FieldErrors::new();

        let national_id = errors.required("national_id", &input.national_id, 12);
        if !national_id.is_empty() && national_id.chars().count() < 7 {
            errors.add("national_id", "National ID must have at least 7 characters.");
        }
        let first_name = errors.required("first_name", &input.first_name, 100);
        let paternal_surname = errors.required("paternal_surname", &input.paternal_surname, 100);
        let maternal_surname = errors.optional("maternal_surname", &input.maternal_surname, 100);
        let phone = errors.optional("phone", &input.phone, 15);
        let email = errors.email("email", &input.email, false);
        let address = errors.optional("address", &input.address, 200);

        if input.birth_date > Utc::now().date_naive() {
            errors.add("birth_date", "Birth date cannot be in the future.");
        }

        if !errors.contains("national_id")
            && value_taken(self.state.store.as_ref(), Table::Patients, "national_id", &national_id, exclude_id).await?
        {
            errors.add("national_id", "Patient with this national ID already exists.");
        }

        errors.into_result()?;
        Ok(PatientInput {
            national_id,
            first_name,
            paternal_surname,
            maternal_surname,
            phone,
            email,
            address,
            ..input
        })
    }
}
