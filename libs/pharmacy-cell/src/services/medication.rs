use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::store::{decode_row, fetch_by_ids, select_ids};
use shared_database::{ensure_deletable, guarded_delete, AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{parse_ordering, timestamp_value};

use crate::models::{Laboratory, Medication, MedicationFilters, MedicationInput, MedicationView};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("name", "name"), ("stock", "stock")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("name")];

pub struct MedicationService {
    state: AppState,
}

impl MedicationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_medications(&self, filters: &MedicationFilters) -> Result<Page<Medication>, AppError> {
        debug!("Listing medications with filters: {:?}", filters);
        let store = self.state.store.as_ref();

        let mut query = RecordQuery::new()
            .filter_opt(filters.name.as_ref().map(|v| Filter::contains("name", v)))
            .filter_opt(filters.active_ingredient.as_ref().map(|v| Filter::contains("active_ingredient", v)))
            .filter_opt(filters.laboratory.map(|id| Filter::eq("laboratory_id", id)))
            .filter_opt(filters.requires_prescription.map(|v| Filter::eq("requires_prescription", v)))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)));

        if let Some(name) = &filters.laboratory_name {
            let ids = select_ids(store, Table::Laboratories, RecordQuery::new().filter(Filter::contains("name", name))).await?;
            query = query.filter(Filter::is_in("laboratory_id", ids));
        }

        if let Some(term) = &filters.search {
            let laboratory_ids =
                select_ids(store, Table::Laboratories, RecordQuery::new().filter(Filter::contains("name", term))).await?;
            query = query.any(vec![
                Filter::contains("name", term),
                Filter::contains("active_ingredient", term),
                Filter::is_in("laboratory_id", laboratory_ids),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, medications) = store.select(Table::Medications, &query).await?.decode()?;
        Ok(Page::new(count, medications))
    }

    pub async fn get_medication(&self, id: i64) -> Result<Medication, AppError> {
        debug!("Fetching medication: {}", id);

        match self.state.store.get(Table::Medications, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("medication", id)),
        }
    }

    pub async fn create_medication(&self, input: MedicationInput) -> Result<Medication, AppError> {
        let input = self.validate(input).await?;
        debug!("Creating medication: {}", input.name);

        let row = Self::to_row(&input, Utc::now());
        let medication: Medication = decode_row(self.state.store.insert(Table::Medications, row).await?)?;

        info!("Medication created with ID: {}", medication.id);
        Ok(medication)
    }

    pub async fn update_medication(&self, id: i64, input: MedicationInput) -> Result<Medication, AppError> {
        let existing = self.get_medication(id).await?;
        let input = self.validate(input).await?;
        debug!("Updating medication: {}", id);

        let row = Self::to_row(&input, existing.registered_at);
        let medication: Medication = decode_row(self.state.store.update(Table::Medications, id, row).await?)?;

        info!("Medication {} updated", id);
        Ok(medication)
    }

    /// Fails with `DeleteBlocked` while prescriptions reference the medication.
    pub async fn check_deletable(&self, id: i64) -> Result<Medication, AppError> {
        let medication = self.get_medication(id).await?;
        ensure_deletable(self.state.store.as_ref(), Table::Medications, id).await?;
        Ok(medication)
    }

    pub async fn delete_medication(&self, id: i64) -> Result<(), AppError> {
        guarded_delete(self.state.store.as_ref(), Table::Medications, id).await
    }

    pub async fn active_medications(&self) -> Result<Vec<Medication>, AppError> {
        let filters = MedicationFilters {
            active: Some(true),
            ..MedicationFilters::default()
        };
        Ok(self.list_medications(&filters).await?.results)
    }

    pub async fn describe_one(&self, medication: Medication) -> Result<MedicationView, AppError> {
        let id = medication.id;
        self.describe(vec![medication])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("medication {} vanished while describing it", id)))
    }

    pub async fn describe(&self, medications: Vec<Medication>) -> Result<Vec<MedicationView>, AppError> {
        let laboratories = fetch_by_ids::<Laboratory, _>(
            self.state.store.as_ref(),
            Table::Laboratories,
            medications.iter().map(|m| m.laboratory_id),
        )
        .await?;

        Ok(medications
            .into_iter()
            .map(|medication| MedicationView {
                laboratory_name: laboratories
                    .get(&medication.laboratory_id)
                    .map(|lab| lab.name.clone())
                    .unwrap_or_default(),
                medication,
            })
            .collect())
    }

    fn to_row(input: &MedicationInput, registered_at: DateTime<Utc>) -> Value {
        json!({
            "name": input.name,
            "active_ingredient": input.active_ingredient,
            "form": input.form,
            "concentration": input.concentration,
            "laboratory_id": input.laboratory_id,
            "requires_prescription": input.requires_prescription,
            "stock": input.stock,
            "active": input.active,
            "registered_at": timestamp_value(registered_at),
        })
    }

    async fn validate(&self, input: MedicationInput) -> Result<MedicationInput, AppError> {
        let mut errors = FieldErrors::new();

        let name = errors.required("name", &input.name, 200);
        let active_ingredient = errors.required("active_ingredient", &input.active_ingredient, 200);
        let form = errors.required("form", &input.form, 100);
        let concentration = errors.required("concentration", &input.concentration, 100);
        if input.stock < 0 {
            errors.add("stock", "Stock cannot be negative.");
        }

        if self.state.store.get(Table::Laboratories, input.laboratory_id).await?.is_none() {
            errors.add("laboratory_id", "Select a valid laboratory.");
        }

        errors.into_result()?;
        Ok(MedicationInput {
            name,
            active_ingredient,
            form,
            concentration,
            ..input
        })
    }
}
