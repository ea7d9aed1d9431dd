use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shared_database::store::{decode_row, select_ids, value_taken};
use shared_database::{ensure_deletable, guarded_delete, AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{parse_ordering, timestamp_value};

use crate::models::{Specialty, SpecialtyFilters, SpecialtyInput, SpecialtyView};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("name", "name"), ("created_at", "created_at")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("name")];

pub struct SpecialtyService {
    state: AppState,
}

impl SpecialtyService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_specialties(&self, filters: &SpecialtyFilters) -> Result<Page<Specialty>, AppError> {
        debug!("Listing specialties with filters: {:?}", filters);

        let mut query = RecordQuery::new()
            .filter_opt(filters.name.as_ref().map(|name| Filter::contains("name", name)))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)));

        if let Some(term) = &filters.search {
            query = query.any(vec![
                Filter::contains("name", term),
                Filter::contains("description", term),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, specialties) = self.state.store.select(Table::Specialties, &query).await?.decode()?;
        Ok(Page::new(count, specialties))
    }

    pub async fn get_specialty(&self, id: i64) -> Result<Specialty, AppError> {
        debug!("Fetching specialty: {}", id);

        match self.state.store.get(Table::Specialties, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("specialty", id)),
        }
    }

    pub async fn create_specialty(&self, input: SpecialtyInput) -> Result<Specialty, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Creating specialty: {}", input.name);

        let row = json!({
            "name": input.name,
            "description": input.description,
            "active": input.active,
            "created_at": timestamp_value(Utc::now()),
        });
        let specialty: Specialty = decode_row(self.state.store.insert(Table::Specialties, row).await?)?;

        info!("Specialty created with ID: {}", specialty.id);
        Ok(specialty)
    }

    pub async fn update_specialty(&self, id: i64, input: SpecialtyInput) -> Result<Specialty, AppError> {
        let existing = self.get_specialty(id).await?;
        let input = self.validate(input, Some(id)).await?;
        debug!("Updating specialty: {}", id);

        let row = json!({
            "name": input.name,
            "description": input.description,
            "active": input.active,
            "created_at": timestamp_value(existing.created_at),
        });
        let specialty: Specialty = decode_row(self.state.store.update(Table::Specialties, id, row).await?)?;

        info!("Specialty {} updated", id);
        Ok(specialty)
    }

    /// Fails with `DeleteBlocked` while any doctor references the specialty.
    pub async fn check_deletable(&self, id: i64) -> Result<Specialty, AppError> {
        let specialty = self.get_specialty(id).await?;
        ensure_deletable(self.state.store.as_ref(), Table::Specialties, id).await?;
        Ok(specialty)
    }

    pub async fn delete_specialty(&self, id: i64) -> Result<(), AppError> {
        guarded_delete(self.state.store.as_ref(), Table::Specialties, id).await
    }

    pub async fn active_specialties(&self) -> Result<Vec<Specialty>, AppError> {
        let filters = SpecialtyFilters {
            active: Some(true),
            ..SpecialtyFilters::default()
        };
        Ok(self.list_specialties(&filters).await?.results)
    }

    /// Ids of specialties whose name contains `term`.
    pub async fn ids_matching_name(&self, term: &str) -> Result<Vec<i64>, AppError> {
        let query = RecordQuery::new().filter(Filter::contains("name", term));
        Ok(select_ids(self.state.store.as_ref(), Table::Specialties, query).await?)
    }

    pub async fn describe_one(&self, specialty: Specialty) -> Result<SpecialtyView, AppError> {
        let id = specialty.id;
        self.describe(vec![specialty])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("specialty {} vanished while describing it", id)))
    }

    pub async fn describe(&self, specialties: Vec<Specialty>) -> Result<Vec<SpecialtyView>, AppError> {
        let ids: Vec<i64> = specialties.iter().map(|s| s.id).collect();
        let mut counts: HashMap<i64, usize> = HashMap::new();

        if !ids.is_empty() {
            let query = RecordQuery::new()
                .filter(Filter::is_in("specialty_id", ids))
                .filter(Filter::eq("active", true));
            let doctors = self.state.store.select(Table::Doctors, &query).await?;
            for row in &doctors.rows {
                if let Some(specialty_id) = row["specialty_id"].as_i64() {
                    *counts.entry(specialty_id).or_default() += 1;
                }
            }
        }

        Ok(specialties
            .into_iter()
            .map(|specialty| SpecialtyView {
                active_doctor_count: counts.get(&specialty.id).copied().unwrap_or(0),
                specialty,
            })
            .collect())
    }

    async fn validate(&self, input: SpecialtyInput, exclude_id: Option<i64>) -> Result<SpecialtyInput, AppError> {
        let mut errors = FieldErrors::new();
        let name = errors.required("name", &input.name, 100);
        let description = input.description.trim().to_string();

        if !name.is_empty() {
            if value_taken(self.state.store.as_ref(), Table::Specialties, "name", &name, exclude_id).await? {
                errors.add("name", "Specialty with this name already exists.");
            }
        }

        errors.into_result()?;
        Ok(SpecialtyInput { name, description, active: input.active })
    }
}
