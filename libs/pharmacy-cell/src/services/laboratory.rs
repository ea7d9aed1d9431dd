use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::store::{decode_row, decode_rows, value_taken};
use shared_database::{ensure_deletable, guarded_delete, AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{parse_ordering, timestamp_value};

use crate::models::{Laboratory, LaboratoryFilters, LaboratoryInput};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("name", "name"), ("country", "country")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("name")];

pub struct LaboratoryService {
    state: AppState,
}

impl LaboratoryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_laboratories(&self, filters: &LaboratoryFilters) -> Result<Page<Laboratory>, AppError> {
        debug!("Listing laboratories with filters: {:?}", filters);

        let mut query = RecordQuery::new()
            .filter_opt(filters.name.as_ref().map(|v| Filter::contains("name", v)))
            .filter_opt(filters.country.as_ref().map(|v| Filter::eq("country", v.as_str())))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)));

        if let Some(term) = &filters.search {
            query = query.any(vec![Filter::contains("name", term), Filter::contains("country", term)]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, laboratories) = self.state.store.select(Table::Laboratories, &query).await?.decode()?;
        Ok(Page::new(count, laboratories))
    }

    pub async fn get_laboratory(&self, id: i64) -> Result<Laboratory, AppError> {
        debug!("Fetching laboratory: {}", id);

        match self.state.store.get(Table::Laboratories, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("laboratory", id)),
        }
    }

    pub async fn create_laboratory(&self, input: LaboratoryInput) -> Result<Laboratory, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Creating laboratory: {}", input.name);

        let row = Self::to_row(&input, Utc::now());
        let laboratory: Laboratory = decode_row(self.state.store.insert(Table::Laboratories, row).await?)?;

        info!("Laboratory created with ID: {}", laboratory.id);
        Ok(laboratory)
    }

    pub async fn update_laboratory(&self, id: i64, input: LaboratoryInput) -> Result<Laboratory, AppError> {
        let existing = self.get_laboratory(id).await?;
        let input = self.validate(input, Some(id)).await?;
        debug!("Updating laboratory: {}", id);

        let row = Self::to_row(&input, existing.registered_at);
        let laboratory: Laboratory = decode_row(self.state.store.update(Table::Laboratories, id, row).await?)?;

        info!("Laboratory {} updated", id);
        Ok(laboratory)
    }

    /// Fails with `DeleteBlocked` while medications reference the laboratory.
    pub async fn check_deletable(&self, id: i64) -> Result<Laboratory, AppError> {
        let laboratory = self.get_laboratory(id).await?;
        ensure_deletable(self.state.store.as_ref(), Table::Laboratories, id).await?;
        Ok(laboratory)
    }

    pub async fn delete_laboratory(&self, id: i64) -> Result<(), AppError> {
        guarded_delete(self.state.store.as_ref(), Table::Laboratories, id).await
    }

    pub async fn active_laboratories(&self) -> Result<Vec<Laboratory>, AppError> {
        let filters = LaboratoryFilters {
            active: Some(true),
            ..LaboratoryFilters::default()
        };
        Ok(self.list_laboratories(&filters).await?.results)
    }

    /// Distinct countries of the registered laboratories, for the country filter.
    pub async fn countries(&self) -> Result<Vec<String>, AppError> {
        let selection = self.state.store.select(Table::Laboratories, &RecordQuery::new()).await?;
        let laboratories: Vec<Laboratory> = decode_rows(selection.rows)?;
        let countries: BTreeSet<String> = laboratories.into_iter().map(|lab| lab.country).collect();
        Ok(countries.into_iter().collect())
    }

    fn to_row(input: &LaboratoryInput, registered_at: DateTime<Utc>) -> Value {
        json!({
            "name": input.name,
            "country": input.country,
            "address": input.address,
            "phone": input.phone,
            "email": input.email,
            "active": input.active,
            "registered_at": timestamp_value(registered_at),
        })
    }

    async fn validate(&self, input: LaboratoryInput, exclude_id: Option<i64>) -> Result<LaboratoryInput, AppError> {
        let mut errors = FieldErrors::new();

        let name = errors.required("name", &input.name, 200);
        if !name.is_empty() && name.chars().count() < 3 {
            errors.add("name", "Laboratory name is too short.");
        }
        let country = errors.required("country", &input.country, 100);
        let address = errors.optional("address", &input.address, 200);
        let phone = errors.optional("phone", &input.phone, 20);
        let email = errors.email("email", &input.email, false);

        if !errors.contains("name")
            && value_taken(self.state.store.as_ref(), Table::Laboratories, "name", &name, exclude_id).await?
        {
            errors.add("name", "Laboratory with this name already exists.");
        }

        errors.into_result()?;
        Ok(LaboratoryInput {
            name,
            country,
            address,
            phone,
            email,
            active: input.active,
        })
    }
}
