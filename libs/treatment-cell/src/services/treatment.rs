use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::{debug, info};

use consultation_cell::models::{Consultation, ConsultationStatus};
use consultation_cell::services::ConsultationService;
use shared_database::store::{decode_row, fetch_by_ids, select_ids};
use shared_database::{AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{date_value, parse_ordering};

use crate::models::{ConsultationInfo, Treatment, TreatmentFilters, TreatmentInput, TreatmentView};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("start_date", "start_date"), ("end_date", "end_date")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::desc("start_date")];

pub struct TreatmentService {
    state: AppState,
}

impl TreatmentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_treatments(&self, filters: &TreatmentFilters) -> Result<Page<Treatment>, AppError> {
        debug!("Listing treatments with filters: {:?}", filters);
        let store = self.state.store.as_ref();

        let mut query = RecordQuery::new()
            .filter_opt(filters.consultation.map(|id| Filter::eq("consultation_id", id)))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)))
            .filter_opt(filters.start_date.map(|day| Filter::eq("start_date", date_value(day))));

        if filters.patient.is_some() || filters.doctor.is_some() {
            let consultations = RecordQuery::new()
                .filter_opt(filters.patient.map(|id| Filter::eq("patient_id", id)))
                .filter_opt(filters.doctor.map(|id| Filter::eq("doctor_id", id)));
            let ids = select_ids(store, Table::Consultations, consultations).await?;
            query = query.filter(Filter::is_in("consultation_id", ids));
        }

        if let Some(term) = &filters.search {
            query = query.any(vec![Filter::contains("description", term), Filter::contains("instructions", term)]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, treatments) = store.select(Table::Treatments, &query).await?.decode()?;
        Ok(Page::new(count, treatments))
    }

    pub async fn get_treatment(&self, id: i64) -> Result<Treatment, AppError> {
        debug!("Fetching treatment: {}", id);

        match self.state.store.get(Table::Treatments, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("treatment", id)),
        }
    }

    pub async fn create_treatment(&self, input: TreatmentInput) -> Result<Treatment, AppError> {
        let input = self.validate(input).await?;
        debug!("Creating treatment for consultation {}", input.consultation_id);

        let treatment: Treatment = decode_row(self.state.store.insert(Table::Treatments, Self::to_row(&input)).await?)?;

        info!("Treatment created with ID: {}", treatment.id);
        Ok(treatment)
    }

    pub async fn update_treatment(&self, id: i64, input: TreatmentInput) -> Result<Treatment, AppError> {
        self.get_treatment(id).await?;
        let input = self.validate(input).await?;
        debug!("Updating treatment: {}", id);

        let treatment: Treatment =
            decode_row(self.state.store.update(Table::Treatments, id, Self::to_row(&input)).await?)?;

        info!("Treatment {} updated", id);
        Ok(treatment)
    }

    /// Prescriptions of the treatment are removed with it.
    pub async fn delete_treatment(&self, id: i64) -> Result<(), AppError> {
        self.state.store.delete(Table::Treatments, id).await?;
        info!("Treatment {} deleted", id);
        Ok(())
    }

    pub async fn active_treatments(&self) -> Result<Vec<Treatment>, AppError> {
        let filters = TreatmentFilters {
            active: Some(true),
            ..TreatmentFilters::default()
        };
        Ok(self.list_treatments(&filters).await?.results)
    }

    /// Consultation summaries keyed by consultation id.
    pub async fn consultation_infos<I>(&self, consultation_ids: I) -> Result<HashMap<i64, ConsultationInfo>, AppError>
    where
        I: IntoIterator<Item = i64>,
    {
        let consultations =
            fetch_by_ids::<Consultation, _>(self.state.store.as_ref(), Table::Consultations, consultation_ids).await?;
        let views = ConsultationService::new(&self.state)
            .describe(consultations.into_values().collect())
            .await?;

        Ok(views
            .into_iter()
            .map(|view| {
                let info = ConsultationInfo {
                    id: view.consultation.id,
                    patient: view.patient_name,
                    doctor: view.doctor_name,
                    scheduled_at: view.consultation.scheduled_at,
                };
                (info.id, info)
            })
            .collect())
    }

    pub async fn describe_one(&self, treatment: Treatment) -> Result<TreatmentView, AppError> {
        let id = treatment.id;
        self.describe(vec![treatment])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("treatment {} vanished while describing it", id)))
    }

    pub async fn describe(&self, treatments: Vec<Treatment>) -> Result<Vec<TreatmentView>, AppError> {
        let infos = self.consultation_infos(treatments.iter().map(|t| t.consultation_id)).await?;

        Ok(treatments
            .into_iter()
            .map(|treatment| TreatmentView {
                consultation_info: infos.get(&treatment.consultation_id).cloned(),
                treatment,
            })
            .collect())
    }

    fn to_row(input: &TreatmentInput) -> Value {
        json!({
            "consultation_id": input.consultation_id,
            "description": input.description,
            "start_date": date_value(input.start_date),
            "end_date": input.end_date.map(date_value),
            "instructions": input.instructions,
            "active": input.active,
        })
    }

    async fn validate(&self, input: TreatmentInput) -> Result<TreatmentInput, AppError> {
        let mut errors = FieldErrors::new();

        let description = errors.required("description", &input.description, usize::MAX);
        let instructions = errors.required("instructions", &input.instructions, usize::MAX);

        if let Some(end_date) = input.end_date {
            if end_date < input.start_date {
                errors.add("end_date", "End date cannot be before the start date.");
            }
        }

        match self.state.store.get(Table::Consultations, input.consultation_id).await? {
            Some(row) => {
                let consultation: Consultation = decode_row(row)?;
                if consultation.status != ConsultationStatus::Completed {
                    errors.add("consultation_id", "Treatments can only be added to completed consultations.");
                }
            }
            None => errors.add("consultation_id", "Select a valid consultation."),
        }

        errors.into_result()?;
        Ok(TreatmentInput {
            description,
            instructions,
            ..input
        })
    }
}
