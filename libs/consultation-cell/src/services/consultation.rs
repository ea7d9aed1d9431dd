use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use doctor_cell::models::{Doctor, Specialty};
use patient_cell::models::Patient;
use shared_database::store::{decode_row, fetch_by_ids, select_ids};
use shared_database::{AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{parse_ordering, timestamp_value};

use crate::models::{Consultation, ConsultationFilters, ConsultationInput, ConsultationStatus, ConsultationView};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("scheduled_at", "scheduled_at"), ("status", "status")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::desc("scheduled_at")];

pub struct ConsultationService {
    state: AppState,
}

impl ConsultationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_consultations(&self, filters: &ConsultationFilters) -> Result<Page<Consultation>, AppError> {
        debug!("Listing consultations with filters: {:?}", filters);
        let store = self.state.store.as_ref();

        let mut query = RecordQuery::new()
            .filter_opt(filters.doctor.map(|id| Filter::eq("doctor_id", id)))
            .filter_opt(filters.patient.map(|id| Filter::eq("patient_id", id)))
            .filter_opt(filters.status.map(|s| Filter::eq("status", s.as_str())))
            .filter_opt(filters.date_from.map(|b| Filter::gte("scheduled_at", timestamp_value(b.start()))))
            .filter_opt(filters.date_to.map(|b| Filter::lte("scheduled_at", timestamp_value(b.end()))));

        if let Some(specialty_id) = filters.specialty {
            let doctor_ids = select_ids(store, Table::Doctors, RecordQuery::new().filter(Filter::eq("specialty_id", specialty_id))).await?;
            query = query.filter(Filter::is_in("doctor_id", doctor_ids));
        }

        if let Some(term) = &filters.search {
            let patient_ids =
                select_ids(store, Table::Patients, RecordQuery::new().filter(Filter::contains("first_name", term))).await?;
            let doctor_ids =
                select_ids(store, Table::Doctors, RecordQuery::new().filter(Filter::contains("first_name", term))).await?;
            query = query.any(vec![
                Filter::contains("reason", term),
                Filter::contains("diagnosis", term),
                Filter::is_in("patient_id", patient_ids),
                Filter::is_in("doctor_id", doctor_ids),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, consultations) = store.select(Table::Consultations, &query).await?.decode()?;
        Ok(Page::new(count, consultations))
    }

    pub async fn get_consultation(&self, id: i64) -> Result<Consultation, AppError> {
        debug!("Fetching consultation: {}", id);

        match self.state.store.get(Table::Consultations, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("consultation", id)),
        }
    }

    pub async fn create_consultation(&self, input: ConsultationInput) -> Result<Consultation, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Booking consultation for patient {} with doctor {}", input.patient_id, input.doctor_id);

        let row = Self::to_row(&input, Utc::now());
        let consultation: Consultation = decode_row(self.state.store.insert(Table::Consultations, row).await?)?;

        info!("Consultation created with ID: {}", consultation.id);
        Ok(consultation)
    }

    pub async fn update_consultation(&self, id: i64, input: ConsultationInput) -> Result<Consultation, AppError> {
        let existing = self.get_consultation(id).await?;
        let input = self.validate(input, Some(&existing)).await?;
        debug!("Updating consultation: {}", id);

        let row = Self::to_row(&input, existing.created_at);
        let consultation: Consultation = decode_row(self.state.store.update(Table::Consultations, id, row).await?)?;

        info!("Consultation {} updated ({})", id, consultation.status);
        Ok(consultation)
    }

    /// Unguarded: treatments and their prescriptions go with it.
    pub async fn delete_consultation(&self, id: i64) -> Result<(), AppError> {
        self.state.store.delete(Table::Consultations, id).await?;
        info!("Consultation {} deleted", id);
        Ok(())
    }

    pub async fn completed_consultations(&self) -> Result<Vec<Consultation>, AppError> {
        let filters = ConsultationFilters {
            status: Some(ConsultationStatus::Completed),
            ..ConsultationFilters::default()
        };
        Ok(self.list_consultations(&filters).await?.results)
    }

    pub async fn count_all(&self) -> Result<usize, AppError> {
        Ok(self.state.store.count(Table::Consultations, &RecordQuery::new()).await?)
    }

    pub async fn describe_one(&self, consultation: Consultation) -> Result<ConsultationView, AppError> {
        let id = consultation.id;
        self.describe(vec![consultation])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("consultation {} vanished while describing it", id)))
    }

    pub async fn describe(&self, consultations: Vec<Consultation>) -> Result<Vec<ConsultationView>, AppError> {
        let store = self.state.store.as_ref();
        let patients =
            fetch_by_ids::<Patient, _>(store, Table::Patients, consultations.iter().map(|c| c.patient_id)).await?;
        let doctors = fetch_by_ids::<Doctor, _>(store, Table::Doctors, consultations.iter().map(|c| c.doctor_id)).await?;
        let specialties =
            fetch_by_ids::<Specialty, _>(store, Table::Specialties, doctors.values().map(|d| d.specialty_id)).await?;

        Ok(consultations
            .into_iter()
            .map(|consultation| {
                let doctor = doctors.get(&consultation.doctor_id);
                ConsultationView {
                    patient_name: patients
                        .get(&consultation.patient_id)
                        .map(Patient::full_name)
                        .unwrap_or_default(),
                    doctor_name: doctor.map(Doctor::full_name).unwrap_or_default(),
                    specialty_name: doctor
                        .and_then(|d| specialties.get(&d.specialty_id))
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                    consultation,
                }
            })
            .collect())
    }

    fn to_row(input: &ConsultationInput, created_at: DateTime<Utc>) -> Value {
        json!({
            "patient_id": input.patient_id,
            "doctor_id": input.doctor_id,
            "scheduled_at": timestamp_value(input.scheduled_at),
            "reason": input.reason,
            "diagnosis": input.diagnosis,
            "notes": input.notes,
            "status": input.status.as_str(),
            "created_at": timestamp_value(created_at),
        })
    }

    /// Treatments need a completed consultation, so one that has them cannot
    /// leave that status.
    async fn validate(
        &self,
        input: ConsultationInput,
        existing: Option<&Consultation>,
    ) -> Result<ConsultationInput, AppError> {
        let mut errors = FieldErrors::new();

        let reason = errors.required("reason", &input.reason, usize::MAX);
        let diagnosis = errors.optional("diagnosis", &input.diagnosis, usize::MAX);
        let notes = errors.optional("notes", &input.notes, usize::MAX);

        let store = self.state.store.as_ref();
        match store.get(Table::Patients, input.patient_id).await? {
            Some(row) => {
                let patient: Patient = decode_row(row)?;
                if !patient.active {
                    errors.add("patient_id", "Select an active patient.");
                }
            }
            None => errors.add("patient_id", "Select a valid patient."),
        }
        match store.get(Table::Doctors, input.doctor_id).await? {
            Some(row) => {
                let doctor: Doctor = decode_row(row)?;
                if !doctor.active {
                    errors.add("doctor_id", "Select an active doctor.");
                }
            }
            None => errors.add("doctor_id", "Select a valid doctor."),
        }

        if let Some(existing) = existing {
            if existing.status == ConsultationStatus::Completed && input.status != ConsultationStatus::Completed {
                let query = RecordQuery::new().filter(Filter::eq("consultation_id", existing.id));
                let treatments = store.count(Table::Treatments, &query).await?;
                if treatments > 0 {
                    errors.add(
                        "status",
                        format!(
                            "This consultation has {} treatment(s) and must remain completed.",
                            treatments
                        ),
                    );
                }
            }
        }

        errors.into_result()?;
        Ok(ConsultationInput {
            reason,
            diagnosis,
            notes,
            ..input
        })
    }
}
