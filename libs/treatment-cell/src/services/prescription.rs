use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use pharmacy_cell::models::Medication;
use shared_database::store::{decode_row, fetch_by_ids, select_ids};
use shared_database::{AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{date_value, parse_ordering};

use crate::models::{Prescription, PrescriptionFilters, PrescriptionInput, PrescriptionView, Treatment, TreatmentInfo};
use crate::services::TreatmentService;

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("issued_on", "issued_on")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::desc("issued_on")];

pub struct PrescriptionService {
    state: AppState,
}

impl PrescriptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_prescriptions(&self, filters: &PrescriptionFilters) -> Result<Page<Prescription>, AppError> {
        debug!("Listing prescriptions with filters: {:?}", filters);
        let store = self.state.store.as_ref();

        let mut query = RecordQuery::new()
            .filter_opt(filters.treatment.map(|id| Filter::eq("treatment_id", id)))
            .filter_opt(filters.medication.map(|id| Filter::eq("medication_id", id)))
            .filter_opt(filters.date_from.map(|b| Filter::gte("issued_on", date_value(b.start().date_naive()))))
            .filter_opt(filters.date_to.map(|b| Filter::lte("issued_on", date_value(b.end().date_naive()))));

        if let Some(patient_id) = filters.patient {
            let consultation_ids =
                select_ids(store, Table::Consultations, RecordQuery::new().filter(Filter::eq("patient_id", patient_id)))
                    .await?;
            let treatment_ids = select_ids(
                store,
                Table::Treatments,
                RecordQuery::new().filter(Filter::is_in("consultation_id", consultation_ids)),
            )
            .await?;
            query = query.filter(Filter::is_in("treatment_id", treatment_ids));
        }

        if let Some(term) = &filters.search {
            let medication_ids =
                select_ids(store, Table::Medications, RecordQuery::new().filter(Filter::contains("name", term))).await?;
            query = query.any(vec![
                Filter::contains("dosage", term),
                Filter::is_in("medication_id", medication_ids),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, prescriptions) = store.select(Table::Prescriptions, &query).await?.decode()?;
        Ok(Page::new(count, prescriptions))
    }

    pub async fn get_prescription(&self, id: i64) -> Result<Prescription, AppError> {
        debug!("Fetching prescription: {}", id);

        match self.state.store.get(Table::Prescriptions, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("prescription", id)),
        }
    }

    pub async fn create_prescription(&self, input: PrescriptionInput) -> Result<Prescription, AppError> {
        let input = self.validate(input).await?;
        debug!("Prescribing medication {} for treatment {}", input.medication_id, input.treatment_id);

        let row = Self::to_row(&input, Utc::now().date_naive());
        let prescription: Prescription = decode_row(self.state.store.insert(Table::Prescriptions, row).await?)?;

        info!("Prescription created with ID: {}", prescription.id);
        Ok(prescription)
    }

    pub async fn update_prescription(&self, id: i64, input: PrescriptionInput) -> Result<Prescription, AppError> {
        let existing = self.get_prescription(id).await?;
        let input = self.validate(input).await?;
        debug!("Updating prescription: {}", id);

        let row = Self::to_row(&input, existing.issued_on);
        let prescription: Prescription = decode_row(self.state.store.update(Table::Prescriptions, id, row).await?)?;

        info!("Prescription {} updated", id);
        Ok(prescription)
    }

    pub async fn delete_prescription(&self, id: i64) -> Result<(), AppError> {
        self.state.store.delete(Table::Prescriptions, id).await?;
        info!("Prescription {} deleted", id);
        Ok(())
    }

    pub async fn describe_one(&self, prescription: Prescription) -> Result<PrescriptionView, AppError> {
        let id = prescription.id;
        self.describe(vec![prescription])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("prescription {} vanished while describing it", id)))
    }

    pub async fn describe(&self, prescriptions: Vec<Prescription>) -> Result<Vec<PrescriptionView>, AppError> {
        let store = self.state.store.as_ref();
        let medications =
            fetch_by_ids::<Medication, _>(store, Table::Medications, prescriptions.iter().map(|p| p.medication_id)).await?;
        let treatments =
            fetch_by_ids::<Treatment, _>(store, Table::Treatments, prescriptions.iter().map(|p| p.treatment_id)).await?;
        let consultations = TreatmentService::new(&self.state)
            .consultation_infos(treatments.values().map(|t| t.consultation_id))
            .await?;

        Ok(prescriptions
            .into_iter()
            .map(|prescription| PrescriptionView {
                medication_name: medications
                    .get(&prescription.medication_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                treatment_info: treatments.get(&prescription.treatment_id).map(|treatment| TreatmentInfo {
                    id: treatment.id,
                    description: treatment.description.clone(),
                    patient: consultations
                        .get(&treatment.consultation_id)
                        .map(|c| c.patient.clone())
                        .unwrap_or_default(),
                }),
                prescription,
            })
            .collect())
    }

    fn to_row(input: &PrescriptionInput, issued_on: NaiveDate) -> Value {
        json!({
            "treatment_id": input.treatment_id,
            "medication_id": input.medication_id,
            "dosage": input.dosage,
            "frequency": input.frequency,
            "duration": input.duration,
            "total_quantity": input.total_quantity,
            "special_instructions": input.special_instructions,
            "issued_on": date_value(issued_on),
        })
    }

    async fn validate(&self, input: PrescriptionInput) -> Result<PrescriptionInput, AppError> {
        let mut errors = FieldErrors::new();
        let store = self.state.store.as_ref();

        let dosage = errors.required("dosage", &input.dosage, 100);
        let frequency = errors.required("frequency", &input.frequency, 100);
        let duration = errors.required("duration", &input.duration, 100);
        let special_instructions = errors.optional("special_instructions", &input.special_instructions, usize::MAX);
        if input.total_quantity < 1 {
            errors.add("total_quantity", "Total quantity must be at least 1.");
        }

        match store.get(Table::Treatments, input.treatment_id).await? {
            Some(row) => {
                let treatment: Treatment = decode_row(row)?;
                if !treatment.active {
                    errors.add("treatment_id", "Select an active treatment.");
                }
            }
            None => errors.add("treatment_id", "Select a valid treatment."),
        }
        match store.get(Table::Medications, input.medication_id).await? {
            Some(row) => {
                let medication: Medication = decode_row(row)?;
                if !medication.active {
                    errors.add("medication_id", "Select an active medication.");
                }
            }
            None => errors.add("medication_id", "Select a valid medication."),
        }

        errors.into_result()?;
        Ok(PrescriptionInput {
            dosage,
            frequency,
            duration,
            special_instructions,
            ..input
        })
    }
}
