use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use consultation_cell::models::ConsultationStatus;
use consultation_cell::services::ConsultationService;
use doctor_cell::services::{DoctorService, SpecialtyService};
use patient_cell::services::PatientService;
use pharmacy_cell::services::{LaboratoryService, MedicationService};
use shared_database::{AppState, Table};
use shared_models::AppError;
use treatment_cell::services::{PrescriptionService, TreatmentService};

use crate::catalog;
use crate::generator::DemoDataGenerator;

/// Only this many completed consultations get a treatment.
pub const MAX_TREATMENTS: usize = 5;

/// Child tables first so no delete trips a foreign key.
pub const CLEAR_ORDER: [Table; 8] = [
    Table::Prescriptions,
    Table::Treatments,
    Table::Consultations,
    Table::Doctors,
    Table::Patients,
    Table::Medications,
    Table::Laboratories,
    Table::Specialties,
];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub seed: u64,
    pub consultations: usize,
    pub now: DateTime<Utc>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            consultations: 10,
            now: Utc::now(),
        }
    }
}

/// Rows inserted per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub removed: usize,
    pub specialties: usize,
    pub patients: usize,
    pub doctors: usize,
    pub laboratories: usize,
    pub medications: usize,
    pub consultations: usize,
    pub treatments: usize,
    pub prescriptions: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Removed rows:   {}", self.removed)?;
        writeln!(f, "Specialties:    {}", self.specialties)?;
        writeln!(f, "Patients:       {}", self.patients)?;
        writeln!(f, "Doctors:        {}", self.doctors)?;
        writeln!(f, "Laboratories:   {}", self.laboratories)?;
        writeln!(f, "Medications:    {}", self.medications)?;
        writeln!(f, "Consultations:  {}", self.consultations)?;
        writeln!(f, "Treatments:     {}", self.treatments)?;
        write!(f, "Prescriptions:  {}", self.prescriptions)
    }
}

/// Deletes every clinical row, users excepted.
pub async fn clear_clinic_data(state: &AppState) -> Result<usize, AppError> {
    let mut removed = 0;
    for table in CLEAR_ORDER {
        removed += state.store.clear(table).await?;
    }
    Ok(removed)
}

/// Replaces the clinic data with a reproducible demo dataset.
///
/// Every record goes through its service, so the result satisfies the same
/// validation as data entered by hand.
pub async fn seed_database(state: &AppState, options: SeedOptions) -> Result<SeedSummary, AppError> {
    warn!("Seeding {} store: existing clinic data will be removed", state.store.backend_name());
    let mut summary = SeedSummary {
        removed: clear_clinic_data(state).await?,
        ..SeedSummary::default()
    };

    let specialty_service = SpecialtyService::new(state);
    let mut specialty_ids = Vec::new();
    for input in catalog::specialties() {
        specialty_ids.push(specialty_service.create_specialty(input).await?.id);
    }
    summary.specialties = specialty_ids.len();

    let patient_service = PatientService::new(state);
    let mut patient_ids = Vec::new();
    for input in catalog::patients() {
        patient_ids.push(patient_service.create_patient(input).await?.id);
    }
    summary.patients = patient_ids.len();

    let doctor_service = DoctorService::new(state);
    let mut doctor_ids = Vec::new();
    for input in catalog::doctors(&specialty_ids) {
        doctor_ids.push(doctor_service.create_doctor(input).await?.id);
    }
    summary.doctors = doctor_ids.len();

    let laboratory_service = LaboratoryService::new(state);
    let mut laboratory_ids = HashMap::new();
    for input in catalog::laboratories() {
        let laboratory = laboratory_service.create_laboratory(input).await?;
        laboratory_ids.insert(laboratory.name, laboratory.id);
    }
    summary.laboratories = laboratory_ids.len();

    let medication_service = MedicationService::new(state);
    let mut medication_ids = Vec::new();
    for seed in &catalog::MEDICATIONS {
        let laboratory_id = laboratory_ids.get(seed.laboratory).copied().ok_or_else(|| {
            AppError::Internal(format!("laboratory {} was not seeded", seed.laboratory))
        })?;
        medication_ids.push(medication_service.create_medication(seed.to_input(laboratory_id)).await?.id);
    }
    summary.medications = medication_ids.len();

    let mut generator = DemoDataGenerator::new(options.seed, options.now);
    let consultation_service = ConsultationService::new(state);
    let mut completed = Vec::new();
    for _ in 0..options.consultations {
        let Some(input) = generator.consultation(&patient_ids, &doctor_ids) else {
            break;
        };
        let consultation = consultation_service.create_consultation(input.clone()).await?;
        if consultation.status == ConsultationStatus::Completed {
            completed.push((consultation.id, input));
        }
        summary.consultations += 1;
    }

    let treatment_service = TreatmentService::new(state);
    let prescription_service = PrescriptionService::new(state);
    for (consultation_id, consultation) in completed.iter().take(MAX_TREATMENTS) {
        let treatment = treatment_service
            .create_treatment(generator.treatment(*consultation_id, consultation))
            .await?;
        summary.treatments += 1;

        for input in generator.prescriptions(treatment.id, &medication_ids) {
            prescription_service.create_prescription(input).await?;
            summary.prescriptions += 1;
        }
    }

    info!(
        "Seeded {} consultations, {} treatments and {} prescriptions (seed {})",
        summary.consultations, summary.treatments, summary.prescriptions, options.seed
    );
    Ok(summary)
}
