use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use consultation_cell::models::{ConsultationInput, ConsultationStatus};
use treatment_cell::models::{PrescriptionInput, TreatmentInput};

use crate::catalog::{
    DIAGNOSIS, DOSAGES, DURATIONS, FREQUENCIES, INSTRUCTIONS, NOTES, REASONS, SPECIAL_INSTRUCTIONS,
};

/// Random clinical activity for the demo dataset.
///
/// Every draw comes from one seeded [`StdRng`] and every date is relative to
/// the injected `now`, so a given seed and `now` always yield the same data as
/// long as the calls happen in the same order.
pub struct DemoDataGenerator {
    rng: StdRng,
    now: DateTime<Utc>,
}

impl DemoDataGenerator {
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// A consultation 1 to 60 days before `now` with a random status.
    /// Returns `None` when there is nobody to book.
    pub fn consultation(&mut self, patient_ids: &[i64], doctor_ids: &[i64]) -> Option<ConsultationInput> {
        let patient_id = *patient_ids.choose(&mut self.rng)?;
        let doctor_id = *doctor_ids.choose(&mut self.rng)?;
        let days_ago = self.rng.gen_range(1..=60);
        let status = *ConsultationStatus::ALL.choose(&mut self.rng)?;
        let reason = *REASONS.choose(&mut self.rng)?;

        let completed = status == ConsultationStatus::Completed;
        Some(ConsultationInput {
            patient_id,
            doctor_id,
            scheduled_at: self.now - Duration::days(days_ago),
            reason: reason.to_string(),
            diagnosis: if completed { DIAGNOSIS.to_string() } else { String::new() },
            notes: if completed { NOTES.to_string() } else { String::new() },
            status,
        })
    }

    /// A treatment starting on the consultation day and lasting 7 to 30 days.
    pub fn treatment(&mut self, consultation_id: i64, consultation: &ConsultationInput) -> TreatmentInput {
        let start_date = consultation.scheduled_at.date_naive();
        let length = self.rng.gen_range(7..=30);
        TreatmentInput {
            consultation_id,
            description: format!("Medical treatment for {}", consultation.reason.to_lowercase()),
            start_date,
            end_date: Some(start_date + Duration::days(length)),
            instructions: INSTRUCTIONS.to_string(),
            active: true,
        }
    }

    /// One to three prescriptions, each for a different medication.
    pub fn prescriptions(&mut self, treatment_id: i64, medication_ids: &[i64]) -> Vec<PrescriptionInput> {
        if medication_ids.is_empty() {
            return Vec::new();
        }

        let wanted = self.rng.gen_range(1..=3).min(medication_ids.len());
        let chosen: Vec<i64> = medication_ids
            .choose_multiple(&mut self.rng, wanted)
            .copied()
            .collect();

        chosen
            .into_iter()
            .map(|medication_id| PrescriptionInput {
                treatment_id,
                medication_id,
                dosage: self.pick(&DOSAGES),
                frequency: self.pick(&FREQUENCIES),
                duration: self.pick(&DURATIONS),
                total_quantity: self.rng.gen_range(10..=60),
                special_instructions: SPECIAL_INSTRUCTIONS.to_string(),
            })
            .collect()
    }

    fn pick(&mut self, options: &[&str]) -> String {
        options
            .choose(&mut self.rng)
            .map(|option| option.to_string())
            .unwrap_or_default()
    }
}
