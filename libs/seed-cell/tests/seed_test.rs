use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use consultation_cell::models::ConsultationStatus;
use consultation_cell::services::ConsultationService;
use seed_cell::{seed_database, SeedOptions, SeedSummary};
use shared_database::{AppState, RecordQuery, Table};
use shared_utils::test_utils::TestConfig;
use treatment_cell::models::TreatmentFilters;
use treatment_cell::services::TreatmentService;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 9, 30, 0).unwrap()
}

fn options(seed: u64, consultations: usize) -> SeedOptions {
    SeedOptions {
        seed,
        consultations,
        now: now(),
    }
}

/// Every row of `table` without the columns stamped with the wall clock.
async fn snapshot(state: &AppState, table: Table) -> Vec<Value> {
    let selection = state.store.select(table, &RecordQuery::new()).await.unwrap();
    selection
        .rows
        .into_iter()
        .map(|mut row| {
            if let Some(columns) = row.as_object_mut() {
                for stamped in ["created_at", "registered_at", "issued_on"] {
                    columns.remove(stamped);
                }
            }
            row
        })
        .collect()
}

#[tokio::test]
async fn same_seed_and_clock_reproduce_the_dataset() {
    let first = TestConfig::default().to_state();
    let second = TestConfig::default().to_state();

    let a = seed_database(&first, options(42, 25)).await.unwrap();
    let b = seed_database(&second, options(42, 25)).await.unwrap();
    assert_eq!(a, b);

    for table in [
        Table::Doctors,
        Table::Medications,
        Table::Consultations,
        Table::Treatments,
        Table::Prescriptions,
    ] {
        assert_eq!(snapshot(&first, table).await, snapshot(&second, table).await, "{} differ", table);
    }
}

#[tokio::test]
async fn catalogue_counts_are_fixed() {
    let state = TestConfig::default().to_state();

    let summary = seed_database(&state, options(1, 10)).await.unwrap();

    assert_eq!(summary.removed, 0);
    assert_eq!(summary.specialties, 7);
    assert_eq!(summary.patients, 5);
    assert_eq!(summary.doctors, 4);
    assert_eq!(summary.laboratories, 5);
    assert_eq!(summary.medications, 5);
    assert_eq!(summary.consultations, 10);
    assert!(summary.treatments <= 5);
    assert!(summary.prescriptions >= summary.treatments);
    assert!(summary.prescriptions <= summary.treatments * 3);
}

#[tokio::test]
async fn treatments_only_follow_completed_consultations() {
    let state = TestConfig::default().to_state();

    let summary = seed_database(&state, options(7, 40)).await.unwrap();
    assert!(summary.treatments > 0);

    let treatments = TreatmentService::new(&state)
        .list_treatments(&TreatmentFilters::default())
        .await
        .unwrap();
    assert_eq!(treatments.count, summary.treatments);

    let consultations = ConsultationService::new(&state);
    for treatment in treatments.results {
        let consultation = consultations.get_consultation(treatment.consultation_id).await.unwrap();
        assert_eq!(consultation.status, ConsultationStatus::Completed);
        assert_eq!(treatment.start_date, consultation.scheduled_at.date_naive());
    }
}

#[tokio::test]
async fn reseeding_replaces_the_previous_data() {
    let state = TestConfig::default().to_state();
    let first = seed_database(&state, options(3, 10)).await.unwrap();

    let second = seed_database(&state, options(3, 10)).await.unwrap();

    let inserted = first.specialties
        + first.patients
        + first.doctors
        + first.laboratories
        + first.medications
        + first.consultations
        + first.treatments
        + first.prescriptions;
    assert_eq!(second.removed, inserted);
    assert_eq!(
        SeedSummary { removed: 0, ..second },
        SeedSummary { removed: 0, ..first }
    );
    assert_eq!(ConsultationService::new(&state).count_all().await.unwrap(), 10);
}
