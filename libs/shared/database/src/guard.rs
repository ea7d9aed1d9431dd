use tracing::{info, warn};

use shared_models::{AppError, DeleteBlocked};

use crate::query::{Filter, RecordQuery};
use crate::schema::{OnDelete, Table};
use crate::store::ClinicStore;

/// Refuses to delete `table`/`id` while any protected reference points at it.
///
/// The check and the delete are separate store calls. A reference added in
/// between is caught by the store's own constraint instead, which surfaces as a
/// plain database error.
pub async fn ensure_deletable(
    store: &dyn ClinicStore,
    table: Table,
    id: i64,
) -> Result<(), AppError> {
    if store.get(table, id).await?.is_none() {
        return Err(AppError::not_found(table.singular(), id));
    }

    for (child, fk) in table.referenced_by() {
        if fk.on_delete != OnDelete::Protect {
            continue;
        }

        let query = RecordQuery::new().filter(Filter::eq(fk.column, id));
        let count = store.count(child, &query).await?;
        if count > 0 {
            warn!(
                "Refusing to delete {} {}: {} {} row(s) reference it",
                table.singular(),
                id,
                count,
                child
            );
            return Err(AppError::DeleteBlocked(DeleteBlocked {
                entity: table.singular(),
                id,
                dependent: child.name(),
                count,
            }));
        }
    }

    Ok(())
}

pub async fn guarded_delete(store: &dyn ClinicStore, table: Table, id: i64) -> Result<(), AppError> {
    ensure_deletable(store, table, id).await?;
    store.delete(table, id).await?;
    info!("Deleted {} {}", table.singular(), id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn blocks_while_dependents_exist_regardless_of_their_active_flag() {
        let store = MemoryStore::new();
        let lab = store.insert(Table::Laboratories, json!({"name": "CardioMed"})).await.unwrap();
        let lab_id = lab["id"].as_i64().unwrap();
        let med = store
            .insert(
                Table::Medications,
                json!({"name": "Losartan", "laboratory_id": lab_id, "active": false}),
            )
            .await
            .unwrap();

        let result = guarded_delete(&store, Table::Laboratories, lab_id).await;
        assert_matches!(
            result,
            Err(AppError::DeleteBlocked(DeleteBlocked { dependent: "medications", count: 1, .. }))
        );
        assert!(store.get(Table::Laboratories, lab_id).await.unwrap().is_some());

        store.delete(Table::Medications, med["id"].as_i64().unwrap()).await.unwrap();
        guarded_delete(&store, Table::Laboratories, lab_id).await.unwrap();
        assert!(store.get(Table::Laboratories, lab_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            ensure_deletable(&store, Table::Doctors, 7).await,
            Err(AppError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn cascading_references_do_not_block() {
        let store = MemoryStore::new();
        let patient = store.insert(Table::Patients, json!({"national_id": "1234567"})).await.unwrap();
        let specialty = store.insert(Table::Specialties, json!({"name": "Dermatology"})).await.unwrap();
        let doctor = store
            .insert(
                Table::Doctors,
                json!({"national_id": "7654321", "registration_number": "REG-9", "specialty_id": specialty["id"]}),
            )
            .await
            .unwrap();
        let consultation = store
            .insert(
                Table::Consultations,
                json!({"patient_id": patient["id"], "doctor_id": doctor["id"]}),
            )
            .await
            .unwrap();
        store
            .insert(Table::Treatments, json!({"consultation_id": consultation["id"]}))
            .await
            .unwrap();

        let id = consultation["id"].as_i64().unwrap();
        guarded_delete(&store, Table::Consultations, id).await.unwrap();
        assert_eq!(store.count(Table::Treatments, &RecordQuery::new()).await.unwrap(), 0);
    }
}
