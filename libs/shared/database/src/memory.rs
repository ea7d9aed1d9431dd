use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::RecordQuery;
use crate::schema::{OnDelete, Table};
use crate::store::{ClinicStore, Selection, StoreError};

#[derive(Debug, Default)]
struct TableRows {
    next_id: i64,
    rows: BTreeMap<i64, Value>,
}

type Tables = HashMap<Table, TableRows>;

/// In-process store. One lock guards every table so key checks and cascades are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rows_of(tables: &Tables, table: Table) -> impl Iterator<Item = (&i64, &Value)> {
    tables.get(&table).into_iter().flat_map(|t| t.rows.iter())
}

fn check_foreign_keys(tables: &Tables, table: Table, record: &Value) -> Result<(), StoreError> {
    for fk in table.foreign_keys() {
        let value = &record[fk.column];
        if value.is_null() {
            continue;
        }
        let exists = value
            .as_i64()
            .map(|id| {
                tables
                    .get(&fk.references)
                    .map(|t| t.rows.contains_key(&id))
                    .unwrap_or(false)
            })
            .unwrap_or(false);
        if !exists {
            return Err(StoreError::ForeignKeyViolation {
                table,
                detail: format!(
                    "{} = {} is not present in {}",
                    fk.column, value, fk.references
                ),
            });
        }
    }
    Ok(())
}

fn check_unique(
    tables: &Tables,
    table: Table,
    record: &Value,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    for column in table.unique_columns() {
        let value = &record[*column];
        if value.is_null() {
            continue;
        }
        let taken = rows_of(tables, table)
            .any(|(id, row)| Some(*id) != exclude_id && &row[*column] == value);
        if taken {
            return Err(StoreError::UniqueViolation {
                table,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Collects `(table, id)` plus everything that cascades from it.
/// Fails if any protected reference exists.
fn plan_delete(
    tables: &Tables,
    table: Table,
    id: i64,
    plan: &mut Vec<(Table, i64)>,
) -> Result<(), StoreError> {
    if plan.contains(&(table, id)) {
        return Ok(());
    }
    plan.push((table, id));

    for (child, fk) in table.referenced_by() {
        let dependents: Vec<i64> = rows_of(tables, child)
            .filter(|(_, row)| row[fk.column].as_i64() == Some(id))
            .map(|(child_id, _)| *child_id)
            .collect();

        if dependents.is_empty() {
            continue;
        }

        match fk.on_delete {
            OnDelete::Protect => {
                return Err(StoreError::ForeignKeyViolation {
                    table,
                    detail: format!(
                        "{} row {} is still referenced by {} row(s) of {}.{}",
                        table,
                        id,
                        dependents.len(),
                        child,
                        fk.column
                    ),
                });
            }
            OnDelete::Cascade => {
                for child_id in dependents {
                    plan_delete(tables, child, child_id, plan)?;
                }
            }
        }
    }
    Ok(())
}

fn apply_plan(tables: &mut Tables, plan: &[(Table, i64)]) {
    for (table, id) in plan {
        if let Some(rows) = tables.get_mut(table) {
            rows.rows.remove(id);
        }
    }
}

fn as_object(table: Table, mut record: Value, id: i64) -> Result<Value, StoreError> {
    match record.as_object_mut() {
        Some(map) => {
            map.insert("id".to_string(), Value::from(id));
        }
        None => {
            return Err(StoreError::InvalidRecord {
                table,
                detail: "record must be a JSON object".to_string(),
            })
        }
    }
    Ok(record)
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn select(&self, table: Table, query: &RecordQuery) -> Result<Selection, StoreError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<Value> = rows_of(&tables, table)
            .filter(|(_, row)| query.matches(row))
            .map(|(_, row)| row.clone())
            .collect();
        query.sort(&mut rows);

        let total = rows.len();
        let offset = query.offset.unwrap_or(0);
        let rows = rows
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(Selection { rows, total })
    }

    async fn get(&self, table: Table, id: i64) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn insert(&self, table: Table, record: Value) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;

        let next_id = tables.get(&table).map(|t| t.next_id).unwrap_or(0) + 1;
        let record = as_object(table, record, next_id)?;
        check_foreign_keys(&tables, table, &record)?;
        check_unique(&tables, table, &record, None)?;

        let rows = tables.entry(table).or_default();
        rows.next_id = next_id;
        rows.rows.insert(next_id, record.clone());

        debug!("Inserted {} row {}", table, next_id);
        Ok(record)
    }

    async fn update(&self, table: Table, id: i64, record: Value) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;

        let exists = tables
            .get(&table)
            .map(|t| t.rows.contains_key(&id))
            .unwrap_or(false);
        if !exists {
            return Err(StoreError::NotFound { table, id });
        }

        let record = as_object(table, record, id)?;
        check_foreign_keys(&tables, table, &record)?;
        check_unique(&tables, table, &record, Some(id))?;

        tables.entry(table).or_default().rows.insert(id, record.clone());

        debug!("Updated {} row {}", table, id);
        Ok(record)
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let exists = tables
            .get(&table)
            .map(|t| t.rows.contains_key(&id))
            .unwrap_or(false);
        if !exists {
            return Err(StoreError::NotFound { table, id });
        }

        let mut plan = Vec::new();
        plan_delete(&tables, table, id, &mut plan)?;
        apply_plan(&mut tables, &plan);

        debug!("Deleted {} row {} ({} rows including cascades)", table, id, plan.len());
        Ok(())
    }

    async fn clear(&self, table: Table) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;

        let ids: Vec<i64> = rows_of(&tables, table).map(|(id, _)| *id).collect();
        let mut plan = Vec::new();
        for id in &ids {
            plan_delete(&tables, table, *id, &mut plan)?;
        }
        apply_plan(&mut tables, &plan);

        debug!("Cleared {} rows from {}", ids.len(), table);
        Ok(ids.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    use crate::query::{Filter, OrderBy};

    async fn store_with_specialty() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let specialty = store
            .insert(Table::Specialties, json!({"name": "Cardiology", "active": true}))
            .await
            .unwrap();
        (store, specialty["id"].as_i64().unwrap())
    }

    fn doctor(specialty_id: i64, national_id: &str, registration: &str) -> Value {
        json!({
            "national_id": national_id,
            "first_name": "Ana",
            "paternal_surname": "Rojas",
            "specialty_id": specialty_id,
            "registration_number": registration,
            "active": true,
        })
    }

    #[tokio::test]
    async fn assigns_sequential_ids_per_table() {
        let store = MemoryStore::new();
        let a = store.insert(Table::Laboratories, json!({"name": "Farma Plus"})).await.unwrap();
        let b = store.insert(Table::Laboratories, json!({"name": "CardioMed"})).await.unwrap();
        let c = store.insert(Table::Users, json!({"username": "admin"})).await.unwrap();

        assert_eq!(a["id"], 1);
        assert_eq!(b["id"], 2);
        assert_eq!(c["id"], 1);
    }

    #[tokio::test]
    async fn rejects_duplicate_unique_columns() {
        let (store, _) = store_with_specialty().await;
        let result = store
            .insert(Table::Specialties, json!({"name": "Cardiology", "active": false}))
            .await;

        assert_matches!(result, Err(StoreError::UniqueViolation { column, .. }) if column == "name");
    }

    #[tokio::test]
    async fn update_may_keep_its_own_unique_value() {
        let (store, id) = store_with_specialty().await;
        let updated = store
            .update(Table::Specialties, id, json!({"name": "Cardiology", "active": false}))
            .await
            .unwrap();
        assert_eq!(updated["active"], false);
        assert_eq!(updated["id"], id);
    }

    #[tokio::test]
    async fn rejects_dangling_foreign_keys() {
        let store = MemoryStore::new();
        let result = store.insert(Table::Doctors, doctor(99, "12345678", "REG-1")).await;
        assert_matches!(result, Err(StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn protected_rows_cannot_be_deleted() {
        let (store, specialty_id) = store_with_specialty().await;
        store
            .insert(Table::Doctors, doctor(specialty_id, "12345678", "REG-1"))
            .await
            .unwrap();

        let result = store.delete(Table::Specialties, specialty_id).await;
        assert_matches!(result, Err(StoreError::ForeignKeyViolation { .. }));
        assert!(store.get(Table::Specialties, specialty_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_consultation_cascades_to_treatments_and_prescriptions() {
        let store = MemoryStore::new();
        let patient = store.insert(Table::Patients, json!({"national_id": "11111111"})).await.unwrap();
        let specialty = store
            .insert(Table::Specialties, json!({"name": "Pediatrics"}))
            .await
            .unwrap();
        let specialty_id = specialty["id"].as_i64().unwrap();
        let doc = store.insert(Table::Doctors, doctor(specialty_id, "22222222", "REG-2")).await.unwrap();
        let lab = store.insert(Table::Laboratories, json!({"name": "Gastro Lab"})).await.unwrap();
        let med = store
            .insert(Table::Medications, json!({"name": "Omeprazole", "laboratory_id": lab["id"]}))
            .await
            .unwrap();
        let consultation = store
            .insert(
                Table::Consultations,
                json!({"patient_id": patient["id"], "doctor_id": doc["id"]}),
            )
            .await
            .unwrap();
        let treatment = store
            .insert(Table::Treatments, json!({"consultation_id": consultation["id"]}))
            .await
            .unwrap();
        store
            .insert(
                Table::Prescriptions,
                json!({"treatment_id": treatment["id"], "medication_id": med["id"]}),
            )
            .await
            .unwrap();

        store
            .delete(Table::Consultations, consultation["id"].as_i64().unwrap())
            .await
            .unwrap();

        let all = RecordQuery::new();
        assert_eq!(store.count(Table::Treatments, &all).await.unwrap(), 0);
        assert_eq!(store.count(Table::Prescriptions, &all).await.unwrap(), 0);
        assert_eq!(store.count(Table::Medications, &all).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_refuses_while_protected_rows_remain() {
        let (store, specialty_id) = store_with_specialty().await;
        store
            .insert(Table::Doctors, doctor(specialty_id, "12345678", "REG-1"))
            .await
            .unwrap();

        assert_matches!(
            store.clear(Table::Specialties).await,
            Err(StoreError::ForeignKeyViolation { .. })
        );
        assert_eq!(store.clear(Table::Doctors).await.unwrap(), 1);
        assert_eq!(store.clear(Table::Specialties).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn select_reports_total_before_paging() {
        let store = MemoryStore::new();
        for name in ["Dermatology", "Cardiology", "Pediatrics", "Gynecology"] {
            store.insert(Table::Specialties, json!({"name": name, "active": true})).await.unwrap();
        }

        let query = RecordQuery::new()
            .filter(Filter::eq("active", true))
            .order_by(vec![OrderBy::asc("name")])
            .page(Some(2), Some(1));
        let selection = store.select(Table::Specialties, &query).await.unwrap();

        assert_eq!(selection.total, 4);
        let names: Vec<&str> = selection.rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Dermatology", "Gynecology"]);
    }
}
