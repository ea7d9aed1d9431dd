use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use shared_models::AppError;

use crate::query::{Filter, RecordQuery};
use crate::schema::Table;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{table} row {id} not found")]
    NotFound { table: Table, id: i64 },

    #[error("duplicate value for {table}.{column}")]
    UniqueViolation { table: Table, column: String },

    #[error("foreign key violation on {table}: {detail}")]
    ForeignKeyViolation { table: Table, detail: String },

    #[error("invalid record for {table}: {detail}")]
    InvalidRecord { table: Table, detail: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table, id } => AppError::not_found(table.singular(), id),
            StoreError::UniqueViolation { table, column } => AppError::Conflict(format!(
                "A {} with this {} already exists",
                table.singular(),
                column
            )),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Rows matching a query after paging, plus the match count before paging.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub rows: Vec<Value>,
    pub total: usize,
}

impl Selection {
    pub fn decode<T: DeserializeOwned>(self) -> Result<(usize, Vec<T>), StoreError> {
        let rows = decode_rows(self.rows)?;
        Ok((self.total, rows))
    }
}

#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn select(&self, table: Table, query: &RecordQuery) -> Result<Selection, StoreError>;

    async fn get(&self, table: Table, id: i64) -> Result<Option<Value>, StoreError>;

    /// Inserts a row; the store assigns `id`.
    async fn insert(&self, table: Table, record: Value) -> Result<Value, StoreError>;

    /// Replaces every column of row `id` with `record`.
    async fn update(&self, table: Table, id: i64, record: Value) -> Result<Value, StoreError>;

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError>;

    /// Removes every row of `table`, returning how many were removed.
    async fn clear(&self, table: Table) -> Result<usize, StoreError>;

    fn backend_name(&self) -> &'static str;

    async fn count(&self, table: Table, query: &RecordQuery) -> Result<usize, StoreError> {
        let probe = query.clone().page(Some(1), None);
        Ok(self.select(table, &probe).await?.total)
    }

    async fn exists(&self, table: Table, query: &RecordQuery) -> Result<bool, StoreError> {
        Ok(self.count(table, query).await? > 0)
    }
}

pub type DynStore = Arc<dyn ClinicStore>;

pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(row)?)
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode_row).collect()
}

pub fn record_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// Loads the rows with the given ids, keyed by id. Used for display-name joins.
pub async fn fetch_by_ids<T, I>(
    store: &dyn ClinicStore,
    table: Table,
    ids: I,
) -> Result<HashMap<i64, T>, StoreError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = i64>,
{
    let ids: BTreeSet<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = RecordQuery::new().filter(Filter::is_in("id", ids));
    let selection = store.select(table, &query).await?;

    let mut found = HashMap::with_capacity(selection.rows.len());
    for row in selection.rows {
        if let Some(id) = record_id(&row) {
            found.insert(id, decode_row(row)?);
        }
    }
    Ok(found)
}

/// Ids of every row matching `query`. Used to resolve filters on related tables.
pub async fn select_ids(
    store: &dyn ClinicStore,
    table: Table,
    query: RecordQuery,
) -> Result<Vec<i64>, StoreError> {
    let selection = store.select(table, &query.page(None, None)).await?;
    Ok(selection.rows.iter().filter_map(record_id).collect())
}

/// Whether another row of `table` already holds `value` in `column`.
pub async fn value_taken(
    store: &dyn ClinicStore,
    table: Table,
    column: &'static str,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<bool, StoreError> {
    let query = RecordQuery::new().filter(Filter::eq(column, value));
    let selection = store.select(table, &query).await?;
    Ok(selection.rows.iter().any(|row| record_id(row) != exclude_id))
}
