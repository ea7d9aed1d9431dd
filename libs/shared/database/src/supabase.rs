use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::query::{Condition, Filter, FilterOp, RecordQuery};
use crate::schema::Table;
use crate::store::{ClinicStore, Selection, StoreError};

/// Thin PostgREST client for a Supabase project.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            token: config.supabase_token().to_string(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", header_value(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.token.is_empty() {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", self.token))?);
        }

        Ok(headers)
    }

    /// Sends a request and turns non-success statuses into `StoreError`s.
    pub async fn send(
        &self,
        table: Table,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(map_error(table, status.as_u16(), &error_text));
        }

        Ok(response)
    }

    pub async fn request_rows(
        &self,
        table: Table,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self.send(table, method, path, body, prefer).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(raw)
        .map_err(|e| StoreError::Backend(format!("invalid header value: {}", e)))
}

fn map_error(table: Table, status: u16, body: &str) -> StoreError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|p| p.code.clone()).unwrap_or_default();
    let detail = parsed
        .as_ref()
        .and_then(|p| p.details.clone().or_else(|| p.message.clone()))
        .unwrap_or_else(|| body.to_string());

    match code.as_str() {
        "23503" => StoreError::ForeignKeyViolation { table, detail },
        "23505" => StoreError::UniqueViolation {
            table,
            column: unique_column(&detail).unwrap_or_else(|| "value".to_string()),
        },
        _ => StoreError::Backend(format!("API error ({}): {}", status, body)),
    }
}

/// Pulls `col` out of Postgres' `Key (col)=(value) already exists.` detail.
fn unique_column(detail: &str) -> Option<String> {
    let start = detail.find("Key (")? + "Key (".len();
    let end = detail[start..].find(')')? + start;
    Some(detail[start..end].to_string())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Double-quotes a value inside an `in.(...)` or `or=(...)` list so reserved
/// characters such as `,` `.` `(` `)` stay part of the value.
fn quoted(raw: &str) -> String {
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

fn list_item(value: &Value) -> String {
    match value {
        Value::String(s) => quoted(s),
        other => scalar(other),
    }
}

/// `ilike` pattern matching `term` as a literal substring. LIKE wildcards in
/// the term are escaped. PostgREST turns every `*` into `%`, so a literal `*`
/// is matched with the single-character wildcard instead.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('*');
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('_'),
            c => pattern.push(c),
        }
    }
    pattern.push('*');
    pattern
}

fn operator(filter: &Filter, quoted_values: bool) -> String {
    let value = |v: &Value| if quoted_values { list_item(v) } else { scalar(v) };
    match &filter.op {
        FilterOp::Eq(v) => format!("eq.{}", value(v)),
        FilterOp::Contains(term) => {
            let pattern = contains_pattern(term);
            format!("ilike.{}", if quoted_values { quoted(&pattern) } else { pattern })
        }
        FilterOp::Gte(v) => format!("gte.{}", value(v)),
        FilterOp::Lte(v) => format!("lte.{}", value(v)),
        FilterOp::In(values) => format!(
            "in.({})",
            values.iter().map(list_item).collect::<Vec<_>>().join(",")
        ),
    }
}

/// Renders a query as a PostgREST query string (without the leading `?`).
pub fn encode_query(query: &RecordQuery) -> String {
    let mut params: Vec<String> = Vec::new();

    for condition in &query.conditions {
        match condition {
            Condition::Filter(filter) => params.push(format!(
                "{}={}",
                filter.column,
                urlencoding::encode(&operator(filter, false))
            )),
            Condition::Any(filters) => {
                let inner: Vec<String> = filters
                    .iter()
                    .map(|f| format!("{}.{}", f.column, operator(f, true)))
                    .collect();
                params.push(format!(
                    "or={}",
                    urlencoding::encode(&format!("({})", inner.join(",")))
                ));
            }
        }
    }

    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.descending { "desc" } else { "asc" }))
            .chain(std::iter::once("id.asc".to_string()))
            .collect();
        params.push(format!("order={}", order.join(",")));
    }
    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }
    if let Some(offset) = query.offset {
        params.push(format!("offset={}", offset));
    }

    params.join("&")
}

/// Total from a `Content-Range: 0-9/42` header.
fn content_range_total(response: &Response) -> Option<usize> {
    response
        .headers()
        .get("content-range")?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

fn without_id(mut record: Value) -> Value {
    if let Some(map) = record.as_object_mut() {
        map.remove("id");
    }
    record
}

/// `ClinicStore` backed by Supabase's REST interface. Keys and cascades live in
/// the database schema (see `migrations/`).
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    fn path(table: Table, query: &str) -> String {
        if query.is_empty() {
            format!("/rest/v1/{}", table.name())
        } else {
            format!("/rest/v1/{}?{}", table.name(), query)
        }
    }
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn select(&self, table: Table, query: &RecordQuery) -> Result<Selection, StoreError> {
        let path = Self::path(table, &encode_query(query));
        let response = self
            .client
            .send(table, Method::GET, &path, None, Some("count=exact"))
            .await?;

        let total = content_range_total(&response);
        let rows: Vec<Value> = response.json().await?;
        Ok(Selection {
            total: total.unwrap_or(rows.len()),
            rows,
        })
    }

    async fn get(&self, table: Table, id: i64) -> Result<Option<Value>, StoreError> {
        let path = Self::path(table, &format!("id=eq.{}", id));
        let rows = self.client.request_rows(table, Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, table: Table, record: Value) -> Result<Value, StoreError> {
        let rows = self
            .client
            .request_rows(
                table,
                Method::POST,
                &Self::path(table, ""),
                Some(without_id(record)),
                Some("return=representation"),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            StoreError::Backend(format!("insert into {} returned no rows", table))
        })
    }

    async fn update(&self, table: Table, id: i64, record: Value) -> Result<Value, StoreError> {
        let path = Self::path(table, &format!("id=eq.{}", id));
        let rows = self
            .client
            .request_rows(
                table,
                Method::PATCH,
                &path,
                Some(without_id(record)),
                Some("return=representation"),
            )
            .await?;

        rows.into_iter().next().ok_or(StoreError::NotFound { table, id })
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        let path = Self::path(table, &format!("id=eq.{}", id));
        let rows = self
            .client
            .request_rows(table, Method::DELETE, &path, None, Some("return=representation"))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound { table, id });
        }
        Ok(())
    }

    async fn clear(&self, table: Table) -> Result<usize, StoreError> {
        // PostgREST refuses unfiltered deletes.
        let path = Self::path(table, "id=gte.0");
        let rows = self
            .client
            .request_rows(table, Method::DELETE, &path, None, Some("return=representation"))
            .await?;
        Ok(rows.len())
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
