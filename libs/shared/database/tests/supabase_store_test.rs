use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::{AppConfig, StorageBackend};
use shared_database::{ClinicStore, Filter, OrderBy, RecordQuery, StoreError, SupabaseStore, Table};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        storage_backend: StorageBackend::Supabase,
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn select_sends_postgrest_filters_and_reads_total() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .and(query_param("active", "eq.true"))
        .and(query_param("order", "name.asc,id.asc"))
        .and(query_param("limit", "1"))
        .and(header("apikey", "test-anon-key"))
        .and(header("Authorization", "Bearer test-anon-key"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/3")
                .set_body_json(json!([{"id": 2, "name": "Cardiology", "active": true}])),
        )
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config_for(&mock_server));
    let query = RecordQuery::new()
        .filter(Filter::eq("active", true))
        .order_by(vec![OrderBy::asc("name")])
        .page(Some(1), None);

    let selection = store.select(Table::Specialties, &query).await.unwrap();
    assert_eq!(selection.total, 3);
    assert_eq!(selection.rows.len(), 1);
    assert_eq!(selection.rows[0]["name"], "Cardiology");
}

#[tokio::test]
async fn insert_returns_the_stored_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/laboratories"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 11, "name": "Farma Plus", "country": "Chile"}
        ])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config_for(&mock_server));
    let row = store
        .insert(Table::Laboratories, json!({"name": "Farma Plus", "country": "Chile"}))
        .await
        .unwrap();

    assert_eq!(row["id"], 11);
}

#[tokio::test]
async fn delete_of_referenced_row_is_a_foreign_key_violation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/specialties"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "update or delete on table \"specialties\" violates foreign key constraint",
            "details": "Key (id)=(1) is still referenced from table \"doctors\"."
        })))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config_for(&mock_server));
    let result = store.delete(Table::Specialties, 1).await;

    assert_matches!(result, Err(StoreError::ForeignKeyViolation { table: Table::Specialties, .. }));
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config_for(&mock_server));
    let result = store.update(Table::Patients, 42, json!({"first_name": "Ana"})).await;

    assert_matches!(result, Err(StoreError::NotFound { id: 42, .. }));
}

#[tokio::test]
async fn get_returns_none_for_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config_for(&mock_server));
    assert!(store.get(Table::Users, 5).await.unwrap().is_none());
}
