use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_database::AppState;

use crate::flash::{Flash, FLASH_COOKIE};

pub struct TestConfig {
    pub max_page_size: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self { max_page_size: 100 }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            max_page_size: self.max_page_size,
            ..AppConfig::default()
        }
    }

    /// Fresh in-memory state. Every call gets its own empty store.
    pub fn to_state(&self) -> Arc<AppState> {
        let mut state = AppState::in_memory();
        state.config = Arc::new(self.to_app_config());
        Arc::new(state)
    }
}

pub fn json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    json_request("GET", uri, None)
}

pub fn form_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("valid request")
}

pub fn with_flash(mut request: Request<Body>, flash: &Flash) -> Request<Body> {
    let cookie = format!("{}={}", FLASH_COOKIE, flash.encode());
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().expect("valid cookie header"));
    request
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Notice set by a redirecting response, decoded from its `Set-Cookie` header.
pub fn flash_of(response: &Response<Body>) -> Option<Flash> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix(&format!("{}=", FLASH_COOKIE)))
        .filter_map(|v| v.split(';').next())
        .find_map(|v| {
            // The jar may percent-encode the already encoded value once more.
            Flash::decode(v).or_else(|| urlencoding::decode(v).ok().and_then(|once| Flash::decode(&once)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();
        assert_eq!(config.max_page_size, 100);
        assert!(config.is_configured());
    }

    #[test]
    fn form_request_encodes_pairs() {
        let request = form_request("/specialties/new", &[("name", "Medicina General"), ("active", "true")]);
        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
    }
}
