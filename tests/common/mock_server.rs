//! Mock server helpers for integration tests
//!
//! Thin wrappers around `wiremock` plus JSON fixtures shaped like the
//! analytics API's responses.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pipeline_dashboard::dashboard::{ApiClient, Config};
use pipeline_dashboard::shared::AppConfigBuilder;

/// Config pointing at the mock server
pub fn config_for(server: &MockServer) -> Config {
    Config::with_builder(
        AppConfigBuilder::default()
            .api_base_url(server.uri())
            .request_timeout_ms(2_000)
            .polling_enabled(false),
    )
    .expect("valid test config")
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(config_for(server)).expect("http client")
}

/// Respond to `http_method endpoint` with a JSON body
pub async fn mount_json(
    server: &MockServer,
    http_method: &str,
    endpoint: &str,
    status: u16,
    body: Value,
) {
    Mock::given(method(http_method))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Respond with a raw body, for key order or malformed payloads
pub async fn mount_raw(server: &MockServer, http_method: &str, endpoint: &str, status: u16, body: &str) {
    Mock::given(method(http_method))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json"))
        .mount(server)
        .await;
}

pub fn auto_sync_changed_json() -> Value {
    json!({
        "synced": true,
        "last_sync": "2024-05-01T09:30:00Z",
        "records_synced": 132
    })
}

pub fn lead_funnel_json() -> Value {
    json!({
        "mql_india": 200,
        "sql_india": 50,
        "deals_india": 10,
        "mql_us": 80,
        "sql_us": 0,
        "deals_us": 0,
        "conversion_mql_to_sql_india": 25.0,
        "conversion_sql_to_deal_india": 20.0,
        "overall_conversion_india": 5.0,
        "conversion_mql_to_sql_us": 0.0,
        "conversion_sql_to_deal_us": 0.0,
        "overall_conversion_us": 0.0
    })
}

pub fn sync_status_json() -> Value {
    json!({
        "status": "success",
        "last_sync": null,
        "records_synced": 0
    })
}
