//! Event notifications resources and data sources against a mock service

mod common;

use common::{attr, encode, json_response, not_found, provider};
use terraform_provider_ibm::provider::{
    ApplyResourceChangeRequest, ImportResourceStateRequest, ReadDataSourceRequest,
};
use terraform_provider_ibm::state::{bool_value, make_state, string_list_value, string_value};
use terraform_provider_ibm::{DynamicValue, HostValue};
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer};

fn subscription(invited: &[&str]) -> serde_json::Value {
    let invited: Vec<serde_json::Value> = invited
        .iter()
        .map(|email| serde_json::json!({"email": email}))
        .collect();
    serde_json::json!({
        "id": "sub-1",
        "name": "ops",
        "destination_id": "dest-1",
        "destination_type": "smtp_ibm",
        "topic_id": "topic-1",
        "attributes": {"invited": invited},
    })
}

fn invited_block(emails: &[&str]) -> DynamicValue {
    DynamicValue::List(vec![make_state(vec![("invited", string_list_value(emails))])])
}

#[tokio::test]
async fn test_webhook_destination_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/inst/destinations"))
        .and(body_partial_json(serde_json::json!({
            "name": "hook",
            "type": "webhook",
            "config": {"params": {"url": "https://example.com/hook", "verb": "post"}},
        })))
        .respond_with(json_response(
            201,
            serde_json::json!({"id": "dest-1", "name": "hook", "type": "webhook"}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/destinations/dest-1"))
        .respond_with(json_response(
            200,
            serde_json::json!({
                "id": "dest-1",
                "name": "hook",
                "type": "webhook",
                "subscription_count": 0,
                "config": {"params": {"url": "https://example.com/hook", "verb": "post"}},
            }),
        ))
        .mount(&server)
        .await;

    let params = make_state(vec![
        ("url", string_value("https://example.com/hook")),
        ("verb", string_value("post")),
    ]);
    let planned = make_state(vec![
        ("instance_guid", string_value("inst")),
        ("name", string_value("hook")),
        (
            "config",
            DynamicValue::List(vec![make_state(vec![("params", DynamicValue::List(vec![params]))])]),
        ),
    ]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_en_destination_webhook".to_string(),
            prior_state: HostValue::default(),
            planned_state: encode(&planned),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("inst/dest-1"));
    assert_eq!(attr(&state, "destination_id").as_deref(), Some("dest-1"));
    assert_eq!(attr(&state, "type").as_deref(), Some("webhook"));
}

#[tokio::test]
async fn test_email_subscription_update_sends_recipient_diff() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/instances/inst/subscriptions/sub-1"))
        .and(body_json(serde_json::json!({
            "attributes": {"add": ["c@example.com"], "remove": ["a@example.com"]}
        })))
        .respond_with(json_response(200, subscription(&["b@example.com", "c@example.com"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/subscriptions/sub-1"))
        .respond_with(json_response(200, subscription(&["b@example.com", "c@example.com"])))
        .mount(&server)
        .await;

    let base = |emails: &[&str]| {
        make_state(vec![
            ("id", string_value("inst/sub-1")),
            ("instance_guid", string_value("inst")),
            ("name", string_value("ops")),
            ("destination_id", string_value("dest-1")),
            ("topic_id", string_value("topic-1")),
            ("attributes", invited_block(emails)),
        ])
    };
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_en_subscription_email".to_string(),
            prior_state: encode(&base(&["a@example.com", "b@example.com"])),
            planned_state: encode(&base(&["b@example.com", "c@example.com"])),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "subscription_id").as_deref(), Some("sub-1"));
    assert_eq!(state.get("attributes"), Some(&invited_block(&["b@example.com", "c@example.com"])));
}

#[tokio::test]
async fn test_import_subscription_recovers_invitees() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/subscriptions/sub-1"))
        .respond_with(json_response(200, subscription(&["a@example.com"])))
        .mount(&server)
        .await;

    let response = provider(&server)
        .import_resource_state(ImportResourceStateRequest {
            type_name: "ibm_en_subscription_email".to_string(),
            id: "inst/sub-1".to_string(),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.imported_resources[0].state.decode().unwrap();
    assert_eq!(attr(&state, "instance_guid").as_deref(), Some("inst"));
    let attributes = state.get("attributes").and_then(DynamicValue::as_list).unwrap();
    assert_eq!(
        attributes[0].get("invited"),
        Some(&string_list_value(&["a@example.com"]))
    );
}

#[tokio::test]
async fn test_import_of_missing_subscription_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/subscriptions/gone"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let response = provider(&server)
        .import_resource_state(ImportResourceStateRequest {
            type_name: "ibm_en_subscription_email".to_string(),
            id: "inst/gone".to_string(),
        })
        .await;

    assert!(response.imported_resources.is_empty());
    assert_eq!(response.diagnostics[0].summary, "Cannot import non-existent remote object");
}

#[tokio::test]
async fn test_subscription_delete_tolerates_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/instances/inst/subscriptions/sub-1"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    let prior = make_state(vec![("id", string_value("inst/sub-1"))]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_en_subscription_webhook".to_string(),
            prior_state: encode(&prior),
            planned_state: HostValue::default(),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(response.new_state.decode().unwrap().is_null());
}

#[tokio::test]
async fn test_source_update_sends_only_enabled() {
    let server = MockServer::start().await;
    let source = serde_json::json!({
        "id": "src-1",
        "name": "app",
        "description": "application events",
        "enabled": false,
        "type": "api",
    });
    Mock::given(method("PATCH"))
        .and(path("/v1/instances/inst/sources/src-1"))
        .and(body_json(serde_json::json!({"enabled": false})))
        .respond_with(json_response(200, source.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/sources/src-1"))
        .respond_with(json_response(200, source))
        .mount(&server)
        .await;

    let state_with = |enabled: bool| {
        make_state(vec![
            ("id", string_value("inst/src-1")),
            ("instance_guid", string_value("inst")),
            ("name", string_value("app")),
            ("description", string_value("application events")),
            ("enabled", bool_value(enabled)),
        ])
    };
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_en_source".to_string(),
            prior_state: encode(&state_with(true)),
            planned_state: encode(&state_with(false)),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(state.get("enabled"), Some(&bool_value(false)));
    assert_eq!(attr(&state, "type").as_deref(), Some("api"));
}

#[tokio::test]
async fn test_destinations_data_source_passes_search_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/inst/destinations"))
        .and(query_param("search", "hook"))
        .respond_with(json_response(
            200,
            serde_json::json!({
                "total_count": 1,
                "offset": 0,
                "limit": 1,
                "destinations": [{"id": "dest-1", "name": "hook", "type": "webhook"}],
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = make_state(vec![
        ("instance_guid", string_value("inst")),
        ("search_key", string_value("hook")),
    ]);
    let response = provider(&server)
        .read_data_source(ReadDataSourceRequest {
            type_name: "ibm_en_destinations".to_string(),
            config: encode(&config),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("inst"));
    assert_eq!(state.get("total_count").and_then(DynamicValue::as_i64), Some(1));
    let destinations = state.get("destinations").and_then(DynamicValue::as_list).unwrap();
    assert_eq!(attr(&destinations[0], "type").as_deref(), Some("webhook"));
}
