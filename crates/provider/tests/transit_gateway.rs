//! Transit gateway resources and data sources through the provider entry
//! points, against a mock service

mod common;

use common::{attr, encode, json_response, not_found, provider};
use terraform_provider_ibm::provider::{
    ApplyResourceChangeRequest, ReadDataSourceRequest, ReadResourceRequest,
};
use terraform_provider_ibm::state::{bool_value, make_state, string_value};
use terraform_provider_ibm::{DynamicValue, HostValue};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer};

fn gateway(id: &str, name: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "location": "us-south",
        "global": false,
        "status": status,
    })
}

#[tokio::test]
async fn test_read_populates_gateway_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/testString"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(json_response(
            200,
            serde_json::json!({
                "id": "ef4dcb1a-fee4-41c7-9e11-9cd99e65c1f4",
                "name": "my-transit-gateway",
                "status": "available",
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .read_resource(ReadResourceRequest {
            type_name: "ibm_tg_gateway".to_string(),
            current_state: encode(&make_state(vec![("id", string_value("testString"))])),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("testString"));
    assert_eq!(attr(&state, "name").as_deref(), Some("my-transit-gateway"));
    assert_eq!(attr(&state, "status").as_deref(), Some("available"));
}

#[tokio::test]
async fn test_read_of_missing_gateway_drops_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gone"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let response = provider(&server)
        .read_resource(ReadResourceRequest {
            type_name: "ibm_tg_gateway".to_string(),
            current_state: encode(&make_state(vec![("id", string_value("gone"))])),
        })
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.decode().unwrap().is_null());
}

#[tokio::test]
async fn test_create_waits_for_available() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transit_gateways"))
        .and(query_param("version", "2021-03-31"))
        .and(body_partial_json(serde_json::json!({"name": "gw", "location": "us-south"})))
        .respond_with(json_response(201, gateway("gw-1", "gw", "pending")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1"))
        .respond_with(json_response(200, gateway("gw-1", "gw", "pending")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1"))
        .respond_with(json_response(200, gateway("gw-1", "gw", "available")))
        .mount(&server)
        .await;

    let planned = make_state(vec![
        ("id", DynamicValue::Null),
        ("name", string_value("gw")),
        ("location", string_value("us-south")),
        ("status", DynamicValue::Null),
    ]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: HostValue::default(),
            planned_state: encode(&planned),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("gw-1"));
    assert_eq!(attr(&state, "status").as_deref(), Some("available"));
}

#[tokio::test]
async fn test_create_failure_keeps_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transit_gateways"))
        .respond_with(json_response(201, gateway("gw-2", "gw", "pending")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-2"))
        .respond_with(json_response(200, gateway("gw-2", "gw", "failed")))
        .mount(&server)
        .await;

    let planned = make_state(vec![
        ("name", string_value("gw")),
        ("location", string_value("us-south")),
    ]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: HostValue::default(),
            planned_state: encode(&planned),
        })
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Failed to create resource");
    assert!(response.diagnostics[0].detail.contains("failed"));
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("gw-2"));
}

#[tokio::test]
async fn test_update_sends_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/transit_gateways/gw-1"))
        .and(body_json(serde_json::json!({"name": "renamed"})))
        .respond_with(json_response(200, gateway("gw-1", "renamed", "available")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1"))
        .respond_with(json_response(200, gateway("gw-1", "renamed", "available")))
        .mount(&server)
        .await;

    let prior = make_state(vec![
        ("id", string_value("gw-1")),
        ("name", string_value("gw")),
        ("location", string_value("us-south")),
        ("global", bool_value(false)),
    ]);
    let planned = make_state(vec![
        ("id", string_value("gw-1")),
        ("name", string_value("renamed")),
        ("location", string_value("us-south")),
        ("global", bool_value(false)),
    ]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: encode(&prior),
            planned_state: encode(&planned),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "name").as_deref(), Some("renamed"));
}

#[tokio::test]
async fn test_delete_of_missing_gateway_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/transit_gateways/gw-1"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let prior = make_state(vec![("id", string_value("gw-1")), ("name", string_value("gw"))]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: encode(&prior),
            planned_state: HostValue::default(),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(response.new_state.decode().unwrap().is_null());
}

#[tokio::test]
async fn test_cross_account_connection_accepts_pending() {
    let server = MockServer::start().await;
    let connection = serde_json::json!({
        "id": "conn-1",
        "name": "to-vpc",
        "network_type": "vpc",
        "network_id": "crn:vpc",
        "network_account_id": "acct-2",
        "request_status": "pending",
        "status": "pending",
    });
    Mock::given(method("POST"))
        .and(path("/transit_gateways/gw-1/connections"))
        .and(body_partial_json(
            serde_json::json!({"network_type": "vpc", "network_account_id": "acct-2"}),
        ))
        .respond_with(json_response(201, connection.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1/connections/conn-1"))
        .respond_with(json_response(200, connection))
        .mount(&server)
        .await;

    let planned = make_state(vec![
        ("gateway", string_value("gw-1")),
        ("network_type", string_value("vpc")),
        ("network_id", string_value("crn:vpc")),
        ("network_account_id", string_value("acct-2")),
    ]);
    let response = provider(&server)
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_connection".to_string(),
            prior_state: HostValue::default(),
            planned_state: encode(&planned),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("gw-1/conn-1"));
    assert_eq!(attr(&state, "request_status").as_deref(), Some("pending"));
}

#[tokio::test]
async fn test_stop_cancels_pending_wait() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transit_gateways"))
        .respond_with(json_response(201, gateway("gw-3", "gw", "pending")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-3"))
        .respond_with(json_response(200, gateway("gw-3", "gw", "pending")))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider(&server);
    provider.stop_provider();
    let planned = make_state(vec![
        ("name", string_value("gw")),
        ("location", string_value("us-south")),
    ]);
    let response = provider
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: HostValue::default(),
            planned_state: encode(&planned),
        })
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("cancelled"));
}

#[tokio::test]
async fn test_gateway_data_source_finds_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways"))
        .respond_with(json_response(
            200,
            serde_json::json!({"transit_gateways": [
                gateway("gw-1", "first", "available"),
                gateway("gw-2", "second", "available"),
            ]}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-2/connections"))
        .respond_with(json_response(
            200,
            serde_json::json!({"connections": [
                {"id": "conn-1", "name": "c", "network_type": "classic", "status": "attached"}
            ]}),
        ))
        .mount(&server)
        .await;

    let response = provider(&server)
        .read_data_source(ReadDataSourceRequest {
            type_name: "ibm_tg_gateway".to_string(),
            config: encode(&make_state(vec![("name", string_value("second"))])),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state.decode().unwrap();
    assert_eq!(attr(&state, "id").as_deref(), Some("gw-2"));
    let connections = state.get("connections").and_then(DynamicValue::as_list).unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(attr(&connections[0], "status").as_deref(), Some("attached"));
}

#[tokio::test]
async fn test_gateway_data_source_reports_unknown_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transit_gateways"))
        .respond_with(json_response(200, serde_json::json!({"transit_gateways": []})))
        .mount(&server)
        .await;

    let response = provider(&server)
        .read_data_source(ReadDataSourceRequest {
            type_name: "ibm_tg_gateway".to_string(),
            config: encode(&make_state(vec![("name", string_value("nope"))])),
        })
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("no transit gateway named 'nope'"));
}

#[tokio::test]
async fn test_locations_data_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(json_response(
            200,
            serde_json::json!({"locations": [
                {"billing_location": "us", "name": "us-south", "type": "region"}
            ]}),
        ))
        .mount(&server)
        .await;

    let response = provider(&server)
        .read_data_source(ReadDataSourceRequest {
            type_name: "ibm_tg_locations".to_string(),
            config: encode(&DynamicValue::Map(Default::default())),
        })
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state.decode().unwrap();
    let locations = state.get("locations").and_then(DynamicValue::as_list).unwrap();
    assert_eq!(attr(&locations[0], "type").as_deref(), Some("region"));
}
