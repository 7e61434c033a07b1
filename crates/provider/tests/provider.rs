//! Provider configuration and value encoding at the host boundary

mod common;

use common::{attr, json_response, provider, test_config};
use terraform_provider_ibm::provider::{ConfigureProviderRequest, ReadResourceRequest};
use terraform_provider_ibm::state::{make_state, string_value};
use terraform_provider_ibm::{HostValue, IbmProvider};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer};

async fn mount_gateway(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/transit_gateways/gw-1"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(json_response(
            200,
            serde_json::json!({"id": "gw-1", "name": "gw", "status": "available"}),
        ))
        .expect(1)
        .mount(server)
        .await;
}

fn read_gateway(current_state: HostValue) -> ReadResourceRequest {
    ReadResourceRequest {
        type_name: "ibm_tg_gateway".to_string(),
        current_state,
    }
}

#[tokio::test]
async fn test_configure_from_file_then_block() {
    let server = MockServer::start().await;
    mount_gateway(&server, "block-token").await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("provider.toml");
    let mut from_file = test_config(&server);
    from_file.iam_token = Some("file-token".to_string());
    from_file.save(&file).unwrap();

    let provider = IbmProvider::new();
    let block = make_state(vec![
        ("config_file", string_value(file.to_string_lossy())),
        ("iam_token", string_value("block-token")),
    ]);
    let diagnostics = provider
        .configure_provider(ConfigureProviderRequest {
            config: HostValue::encode(&block).unwrap(),
        })
        .await;
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let state = make_state(vec![("id", string_value("gw-1"))]);
    let response = provider
        .read_resource(read_gateway(HostValue::encode(&state).unwrap()))
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "name").as_deref(), Some("gw"));
}

#[tokio::test]
async fn test_unreadable_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("provider.toml");
    std::fs::write(&file, "polling = \"often\"").unwrap();

    let block = make_state(vec![("config_file", string_value(file.to_string_lossy()))]);
    let diagnostics = IbmProvider::new()
        .configure_provider(ConfigureProviderRequest {
            config: HostValue::encode(&block).unwrap(),
        })
        .await;

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].summary, "Invalid config file");
    assert_eq!(diagnostics[0].attribute.as_deref(), Some("config_file"));
}

#[tokio::test]
async fn test_json_encoded_state_is_accepted() {
    let server = MockServer::start().await;
    mount_gateway(&server, "test-token").await;

    let state = make_state(vec![("id", string_value("gw-1"))]);
    let response = provider(&server)
        .read_resource(read_gateway(HostValue::encode_json(&state).unwrap()))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state.decode().unwrap();
    assert_eq!(attr(&state, "status").as_deref(), Some("available"));
}

#[tokio::test]
async fn test_garbage_state_is_rejected() {
    let server = MockServer::start().await;
    let response = provider(&server)
        .read_resource(read_gateway(HostValue {
            msgpack: vec![0xc1],
            json: Vec::new(),
        }))
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Invalid value");
}
