//! Helpers shared by the provider integration tests
#![allow(dead_code)]

use terraform_provider_ibm::config::{EndpointsConfig, PollingConfig};
use terraform_provider_ibm::telemetry;
use terraform_provider_ibm::{DynamicValue, HostValue, IbmProvider, ProviderConfig};
use wiremock::{MockServer, ResponseTemplate};

/// Configuration pointing every service at `server`, polling without delay
pub fn test_config(server: &MockServer) -> ProviderConfig {
    telemetry::init_tracing();
    ProviderConfig {
        iam_token: Some("test-token".to_string()),
        endpoints: EndpointsConfig {
            transit_gateway: Some(server.uri()),
            event_notifications: Some(server.uri()),
            lbaas: Some(server.uri()),
        },
        polling: PollingConfig {
            provisioning_interval_secs: 0,
            provisioning_attempts: 3,
            teardown_interval_secs: 0,
            teardown_attempts: 3,
        },
        ..Default::default()
    }
}

pub fn provider(server: &MockServer) -> IbmProvider {
    IbmProvider::with_config(test_config(server)).unwrap()
}

pub fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

pub fn not_found() -> ResponseTemplate {
    json_response(404, serde_json::json!({"errors": [{"message": "not found"}]}))
}

pub fn encode(value: &DynamicValue) -> HostValue {
    HostValue::encode(value).unwrap()
}

pub fn attr(state: &DynamicValue, key: &str) -> Option<String> {
    state.get(key).and_then(DynamicValue::as_string).map(str::to_string)
}
