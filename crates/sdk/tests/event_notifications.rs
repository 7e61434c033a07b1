//! Event notifications client against a mock server

use ibmcloud_common::{Error, ErrorKind, ServiceOptions};
use ibmcloud_sdk::event_notifications::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTANCE: &str = "9xxxxx-Oxxx-4f89-8xxx-7xxxxxxxxxxx";

fn client(server: &MockServer) -> EventNotificationsV1 {
    EventNotificationsV1::new(ServiceOptions::new(DEFAULT_SERVICE_NAME).with_url(server.uri()))
        .unwrap()
}

fn destination_json() -> serde_json::Value {
    json!({
        "id": "dest-1",
        "name": "hook",
        "description": "webhook destination",
        "type": "webhook",
        "config": {"params": {"url": "https://example.com/hook", "verb": "post"}},
        "updated_at": "2024-01-01T00:00:00Z",
        "subscription_count": 0,
        "subscription_names": []
    })
}

#[tokio::test]
async fn test_create_destination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{}/destinations", INSTANCE)))
        .and(body_json(json!({
            "name": "hook",
            "type": "webhook",
            "description": "webhook destination",
            "config": {"params": {"url": "https://example.com/hook", "verb": "post"}}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(destination_json()))
        .expect(1)
        .mount(&server)
        .await;

    let options = CreateDestinationOptions::new(INSTANCE, "hook", DestinationType::Webhook)
        .with_description("webhook destination")
        .with_params(DestinationConfigParams {
            url: Some("https://example.com/hook".to_string()),
            verb: Some("post".to_string()),
            ..Default::default()
        });
    let destination = client(&server)
        .create_destination(&options)
        .await
        .unwrap()
        .into_result();

    assert_eq!(destination.id, "dest-1");
    assert_eq!(destination.destination_type, DestinationType::Webhook);
    assert_eq!(
        destination.config.unwrap().params.verb.as_deref(),
        Some("post")
    );
}

#[tokio::test]
async fn test_create_destination_validates_params_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(destination_json()))
        .expect(0)
        .mount(&server)
        .await;

    let options = CreateDestinationOptions::new(INSTANCE, "pd", DestinationType::PagerDuty);
    let err = client(&server).create_destination(&options).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_list_destinations_pages_with_offset() {
    let server = MockServer::start().await;
    let item = |id: &str| {
        json!({"id": id, "name": id, "type": "slack", "subscription_count": 0})
    };
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{}/destinations", INSTANCE)))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3, "offset": 2, "limit": 2,
            "destinations": [item("c")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{}/destinations", INSTANCE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3, "offset": 0, "limit": 2,
            "destinations": [item("a"), item("b")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let all = client(&server)
        .list_all_destinations(INSTANCE, None)
        .await
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_destination_get_update_delete_paths() {
    let server = MockServer::start().await;
    let item_path = format!("/v1/instances/{}/destinations/dest-1", INSTANCE);
    Mock::given(method("GET"))
        .and(path(item_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(destination_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(item_path.as_str()))
        .and(body_json(json!({"description": "changed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(destination_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(item_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    c.get_destination(&GetDestinationOptions::new(INSTANCE, "dest-1"))
        .await
        .unwrap();

    let mut update = UpdateDestinationOptions::new(INSTANCE, "dest-1");
    update.description = Some("changed".to_string());
    c.update_destination(&update).await.unwrap();

    c.delete_destination(&DeleteDestinationOptions::new(INSTANCE, "dest-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_topic_create_and_replace() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{}/topics", INSTANCE)))
        .and(body_json(json!({
            "name": "alerts",
            "description": "alert topic",
            "sources": [{"id": "src-1", "rules": [{"enabled": true, "event_type_filter": "$.notification_event_info.event_type == 'cert_manager'"}]}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "topic-1", "name": "alerts", "description": "alert topic",
            "created_at": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/v1/instances/{}/topics/topic-1", INSTANCE)))
        .and(body_json(json!({"name": "alerts-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "topic-1", "name": "alerts-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let created = c
        .create_topic(
            &CreateTopicOptions::new(INSTANCE, "alerts")
                .with_description("alert topic")
                .with_sources(vec![SourcesItems {
                    id: "src-1".to_string(),
                    rules: vec![Rule {
                        enabled: Some(true),
                        event_type_filter: Some(
                            "$.notification_event_info.event_type == 'cert_manager'".to_string(),
                        ),
                        ..Default::default()
                    }],
                }]),
        )
        .await
        .unwrap()
        .into_result();
    assert_eq!(created.id, "topic-1");

    let replaced = c
        .replace_topic(&ReplaceTopicOptions::new(INSTANCE, "topic-1", "alerts-2"))
        .await
        .unwrap()
        .into_result();
    assert_eq!(replaced.name, "alerts-2");
}

#[tokio::test]
async fn test_get_topic_decodes_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{}/topics/topic-1", INSTANCE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "topic-1",
            "name": "alerts",
            "source_count": 1,
            "sources": [{"id": "src-1", "name": "app", "rules": [{"enabled": false, "id": "r1"}]}],
            "subscription_count": 0,
            "subscriptions": [],
            "updated_at": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let topic = client(&server)
        .get_topic(&GetTopicOptions::new(INSTANCE, "topic-1"))
        .await
        .unwrap()
        .into_result();
    assert_eq!(topic.sources[0].rules[0].id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_subscription_update_sends_add_and_remove() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/instances/{}/subscriptions/sub-1", INSTANCE)))
        .and(body_json(json!({
            "attributes": {"add": ["new@example.com"], "remove": ["old@example.com"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub-1", "name": "mail", "destination_id": "d", "topic_id": "t",
            "destination_type": "smtp_ibm",
            "attributes": {"invited": [{"email": "new@example.com"}], "subscribed": [], "unsubscribed": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = UpdateSubscriptionOptions::new(INSTANCE, "sub-1");
    options.attributes = Some(SubscriptionAttributesPrototype {
        add: Some(vec!["new@example.com".to_string()]),
        remove: Some(vec!["old@example.com".to_string()]),
        ..Default::default()
    });
    let subscription = client(&server)
        .update_subscription(&options)
        .await
        .unwrap()
        .into_result();
    assert_eq!(
        subscription.attributes.unwrap().recipients(),
        vec!["new@example.com".to_string()]
    );
}

#[tokio::test]
async fn test_source_crud_paths() {
    let server = MockServer::start().await;
    let source = json!({
        "id": "src-1", "name": "app", "description": "my app",
        "enabled": true, "type": "api"
    });
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{}/sources", INSTANCE)))
        .and(body_json(json!({"name": "app", "description": "my app", "enabled": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(source.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/v1/instances/{}/sources/src-1", INSTANCE)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let mut create = CreateSourcesOptions::new(INSTANCE, "app", "my app");
    create.enabled = Some(true);
    let created = c.create_sources(&create).await.unwrap().into_result();
    assert!(created.enabled);
    assert_eq!(created.source_type.as_deref(), Some("api"));

    c.delete_source(&DeleteSourceOptions::new(INSTANCE, "src-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_smtp_user_paths() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{}/smtp/config/cfg-1/users", INSTANCE)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "user-1", "smtp_config_id": "cfg-1", "domain": "mail.example.com",
            "username": "u", "password": "p"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/instances/{}/smtp/config/cfg-1/users/user-1",
            INSTANCE
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1", "smtp_config_id": "cfg-1", "username": "u"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let user = c
        .create_smtp_user(&CreateSmtpUserOptions::new(INSTANCE, "cfg-1"))
        .await
        .unwrap()
        .into_result();
    assert_eq!(user.password.as_deref(), Some("p"));

    let fetched = c
        .get_smtp_user(&SmtpUserOptions::new(INSTANCE, "cfg-1", "user-1"))
        .await
        .unwrap()
        .into_result();
    assert!(fetched.password.is_none());
}

#[tokio::test]
async fn test_smtp_configuration_decodes_dns_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{}/smtp/config", INSTANCE)))
        .and(body_json(json!({"name": "mail", "domain": "mail.example.com"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "cfg-1", "name": "mail", "domain": "mail.example.com",
            "config": {
                "dkim": {"public_key": "k", "selector": "s", "verification": "PENDING"},
                "en_authorization": {"verification": "PENDING"},
                "spf": {"txt_name": "n", "txt_value": "v", "verification": "PENDING"}
            }
        })))
        .mount(&server)
        .await;

    let configuration = client(&server)
        .create_smtp_configuration(&CreateSmtpConfigurationOptions::new(
            INSTANCE,
            "mail",
            "mail.example.com",
        ))
        .await
        .unwrap()
        .into_result();
    let config = configuration.config.unwrap();
    assert_eq!(config.spf.unwrap().txt_value.as_deref(), Some("v"));
}

#[tokio::test]
async fn test_error_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{}/topics/gone", INSTANCE)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"message": "Topic not found"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{}/topics/bad", INSTANCE)))
        .respond_with(ResponseTemplate::new(200).set_body_string("} this is not valid json {"))
        .mount(&server)
        .await;

    let c = client(&server);
    let err = c
        .get_topic(&GetTopicOptions::new(INSTANCE, "gone"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = c
        .get_topic(&GetTopicOptions::new(INSTANCE, "bad"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);

    let err = c
        .get_topic(&GetTopicOptions::new("", "gone"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    c.set_service_url("").unwrap();
    let err = c
        .get_topic(&GetTopicOptions::new(INSTANCE, "gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ServiceUrlMissing));
}
