//! Event notifications topic resource

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::event_notifications::{
    CreateTopicOptions, DeleteTopicOptions, GetTopicOptions, ReplaceTopicOptions, Rule,
    SourcesItems, Topic,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{int_value, optional_string_value, string_value, DynamicValue, ResourceData};

pub const TYPE_NAME: &str = "ibm_en_topic";

#[derive(Debug, Deserialize)]
struct TopicConfig {
    instance_guid: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sources: Vec<SourceConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceConfig {
    id: String,
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleConfig {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_type_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notification_filter: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl From<&SourceConfig> for SourcesItems {
    fn from(source: &SourceConfig) -> Self {
        SourcesItems {
            id: source.id.clone(),
            rules: source
                .rules
                .iter()
                .map(|r| Rule {
                    enabled: Some(r.enabled),
                    event_type_filter: r.event_type_filter.clone(),
                    notification_filter: r.notification_filter.clone(),
                    ..Default::default()
                })
                .collect(),
        }
    }
}

pub(crate) fn source_attributes() -> AttributeType {
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::required("id", AttributeType::String),
        Attribute::optional(
            "rules",
            AttributeType::list_of(AttributeType::Object(vec![
                Attribute::optional("enabled", AttributeType::Bool),
                Attribute::optional("event_type_filter", AttributeType::String),
                Attribute::optional("notification_filter", AttributeType::String),
            ])),
        ),
    ]))
}

pub(crate) fn subscription_summary_attributes() -> AttributeType {
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::computed("id", AttributeType::String),
        Attribute::computed("name", AttributeType::String),
        Attribute::computed("description", AttributeType::String),
        Attribute::computed("destination_id", AttributeType::String),
        Attribute::computed("destination_type", AttributeType::String),
    ]))
}

/// Copy a topic into state; `sources` are only taken from the service when
/// the configuration has none (import, data source)
pub(crate) fn topic_to_state(data: &mut ResourceData, topic: &Topic) -> Result<()> {
    data.set("topic_id", string_value(&topic.id));
    data.set("name", string_value(&topic.name));
    data.set("description", optional_string_value(topic.description.as_deref()));
    data.set("updated_at", optional_string_value(topic.updated_at.as_deref()));
    data.set("source_count", int_value(topic.source_count.unwrap_or(0)));
    data.set(
        "subscription_count",
        int_value(topic.subscription_count.unwrap_or(0)),
    );
    data.set_encoded("subscriptions", &topic.subscriptions)?;

    let unset = data.get("sources").map(DynamicValue::is_null).unwrap_or(true);
    if unset {
        let sources: Vec<SourceConfig> = topic
            .sources
            .iter()
            .map(|s| SourceConfig {
                id: s.id.clone(),
                rules: s
                    .rules
                    .iter()
                    .map(|r| RuleConfig {
                        enabled: r.enabled.unwrap_or(true),
                        event_type_filter: r.event_type_filter.clone(),
                        notification_filter: r.notification_filter.clone(),
                    })
                    .collect(),
            })
            .collect();
        data.set_encoded("sources", &sources)?;
    }
    Ok(())
}

pub struct TopicResource;

#[async_trait]
impl Resource for TopicResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Event notifications topic")
            .attribute(Attribute::required("instance_guid", AttributeType::String).force_new())
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(
                Attribute::optional("sources", source_attributes())
                    .describe("Sources whose events this topic accepts, with filter rules"),
            )
            .attribute(Attribute::computed("topic_id", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
            .attribute(Attribute::computed("source_count", AttributeType::Number))
            .attribute(Attribute::computed("subscription_count", AttributeType::Number))
            .attribute(Attribute::computed(
                "subscriptions",
                subscription_summary_attributes(),
            ))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: TopicConfig = data.config_as()?;
        let mut options = CreateTopicOptions::new(&config.instance_guid, &config.name)
            .with_sources(config.sources.iter().map(SourcesItems::from).collect());
        if let Some(description) = config.description.as_deref() {
            options = options.with_description(description);
        }

        let topic = meta
            .event_notifications
            .create_topic(&options)
            .await?
            .into_result();
        info!(id = %topic.id, name = %topic.name, "Created topic");
        data.set_id(join_id(&[config.instance_guid.as_str(), topic.id.as_str()]));
        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, id] = split_id::<2>(data.require_id()?)?;
        let lookup = meta
            .event_notifications
            .get_topic(&GetTopicOptions::new(&instance, &id))
            .await;
        match found(lookup)? {
            Some(topic) => {
                data.set("instance_guid", string_value(&instance));
                topic_to_state(data, &topic)
            }
            None => {
                gone(data, TYPE_NAME);
                Ok(())
            }
        }
    }

    /// Topics are replaced wholesale, so any change sends the full definition
    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let changed = ["name", "description", "sources"]
            .iter()
            .any(|key| data.has_change(key));
        if changed {
            let config: TopicConfig = data.config_as()?;
            let [instance, id] = split_id::<2>(data.require_id()?)?;
            let mut options = ReplaceTopicOptions::new(&instance, &id, &config.name);
            options.description = config.description.clone();
            options.sources = config.sources.iter().map(SourcesItems::from).collect();
            meta.event_notifications.replace_topic(&options).await?;
            info!(id = %id, "Replaced topic");
        }
        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, id] = split_id::<2>(data.require_id()?)?;
        deleted(
            meta.event_notifications
                .delete_topic(&DeleteTopicOptions::new(&instance, &id))
                .await,
        )?;
        info!(id = %id, "Deleted topic");
        data.clear_id();
        Ok(())
    }

    async fn exists(
        &self,
        _ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool> {
        let [instance, id] = split_id::<2>(data.require_id()?)?;
        let lookup = meta
            .event_notifications
            .get_topic(&GetTopicOptions::new(&instance, &id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}
