//! Event notifications lookups: listings are scoped to an instance and may be
//! narrowed with `search_key`.

use async_trait::async_trait;
use ibmcloud_common::{join_id, Result};
use ibmcloud_sdk::event_notifications::{GetSourceOptions, GetTopicOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::DataSource;
use crate::meta::ProviderMeta;
use crate::resources::en_source::source_to_state;
use crate::resources::en_topic::{source_attributes, subscription_summary_attributes, topic_to_state};
use crate::resources::OperationContext;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{int_value, string_value, ResourceData};

pub const DESTINATIONS_TYPE_NAME: &str = "ibm_en_destinations";
pub const TOPIC_TYPE_NAME: &str = "ibm_en_topic";
pub const TOPICS_TYPE_NAME: &str = "ibm_en_topics";
pub const SUBSCRIPTIONS_TYPE_NAME: &str = "ibm_en_subscriptions";
pub const SOURCE_TYPE_NAME: &str = "ibm_en_source";

#[derive(Debug, Deserialize)]
struct Listing {
    instance_guid: String,
    #[serde(default)]
    search_key: Option<String>,
}

fn listing_schema(description: &str, collection: &str, fields: Vec<Attribute>) -> Schema {
    Schema::new(description)
        .attribute(Attribute::required("instance_guid", AttributeType::String))
        .attribute(Attribute::optional("search_key", AttributeType::String))
        .attribute(Attribute::computed("total_count", AttributeType::Number))
        .attribute(Attribute::computed(
            collection,
            AttributeType::list_of(AttributeType::Object(fields)),
        ))
}

fn store_listing<T: Serialize>(
    data: &mut ResourceData,
    listing: &Listing,
    collection: &str,
    items: Vec<T>,
) -> Result<()> {
    data.set_id(listing.instance_guid.clone());
    data.set("total_count", int_value(items.len() as i64));
    data.set_encoded(collection, &items)
}

pub struct DestinationsDataSource;

#[async_trait]
impl DataSource for DestinationsDataSource {
    fn type_name(&self) -> &'static str {
        DESTINATIONS_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::{Number, String as Str};
        listing_schema(
            "List destinations of an event notifications instance",
            "destinations",
            vec![
                Attribute::computed("id", Str),
                Attribute::computed("name", Str),
                Attribute::computed("description", Str),
                Attribute::computed("type", Str),
                Attribute::computed("subscription_count", Number),
                Attribute::computed("subscription_names", AttributeType::list_of(Str)),
                Attribute::computed("updated_at", Str),
            ],
        )
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let listing: Listing = data.config_as()?;
        let destinations = meta
            .event_notifications
            .list_all_destinations(&listing.instance_guid, listing.search_key.as_deref())
            .await?;
        let items: Vec<serde_json::Value> = destinations
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "name": d.name,
                    "description": d.description,
                    "type": d.destination_type.as_str(),
                    "subscription_count": d.subscription_count.unwrap_or(0),
                    "subscription_names": d.subscription_names,
                    "updated_at": d.updated_at,
                })
            })
            .collect();
        store_listing(data, &listing, "destinations", items)
    }
}

pub struct TopicsDataSource;

#[async_trait]
impl DataSource for TopicsDataSource {
    fn type_name(&self) -> &'static str {
        TOPICS_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::{Number, String as Str};
        listing_schema(
            "List topics of an event notifications instance",
            "topics",
            vec![
                Attribute::computed("id", Str),
                Attribute::computed("name", Str),
                Attribute::computed("description", Str),
                Attribute::computed("source_count", Number),
                Attribute::computed("sources_names", AttributeType::list_of(Str)),
                Attribute::computed("subscription_count", Number),
            ],
        )
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let listing: Listing = data.config_as()?;
        let topics = meta
            .event_notifications
            .list_all_topics(&listing.instance_guid, listing.search_key.as_deref())
            .await?;
        let items: Vec<serde_json::Value> = topics
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "name": t.name,
                    "description": t.description,
                    "source_count": t.source_count.unwrap_or(0),
                    "sources_names": t.sources_names,
                    "subscription_count": t.subscription_count.unwrap_or(0),
                })
            })
            .collect();
        store_listing(data, &listing, "topics", items)
    }
}

pub struct SubscriptionsDataSource;

#[async_trait]
impl DataSource for SubscriptionsDataSource {
    fn type_name(&self) -> &'static str {
        SUBSCRIPTIONS_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::String as Str;
        listing_schema(
            "List subscriptions of an event notifications instance",
            "subscriptions",
            vec![
                Attribute::computed("id", Str),
                Attribute::computed("name", Str),
                Attribute::computed("description", Str),
                Attribute::computed("destination_id", Str),
                Attribute::computed("destination_name", Str),
                Attribute::computed("destination_type", Str),
                Attribute::computed("topic_id", Str),
                Attribute::computed("topic_name", Str),
                Attribute::computed("updated_at", Str),
            ],
        )
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let listing: Listing = data.config_as()?;
        let subscriptions = meta
            .event_notifications
            .list_all_subscriptions(&listing.instance_guid, listing.search_key.as_deref())
            .await?;
        store_listing(data, &listing, "subscriptions", subscriptions)
    }
}

#[derive(Debug, Deserialize)]
struct TopicLookup {
    instance_guid: String,
    topic_id: String,
}

pub struct TopicDataSource;

#[async_trait]
impl DataSource for TopicDataSource {
    fn type_name(&self) -> &'static str {
        TOPIC_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Look up a topic")
            .attribute(Attribute::required("instance_guid", AttributeType::String))
            .attribute(Attribute::required("topic_id", AttributeType::String))
            .attribute(Attribute::computed("name", AttributeType::String))
            .attribute(Attribute::computed("description", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
            .attribute(Attribute::computed("source_count", AttributeType::Number))
            .attribute(Attribute::computed("sources", source_attributes()))
            .attribute(Attribute::computed("subscription_count", AttributeType::Number))
            .attribute(Attribute::computed(
                "subscriptions",
                subscription_summary_attributes(),
            ))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let lookup: TopicLookup = data.config_as()?;
        let topic = meta
            .event_notifications
            .get_topic(&GetTopicOptions::new(&lookup.instance_guid, &lookup.topic_id))
            .await?
            .into_result();
        data.set_id(join_id(&[lookup.instance_guid.as_str(), topic.id.as_str()]));
        data.set("instance_guid", string_value(&lookup.instance_guid));
        topic_to_state(data, &topic)
    }
}

#[derive(Debug, Deserialize)]
struct SourceLookup {
    instance_guid: String,
    source_id: String,
}

pub struct SourceDataSource;

#[async_trait]
impl DataSource for SourceDataSource {
    fn type_name(&self) -> &'static str {
        SOURCE_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::{Bool, Number, String as Str};
        Schema::new("Look up an API source")
            .attribute(Attribute::required("instance_guid", Str))
            .attribute(Attribute::required("source_id", Str))
            .attribute(Attribute::computed("name", Str))
            .attribute(Attribute::computed("description", Str))
            .attribute(Attribute::computed("enabled", Bool))
            .attribute(Attribute::computed("type", Str))
            .attribute(Attribute::computed("topic_count", Number))
            .attribute(Attribute::computed("topic_names", AttributeType::list_of(Str)))
            .attribute(Attribute::computed("created_at", Str))
            .attribute(Attribute::computed("updated_at", Str))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let lookup: SourceLookup = data.config_as()?;
        let source = meta
            .event_notifications
            .get_source(&GetSourceOptions::new(&lookup.instance_guid, &lookup.source_id))
            .await?
            .into_result();
        data.set_id(join_id(&[lookup.instance_guid.as_str(), source.id.as_str()]));
        data.set("instance_guid", string_value(&lookup.instance_guid));
        source_to_state(data, &source);
        Ok(())
    }
}
