//! API source registered with an event notifications instance

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::event_notifications::{
    CreateSourcesOptions, DeleteSourceOptions, GetSourceOptions, Source, UpdateSourceOptions,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{
    bool_value, int_value, optional_string_value, string_list_value, string_value, ResourceData,
};

pub const TYPE_NAME: &str = "ibm_en_source";

#[derive(Debug, Deserialize)]
struct SourceConfig {
    instance_guid: String,
    name: String,
    description: String,
    #[serde(default)]
    enabled: Option<bool>,
}

pub(crate) fn source_to_state(data: &mut ResourceData, source: &Source) {
    data.set("source_id", string_value(&source.id));
    data.set("name", string_value(&source.name));
    data.set(
        "description",
        optional_string_value(source.description.as_deref()),
    );
    data.set("enabled", bool_value(source.enabled));
    data.set("type", optional_string_value(source.source_type.as_deref()));
    data.set("topic_count", int_value(source.topic_count.unwrap_or(0)));
    data.set("topic_names", string_list_value(&source.topic_names));
    data.set("created_at", optional_string_value(source.created_at.as_deref()));
    data.set("updated_at", optional_string_value(source.updated_at.as_deref()));
}

pub struct SourceResource;

#[async_trait]
impl Resource for SourceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("API source for an event notifications instance")
            .attribute(Attribute::required("instance_guid", AttributeType::String).force_new())
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(Attribute::required("description", AttributeType::String))
            .attribute(Attribute::optional_computed("enabled", AttributeType::Bool))
            .attribute(Attribute::computed("source_id", AttributeType::String))
            .attribute(Attribute::computed("type", AttributeType::String))
            .attribute(Attribute::computed("topic_count", AttributeType::Number))
            .attribute(Attribute::computed(
                "topic_names",
                AttributeType::list_of(AttributeType::String),
            ))
            .attribute(Attribute::computed("created_at", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: SourceConfig = data.config_as()?;
        let mut options =
            CreateSourcesOptions::new(&config.instance_guid, &config.name, &config.description);
        options.enabled = config.enabled;

        let source = meta
            .event_notifications
            .create_sources(&options)
            .await?
            .into_result();
        info!(id = %source.id, name = %source.name, "Created source");
        data.set_id(join_id(&[config.instance_guid.as_str(), source.id.as_str()]));
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
            .get_source(&GetSourceOptions::new(&instance, &id))
            .await;
        match found(lookup)? {
            Some(source) => {
                data.set("instance_guid", string_value(&instance));
                source_to_state(data, &source);
            }
            None => gone(data, TYPE_NAME),
        }
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: SourceConfig = data.config_as()?;
        let [instance, id] = split_id::<2>(data.require_id()?)?;

        let mut options = UpdateSourceOptions::new(&instance, &id);
        if data.has_change("name") {
            options.name = Some(config.name);
        }
        if data.has_change("description") {
            options.description = Some(config.description);
        }
        if data.has_change("enabled") {
            options.enabled = config.enabled;
        }
        if options.name.is_some() || options.description.is_some() || options.enabled.is_some() {
            meta.event_notifications.update_source(&options).await?;
            info!(id = %id, "Updated source");
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
                .delete_source(&DeleteSourceOptions::new(&instance, &id))
                .await,
        )?;
        info!(id = %id, "Deleted source");
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
            .get_source(&GetSourceOptions::new(&instance, &id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}
