//! Event notifications destinations, one resource type per destination kind.
//!
//! ID is `<instance_guid>/<destination_id>`. Parameters live under
//! `config[0].params[0]`; credentials the service redacts on read are kept
//! from configuration.

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::event_notifications::{
    CreateDestinationOptions, DeleteDestinationOptions, Destination, DestinationConfig,
    DestinationConfigParams, DestinationType, GetDestinationOptions, UpdateDestinationOptions,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::diagnostics::Diagnostic;
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{
    int_value, optional_string_value, string_list_value, string_value, DynamicValue, ResourceData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    Webhook,
    Slack,
    MsTeams,
    PagerDuty,
    ServiceNow,
    CodeEngine,
    CloudObjectStorage,
    Android,
}

impl DestinationKind {
    pub const ALL: [DestinationKind; 8] = [
        DestinationKind::Webhook,
        DestinationKind::Slack,
        DestinationKind::MsTeams,
        DestinationKind::PagerDuty,
        DestinationKind::ServiceNow,
        DestinationKind::CodeEngine,
        DestinationKind::CloudObjectStorage,
        DestinationKind::Android,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            DestinationKind::Webhook => "ibm_en_destination_webhook",
            DestinationKind::Slack => "ibm_en_destination_slack",
            DestinationKind::MsTeams => "ibm_en_destination_msteams",
            DestinationKind::PagerDuty => "ibm_en_destination_pagerduty",
            DestinationKind::ServiceNow => "ibm_en_destination_sn",
            DestinationKind::CodeEngine => "ibm_en_destination_ce",
            DestinationKind::CloudObjectStorage => "ibm_en_destination_cos",
            DestinationKind::Android => "ibm_en_destination_android",
        }
    }

    pub fn destination_type(&self) -> DestinationType {
        match self {
            DestinationKind::Webhook => DestinationType::Webhook,
            DestinationKind::Slack => DestinationType::Slack,
            DestinationKind::MsTeams => DestinationType::MsTeams,
            DestinationKind::PagerDuty => DestinationType::PagerDuty,
            DestinationKind::ServiceNow => DestinationType::ServiceNow,
            DestinationKind::CodeEngine => DestinationType::CodeEngine,
            DestinationKind::CloudObjectStorage => DestinationType::CloudObjectStorage,
            DestinationKind::Android => DestinationType::PushAndroid,
        }
    }

    fn params(&self) -> Vec<Attribute> {
        use AttributeType::String as Str;
        match self {
            DestinationKind::Webhook => vec![
                Attribute::required("url", Str),
                Attribute::required("verb", Str).one_of(&["get", "post"]),
                Attribute::optional("custom_headers", AttributeType::map_of(Str)),
                Attribute::optional("sensitive_headers", AttributeType::list_of(Str)),
            ],
            DestinationKind::Slack | DestinationKind::MsTeams | DestinationKind::CodeEngine => {
                vec![Attribute::required("url", Str)]
            }
            DestinationKind::PagerDuty => vec![
                Attribute::required("api_key", Str).sensitive(),
                Attribute::required("routing_key", Str).sensitive(),
            ],
            DestinationKind::ServiceNow => vec![
                Attribute::required("client_id", Str),
                Attribute::required("client_secret", Str).sensitive(),
                Attribute::required("username", Str),
                Attribute::required("password", Str).sensitive(),
                Attribute::required("instance_name", Str),
            ],
            DestinationKind::CloudObjectStorage => vec![
                Attribute::required("bucket_name", Str),
                Attribute::required("instance_id", Str),
                Attribute::required("endpoint", Str),
            ],
            DestinationKind::Android => vec![
                Attribute::required("sender_id", Str),
                Attribute::required("server_key", Str).sensitive(),
                Attribute::optional("pre_prod", AttributeType::Bool),
            ],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigBlock {
    #[serde(default)]
    params: Vec<DestinationConfigParams>,
}

#[derive(Debug, Deserialize)]
struct DestinationSettings {
    instance_guid: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    config: Vec<ConfigBlock>,
}

impl DestinationSettings {
    fn params(&self) -> Option<DestinationConfigParams> {
        self.config
            .first()
            .and_then(|c| c.params.first())
            .cloned()
    }
}

/// Computed attributes shared with the destination data source
pub(crate) fn destination_to_state(data: &mut ResourceData, destination: &Destination) -> Result<()> {
    data.set("destination_id", string_value(&destination.id));
    data.set("name", string_value(&destination.name));
    data.set(
        "description",
        optional_string_value(destination.description.as_deref()),
    );
    data.set("type", string_value(destination.destination_type.as_str()));
    data.set(
        "updated_at",
        optional_string_value(destination.updated_at.as_deref()),
    );
    data.set(
        "subscription_count",
        int_value(destination.subscription_count.unwrap_or(0)),
    );
    data.set(
        "subscription_names",
        string_list_value(&destination.subscription_names),
    );

    // Imported destinations have no configured params to preserve.
    let unset = data.get("config").map(DynamicValue::is_null).unwrap_or(true);
    if unset {
        if let Some(config) = &destination.config {
            data.set_encoded(
                "config",
                &vec![ConfigBlock {
                    params: vec![config.params.clone()],
                }],
            )?;
        }
    }
    Ok(())
}

pub struct DestinationResource {
    kind: DestinationKind,
}

impl DestinationResource {
    pub fn new(kind: DestinationKind) -> Self {
        Self { kind }
    }

    fn split(&self, data: &ResourceData) -> Result<[String; 2]> {
        split_id::<2>(data.require_id()?)
    }
}

#[async_trait]
impl Resource for DestinationResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Schema {
        let params = AttributeType::list_of(AttributeType::Object(vec![Attribute::required(
            "params",
            AttributeType::list_of(AttributeType::Object(self.kind.params())),
        )]));
        Schema::new("Event notifications destination")
            .attribute(
                Attribute::required("instance_guid", AttributeType::String)
                    .force_new()
                    .describe("Event notifications instance GUID"),
            )
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(Attribute::optional("config", params))
            .attribute(Attribute::computed("type", AttributeType::String))
            .attribute(Attribute::computed("destination_id", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
            .attribute(Attribute::computed("subscription_count", AttributeType::Number))
            .attribute(Attribute::computed(
                "subscription_names",
                AttributeType::list_of(AttributeType::String),
            ))
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let settings: DestinationSettings = match config.decode() {
            Ok(s) => s,
            // Type errors are reported by the schema.
            Err(_) => return Vec::new(),
        };
        let params = settings.params().unwrap_or_default();
        match params.validate_for(self.kind.destination_type()) {
            Ok(()) => Vec::new(),
            Err(e) => vec![Diagnostic::error("Invalid destination config", e.to_string())
                .with_attribute("config")],
        }
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let settings: DestinationSettings = data.config_as()?;
        let mut options = CreateDestinationOptions::new(
            &settings.instance_guid,
            &settings.name,
            self.kind.destination_type(),
        );
        if let Some(description) = settings.description.as_deref() {
            options = options.with_description(description);
        }
        if let Some(params) = settings.params() {
            options = options.with_params(params);
        }

        let destination = meta
            .event_notifications
            .create_destination(&options)
            .await?
            .into_result();
        info!(
            resource_type = self.type_name(),
            id = %destination.id,
            "Created destination"
        );
        data.set_id(join_id(&[settings.instance_guid.as_str(), destination.id.as_str()]));
        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, id] = self.split(data)?;
        let lookup = meta
            .event_notifications
            .get_destination(&GetDestinationOptions::new(&instance, &id))
            .await;
        match found(lookup)? {
            Some(destination) => {
                data.set("instance_guid", string_value(&instance));
                destination_to_state(data, &destination)
            }
            None => {
                gone(data, self.type_name());
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let settings: DestinationSettings = data.config_as()?;
        let [instance, id] = self.split(data)?;

        let mut options = UpdateDestinationOptions::new(&instance, &id);
        if data.has_change("name") {
            options.name = Some(settings.name.clone());
        }
        if data.has_change("description") {
            options.description = Some(settings.description.clone().unwrap_or_default());
        }
        if data.has_change("config") {
            let params = settings.params().unwrap_or_default();
            params.validate_for(self.kind.destination_type())?;
            options.config = Some(DestinationConfig { params });
        }

        if options.name.is_some() || options.description.is_some() || options.config.is_some() {
            meta.event_notifications.update_destination(&options).await?;
            info!(resource_type = self.type_name(), id = %id, "Updated destination");
        }
        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, id] = self.split(data)?;
        deleted(
            meta.event_notifications
                .delete_destination(&DeleteDestinationOptions::new(&instance, &id))
                .await,
        )?;
        info!(resource_type = self.type_name(), id = %id, "Deleted destination");
        data.clear_id();
        Ok(())
    }

    async fn exists(
        &self,
        _ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool> {
        let [instance, id] = self.split(data)?;
        let lookup = meta
            .event_notifications
            .get_destination(&GetDestinationOptions::new(&instance, &id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{make_state, string_value};

    fn webhook_config(verb: &str) -> DynamicValue {
        make_state(vec![
            ("instance_guid", string_value("instance")),
            ("name", string_value("hook")),
            (
                "config",
                DynamicValue::List(vec![make_state(vec![(
                    "params",
                    DynamicValue::List(vec![make_state(vec![
                        ("url", string_value("https://example.com/hook")),
                        ("verb", string_value(verb)),
                    ])]),
                )])]),
            ),
        ])
    }

    #[test]
    fn test_every_kind_has_a_distinct_type_name() {
        let mut names: Vec<&str> = DestinationKind::ALL.iter().map(|k| k.type_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DestinationKind::ALL.len());
    }

    #[test]
    fn test_webhook_config_passes_schema_and_params_check() {
        let resource = DestinationResource::new(DestinationKind::Webhook);
        let config = webhook_config("post");
        assert!(resource.schema().validate(&config).is_empty());
        assert!(resource.validate(&config).is_empty());
    }

    #[test]
    fn test_pagerduty_without_keys_is_rejected() {
        let resource = DestinationResource::new(DestinationKind::PagerDuty);
        let config = make_state(vec![
            ("instance_guid", string_value("instance")),
            ("name", string_value("pd")),
        ]);
        let diags = resource.validate(&config);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("api_key"));
    }

    #[test]
    fn test_bad_verb_is_rejected() {
        let resource = DestinationResource::new(DestinationKind::Webhook);
        assert!(!resource.validate(&webhook_config("put")).is_empty());
    }
}
