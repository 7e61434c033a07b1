//! Event notifications subscriptions, one resource type per destination kind.
//!
//! ID is `<instance_guid>/<subscription_id>`. Email and SMS subscriptions
//! carry an invitee list; on update the service expects the difference
//! (`add`/`remove`) rather than the new list.

use std::collections::BTreeSet;

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::event_notifications::{
    CreateSubscriptionOptions, DeleteSubscriptionOptions, GetSubscriptionOptions, Subscription,
    SubscriptionAttributesPrototype, UpdateSubscriptionOptions,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{optional_string_value, string_value, DynamicValue, ResourceData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    Email,
    Sms,
    Webhook,
    Slack,
    Android,
    MsTeams,
    PagerDuty,
    ServiceNow,
    CodeEngine,
    CloudObjectStorage,
}

impl SubscriptionKind {
    pub const ALL: [SubscriptionKind; 10] = [
        SubscriptionKind::Email,
        SubscriptionKind::Sms,
        SubscriptionKind::Webhook,
        SubscriptionKind::Slack,
        SubscriptionKind::Android,
        SubscriptionKind::MsTeams,
        SubscriptionKind::PagerDuty,
        SubscriptionKind::ServiceNow,
        SubscriptionKind::CodeEngine,
        SubscriptionKind::CloudObjectStorage,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            SubscriptionKind::Email => "ibm_en_subscription_email",
            SubscriptionKind::Sms => "ibm_en_subscription_sms",
            SubscriptionKind::Webhook => "ibm_en_subscription_webhook",
            SubscriptionKind::Slack => "ibm_en_subscription_slack",
            SubscriptionKind::Android => "ibm_en_subscription_android",
            SubscriptionKind::MsTeams => "ibm_en_subscription_msteams",
            SubscriptionKind::PagerDuty => "ibm_en_subscription_pagerduty",
            SubscriptionKind::ServiceNow => "ibm_en_subscription_sn",
            SubscriptionKind::CodeEngine => "ibm_en_subscription_ce",
            SubscriptionKind::CloudObjectStorage => "ibm_en_subscription_cos",
        }
    }

    fn has_recipients(&self) -> bool {
        matches!(self, SubscriptionKind::Email | SubscriptionKind::Sms)
    }

    /// Fields of the `attributes` block; `None` when the kind has none
    fn attribute_fields(&self) -> Option<Vec<Attribute>> {
        use AttributeType::String as Str;
        let invited = Attribute::required("invited", AttributeType::list_of(Str))
            .describe("Recipients to invite");
        match self {
            SubscriptionKind::Email => Some(vec![
                invited,
                Attribute::optional("add_notification_payload", AttributeType::Bool),
                Attribute::optional("reply_to_mail", Str),
                Attribute::optional("reply_to_name", Str),
                Attribute::optional("from_name", Str),
                Attribute::optional("from_email", Str),
            ]),
            SubscriptionKind::Sms => Some(vec![invited]),
            SubscriptionKind::Webhook => {
                Some(vec![Attribute::required("signing_enabled", AttributeType::Bool)])
            }
            SubscriptionKind::Slack => Some(vec![Attribute::optional("attachment_color", Str)]),
            SubscriptionKind::ServiceNow => Some(vec![
                Attribute::optional("assigned_to", Str),
                Attribute::optional("assignment_group", Str),
            ]),
            SubscriptionKind::Android
            | SubscriptionKind::MsTeams
            | SubscriptionKind::PagerDuty
            | SubscriptionKind::CodeEngine
            | SubscriptionKind::CloudObjectStorage => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct AttributesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invited: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    add_notification_payload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_to_mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attachment_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignment_group: Option<String>,
}

impl AttributesConfig {
    fn to_prototype(&self) -> SubscriptionAttributesPrototype {
        SubscriptionAttributesPrototype {
            invited: self.invited.clone(),
            add_notification_payload: self.add_notification_payload,
            reply_to_mail: self.reply_to_mail.clone(),
            reply_to_name: self.reply_to_name.clone(),
            from_name: self.from_name.clone(),
            from_email: self.from_email.clone(),
            signing_enabled: self.signing_enabled,
            attachment_color: self.attachment_color.clone(),
            assigned_to: self.assigned_to.clone(),
            assignment_group: self.assignment_group.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionSettings {
    instance_guid: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    destination_id: String,
    topic_id: String,
    #[serde(default)]
    attributes: Vec<AttributesConfig>,
}

fn first_attributes(value: &DynamicValue) -> Option<AttributesConfig> {
    let blocks: Vec<AttributesConfig> = value.decode().ok()?;
    blocks.into_iter().next()
}

/// Invitees to add and to remove going from `old` to `new`
pub(crate) fn recipient_diff(old: &[String], new: &[String]) -> (Vec<String>, Vec<String>) {
    let old_set: BTreeSet<&String> = old.iter().collect();
    let new_set: BTreeSet<&String> = new.iter().collect();
    let add = new_set.difference(&old_set).map(|s| s.to_string()).collect();
    let remove = old_set.difference(&new_set).map(|s| s.to_string()).collect();
    (add, remove)
}

/// Computed attributes shared with the subscriptions data source
pub(crate) fn subscription_to_state(data: &mut ResourceData, subscription: &Subscription) {
    data.set("subscription_id", string_value(&subscription.id));
    data.set("name", string_value(&subscription.name));
    data.set(
        "description",
        optional_string_value(subscription.description.as_deref()),
    );
    data.set("destination_id", string_value(&subscription.destination_id));
    data.set(
        "destination_type",
        optional_string_value(subscription.destination_type.as_deref()),
    );
    data.set(
        "destination_name",
        optional_string_value(subscription.destination_name.as_deref()),
    );
    data.set("topic_id", string_value(&subscription.topic_id));
    data.set(
        "topic_name",
        optional_string_value(subscription.topic_name.as_deref()),
    );
    data.set(
        "updated_at",
        optional_string_value(subscription.updated_at.as_deref()),
    );
}

pub struct SubscriptionResource {
    kind: SubscriptionKind,
}

impl SubscriptionResource {
    pub fn new(kind: SubscriptionKind) -> Self {
        Self { kind }
    }

    fn attributes_from_remote(&self, subscription: &Subscription) -> AttributesConfig {
        let Some(remote) = &subscription.attributes else {
            return AttributesConfig::default();
        };
        AttributesConfig {
            invited: self.kind.has_recipients().then(|| remote.recipients()),
            add_notification_payload: remote.add_notification_payload,
            reply_to_mail: remote.reply_to_mail.clone(),
            reply_to_name: remote.reply_to_name.clone(),
            from_name: remote.from_name.clone(),
            from_email: remote.from_email.clone(),
            signing_enabled: remote.signing_enabled,
            attachment_color: remote.attachment_color.clone(),
            assigned_to: remote.assigned_to.clone(),
            assignment_group: remote.assignment_group.clone(),
        }
    }

    fn update_attributes(&self, data: &ResourceData, new: &AttributesConfig) -> SubscriptionAttributesPrototype {
        let mut prototype = new.to_prototype();
        if self.kind.has_recipients() {
            let old = first_attributes(data.prior().attr("attributes"))
                .and_then(|a| a.invited)
                .unwrap_or_default();
            let (add, remove) = recipient_diff(&old, new.invited.as_deref().unwrap_or_default());
            prototype.invited = None;
            prototype.add = Some(add);
            prototype.remove = Some(remove);
        }
        prototype
    }
}

#[async_trait]
impl Resource for SubscriptionResource {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn schema(&self) -> Schema {
        let mut schema = Schema::new("Event notifications subscription")
            .attribute(Attribute::required("instance_guid", AttributeType::String).force_new())
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(Attribute::required("destination_id", AttributeType::String).force_new())
            .attribute(Attribute::required("topic_id", AttributeType::String).force_new())
            .attribute(Attribute::computed("subscription_id", AttributeType::String))
            .attribute(Attribute::computed("destination_type", AttributeType::String))
            .attribute(Attribute::computed("destination_name", AttributeType::String))
            .attribute(Attribute::computed("topic_name", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String));
        if let Some(fields) = self.kind.attribute_fields() {
            schema = schema.attribute(Attribute::optional(
                "attributes",
                AttributeType::list_of(AttributeType::Object(fields)),
            ));
        }
        schema
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let settings: SubscriptionSettings = data.config_as()?;
        let mut options = CreateSubscriptionOptions::new(
            &settings.instance_guid,
            &settings.name,
            &settings.destination_id,
            &settings.topic_id,
        );
        if let Some(description) = settings.description.as_deref() {
            options = options.with_description(description);
        }
        if let Some(attributes) = settings.attributes.first() {
            options = options.with_attributes(attributes.to_prototype());
        }

        let subscription = meta
            .event_notifications
            .create_subscription(&options)
            .await?
            .into_result();
        info!(
            resource_type = self.type_name(),
            id = %subscription.id,
            "Created subscription"
        );
        data.set_id(join_id(&[settings.instance_guid.as_str(), subscription.id.as_str()]));
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
            .get_subscription(&GetSubscriptionOptions::new(&instance, &id))
            .await;
        let Some(subscription) = found(lookup)? else {
            gone(data, self.type_name());
            return Ok(());
        };

        data.set("instance_guid", string_value(&instance));
        subscription_to_state(data, &subscription);

        let unset = data.get("attributes").map(DynamicValue::is_null).unwrap_or(true);
        if unset && self.kind.attribute_fields().is_some() {
            data.set_encoded("attributes", &vec![self.attributes_from_remote(&subscription)])?;
        }
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let settings: SubscriptionSettings = data.config_as()?;
        let [instance, id] = split_id::<2>(data.require_id()?)?;

        let mut options = UpdateSubscriptionOptions::new(&instance, &id);
        if data.has_change("name") {
            options.name = Some(settings.name.clone());
        }
        if data.has_change("description") {
            options.description = Some(settings.description.clone().unwrap_or_default());
        }
        if data.has_change("attributes") {
            let new = settings.attributes.first().cloned().unwrap_or_default();
            options.attributes = Some(self.update_attributes(data, &new));
        }

        if options.name.is_some() || options.description.is_some() || options.attributes.is_some() {
            meta.event_notifications.update_subscription(&options).await?;
            info!(resource_type = self.type_name(), id = %id, "Updated subscription");
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
                .delete_subscription(&DeleteSubscriptionOptions::new(&instance, &id))
                .await,
        )?;
        info!(resource_type = self.type_name(), id = %id, "Deleted subscription");
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
            .get_subscription(&GetSubscriptionOptions::new(&instance, &id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{make_state, string_list_value};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recipient_diff() {
        let (add, remove) = recipient_diff(
            &strings(&["a@example.com", "b@example.com"]),
            &strings(&["b@example.com", "c@example.com"]),
        );
        assert_eq!(add, strings(&["c@example.com"]));
        assert_eq!(remove, strings(&["a@example.com"]));
    }

    #[test]
    fn test_email_update_sends_add_and_remove() {
        let prior = make_state(vec![
            ("id", string_value("instance/sub")),
            (
                "attributes",
                DynamicValue::List(vec![make_state(vec![(
                    "invited",
                    string_list_value(&["a@example.com"]),
                )])]),
            ),
        ]);
        let data = ResourceData::new(DynamicValue::Null, prior);
        let resource = SubscriptionResource::new(SubscriptionKind::Email);
        let new = AttributesConfig {
            invited: Some(strings(&["b@example.com"])),
            from_name: Some("ops".to_string()),
            ..Default::default()
        };
        let prototype = resource.update_attributes(&data, &new);
        assert_eq!(prototype.invited, None);
        assert_eq!(prototype.add, Some(strings(&["b@example.com"])));
        assert_eq!(prototype.remove, Some(strings(&["a@example.com"])));
        assert_eq!(prototype.from_name.as_deref(), Some("ops"));
    }

    #[test]
    fn test_webhook_update_sends_attributes_as_is() {
        let data = ResourceData::new(DynamicValue::Null, DynamicValue::Null);
        let resource = SubscriptionResource::new(SubscriptionKind::Webhook);
        let new = AttributesConfig {
            signing_enabled: Some(true),
            ..Default::default()
        };
        let prototype = resource.update_attributes(&data, &new);
        assert_eq!(prototype.signing_enabled, Some(true));
        assert_eq!(prototype.add, None);
    }

    #[test]
    fn test_kinds_without_attributes_omit_the_block() {
        let schema = SubscriptionResource::new(SubscriptionKind::PagerDuty).schema();
        assert!(schema.get("attributes").is_none());
        let schema = SubscriptionResource::new(SubscriptionKind::Sms).schema();
        assert!(schema.get("attributes").is_some());
    }
}
