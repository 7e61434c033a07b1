//! Subscriptions: bind a topic to a destination

use std::collections::HashMap;

use ibmcloud_common::{DetailedResponse, Method, Result};
use serde::{Deserialize, Serialize};

use super::{EventNotificationsV1, ListParams, Paging, MAX_PAGE_SIZE};
use crate::require;

/// Subscription attributes sent on create and update.
///
/// Which fields apply depends on the destination type: email and SMS use the
/// recipient lists, webhooks use `signing_enabled`, Slack uses
/// `attachment_color`, ServiceNow uses the assignment fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionAttributesPrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited: Option<Vec<String>>,
    /// Recipients to invite on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    /// Recipients to drop on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_notification_payload: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<String>,
}

/// Delivery state of one recipient
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl Recipient {
    /// Email address or phone number, whichever is set
    pub fn address(&self) -> Option<&str> {
        self.email.as_deref().or(self.phone_number.as_deref())
    }
}

/// Subscription attributes as reported by the service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionAttributes {
    #[serde(default)]
    pub invited: Vec<Recipient>,
    #[serde(default)]
    pub subscribed: Vec<Recipient>,
    #[serde(default)]
    pub unsubscribed: Vec<Recipient>,
    #[serde(default)]
    pub add_notification_payload: Option<bool>,
    #[serde(default)]
    pub reply_to_mail: Option<String>,
    #[serde(default)]
    pub reply_to_name: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub signing_enabled: Option<bool>,
    #[serde(default)]
    pub attachment_color: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assignment_group: Option<String>,
}

impl SubscriptionAttributes {
    /// Every recipient the service knows of, invited or subscribed
    pub fn recipients(&self) -> Vec<String> {
        self.invited
            .iter()
            .chain(self.subscribed.iter())
            .filter_map(|r| r.address().map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub destination_id: String,
    #[serde(default)]
    pub destination_name: Option<String>,
    #[serde(default)]
    pub destination_type: Option<String>,
    pub topic_id: String,
    #[serde(default)]
    pub topic_name: Option<String>,
    #[serde(default)]
    pub attributes: Option<SubscriptionAttributes>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination_id: Option<String>,
    #[serde(default)]
    pub destination_name: Option<String>,
    #[serde(default)]
    pub destination_type: Option<String>,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub topic_name: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionList {
    #[serde(flatten)]
    pub paging: Paging,
    pub subscriptions: Vec<SubscriptionListItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ListSubscriptionsOptions {
    pub instance_id: String,
    pub params: ListParams,
    pub headers: HashMap<String, String>,
}

impl ListSubscriptionsOptions {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSubscriptionOptions {
    pub instance_id: String,
    pub name: String,
    pub destination_id: String,
    pub topic_id: String,
    pub description: Option<String>,
    pub attributes: Option<SubscriptionAttributesPrototype>,
    pub headers: HashMap<String, String>,
}

impl CreateSubscriptionOptions {
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        destination_id: impl Into<String>,
        topic_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            destination_id: destination_id.into(),
            topic_id: topic_id.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attributes(mut self, attributes: SubscriptionAttributesPrototype) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("instance_id", &self.instance_id)?;
        require("name", &self.name)?;
        require("destination_id", &self.destination_id)?;
        require("topic_id", &self.topic_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetSubscriptionOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetSubscriptionOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubscriptionOptions {
    pub instance_id: String,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub attributes: Option<SubscriptionAttributesPrototype>,
    pub headers: HashMap<String, String>,
}

impl UpdateSubscriptionOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteSubscriptionOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteSubscriptionOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

impl EventNotificationsV1 {
    pub async fn list_subscriptions(
        &self,
        options: &ListSubscriptionsOptions,
    ) -> Result<DetailedResponse<SubscriptionList>> {
        require("instance_id", &options.instance_id)?;
        let builder = self.session.request(
            Method::GET,
            "/v1/instances/{instance_id}/subscriptions",
            &[("instance_id", options.instance_id.as_str())],
        );
        options
            .params
            .apply(builder)
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn list_all_subscriptions(
        &self,
        instance_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<SubscriptionListItem>> {
        let mut options = ListSubscriptionsOptions::new(instance_id);
        options.params.limit = Some(MAX_PAGE_SIZE);
        options.params.search = search.map(str::to_string);

        let mut all = Vec::new();
        loop {
            let page = self.list_subscriptions(&options).await?.into_result();
            let received = page.subscriptions.len();
            all.extend(page.subscriptions);
            match page.paging.next_offset(received) {
                Some(offset) => options.params.offset = Some(offset),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn create_subscription(
        &self,
        options: &CreateSubscriptionOptions,
    ) -> Result<DetailedResponse<Subscription>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            destination_id: &'a str,
            topic_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            attributes: Option<&'a SubscriptionAttributesPrototype>,
        }

        self.session
            .request(
                Method::POST,
                "/v1/instances/{instance_id}/subscriptions",
                &[("instance_id", options.instance_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&Body {
                name: &options.name,
                destination_id: &options.destination_id,
                topic_id: &options.topic_id,
                description: options.description.as_deref(),
                attributes: options.attributes.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn get_subscription(
        &self,
        options: &GetSubscriptionOptions,
    ) -> Result<DetailedResponse<Subscription>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::GET,
                "/v1/instances/{instance_id}/subscriptions/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_subscription(
        &self,
        options: &UpdateSubscriptionOptions,
    ) -> Result<DetailedResponse<Subscription>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            attributes: Option<&'a SubscriptionAttributesPrototype>,
        }

        self.session
            .request(
                Method::PATCH,
                "/v1/instances/{instance_id}/subscriptions/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&Patch {
                name: options.name.as_deref(),
                description: options.description.as_deref(),
                attributes: options.attributes.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_subscription(
        &self,
        options: &DeleteSubscriptionOptions,
    ) -> Result<DetailedResponse<()>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::DELETE,
                "/v1/instances/{instance_id}/subscriptions/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_empty()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_merge_invited_and_subscribed() {
        let attributes: SubscriptionAttributes = serde_json::from_str(
            r#"{
                "invited": [{"email": "a@example.com", "expires_at": "2024-01-01T00:00:00Z"}],
                "subscribed": [{"email": "b@example.com"}],
                "unsubscribed": [{"email": "c@example.com"}],
                "add_notification_payload": true
            }"#,
        )
        .unwrap();

        assert_eq!(
            attributes.recipients(),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[test]
    fn test_prototype_omits_unset_fields() {
        let attributes = SubscriptionAttributesPrototype {
            signing_enabled: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&attributes).unwrap();
        assert_eq!(json, serde_json::json!({"signing_enabled": true}));
    }
}
