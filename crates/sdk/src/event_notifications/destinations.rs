//! Destinations: where notifications are delivered

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ibmcloud_common::{DetailedResponse, Error, Method, Result};
use serde::{Deserialize, Serialize};

use super::{EventNotificationsV1, ListParams, Paging, MAX_PAGE_SIZE};
use crate::require;

/// Kinds of destination the service can deliver to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationType {
    #[serde(rename = "webhook")]
    Webhook,
    #[serde(rename = "slack")]
    Slack,
    #[serde(rename = "msteams")]
    MsTeams,
    #[serde(rename = "pagerduty")]
    PagerDuty,
    #[serde(rename = "servicenow")]
    ServiceNow,
    #[serde(rename = "ibmce")]
    CodeEngine,
    #[serde(rename = "ibmcos")]
    CloudObjectStorage,
    #[serde(rename = "push_android")]
    PushAndroid,
    #[serde(rename = "smtp_ibm")]
    SmtpIbm,
    #[serde(rename = "sms_ibm")]
    SmsIbm,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Webhook => "webhook",
            DestinationType::Slack => "slack",
            DestinationType::MsTeams => "msteams",
            DestinationType::PagerDuty => "pagerduty",
            DestinationType::ServiceNow => "servicenow",
            DestinationType::CodeEngine => "ibmce",
            DestinationType::CloudObjectStorage => "ibmcos",
            DestinationType::PushAndroid => "push_android",
            DestinationType::SmtpIbm => "smtp_ibm",
            DestinationType::SmsIbm => "sms_ibm",
        }
    }

    /// Config parameters a destination of this type cannot be created without
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            DestinationType::Webhook => &["url", "verb"],
            DestinationType::Slack | DestinationType::MsTeams | DestinationType::CodeEngine => {
                &["url"]
            }
            DestinationType::PagerDuty => &["api_key", "routing_key"],
            DestinationType::ServiceNow => {
                &["client_id", "client_secret", "username", "password", "instance_name"]
            }
            DestinationType::CloudObjectStorage => &["bucket_name", "instance_id", "endpoint"],
            DestinationType::PushAndroid => &["sender_id", "server_key"],
            DestinationType::SmtpIbm | DestinationType::SmsIbm => &[],
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = match s {
            "webhook" => DestinationType::Webhook,
            "slack" => DestinationType::Slack,
            "msteams" => DestinationType::MsTeams,
            "pagerduty" => DestinationType::PagerDuty,
            "servicenow" => DestinationType::ServiceNow,
            "ibmce" => DestinationType::CodeEngine,
            "ibmcos" => DestinationType::CloudObjectStorage,
            "push_android" => DestinationType::PushAndroid,
            "smtp_ibm" => DestinationType::SmtpIbm,
            "sms_ibm" => DestinationType::SmsIbm,
            other => {
                return Err(Error::validation(format!(
                    "unknown destination type: {}",
                    other
                )))
            }
        };
        Ok(t)
    }
}

/// Union of every destination type's config parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DestinationConfigParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_prod: Option<bool>,
}

impl DestinationConfigParams {
    fn has(&self, name: &str) -> bool {
        let value = match name {
            "url" => &self.url,
            "verb" => &self.verb,
            "api_key" => &self.api_key,
            "routing_key" => &self.routing_key,
            "client_id" => &self.client_id,
            "client_secret" => &self.client_secret,
            "username" => &self.username,
            "password" => &self.password,
            "instance_name" => &self.instance_name,
            "bucket_name" => &self.bucket_name,
            "instance_id" => &self.instance_id,
            "endpoint" => &self.endpoint,
            "sender_id" => &self.sender_id,
            "server_key" => &self.server_key,
            _ => return false,
        };
        value.as_deref().map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Check the parameters a destination type requires
    pub fn validate_for(&self, destination_type: DestinationType) -> Result<()> {
        let missing: Vec<&str> = destination_type
            .required_params()
            .iter()
            .copied()
            .filter(|p| !self.has(p))
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "{} destination requires config params: {}",
                destination_type,
                missing.join(", ")
            )));
        }
        if let Some(verb) = &self.verb {
            let verb = verb.to_ascii_lowercase();
            if verb != "get" && verb != "post" {
                return Err(Error::validation(format!(
                    "verb must be one of get, post; got {}",
                    verb
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub params: DestinationConfigParams,
}

/// A destination as returned by get/create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub destination_type: DestinationType,
    #[serde(default)]
    pub config: Option<DestinationConfig>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub subscription_count: Option<i64>,
    #[serde(default)]
    pub subscription_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub destination_type: DestinationType,
    #[serde(default)]
    pub subscription_count: Option<i64>,
    #[serde(default)]
    pub subscription_names: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationList {
    #[serde(flatten)]
    pub paging: Paging,
    pub destinations: Vec<DestinationListItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ListDestinationsOptions {
    pub instance_id: String,
    pub params: ListParams,
    pub headers: HashMap<String, String>,
}

impl ListDestinationsOptions {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateDestinationOptions {
    pub instance_id: String,
    pub name: String,
    pub destination_type: DestinationType,
    pub description: Option<String>,
    pub config: Option<DestinationConfig>,
    pub headers: HashMap<String, String>,
}

impl CreateDestinationOptions {
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        destination_type: DestinationType,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            destination_type,
            description: None,
            config: None,
            headers: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_params(mut self, params: DestinationConfigParams) -> Self {
        self.config = Some(DestinationConfig { params });
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("instance_id", &self.instance_id)?;
        require("name", &self.name)?;
        let params = self
            .config
            .as_ref()
            .map(|c| c.params.clone())
            .unwrap_or_default();
        params.validate_for(self.destination_type)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetDestinationOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetDestinationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDestinationOptions {
    pub instance_id: String,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<DestinationConfig>,
    pub headers: HashMap<String, String>,
}

impl UpdateDestinationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteDestinationOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteDestinationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

impl EventNotificationsV1 {
    pub async fn list_destinations(
        &self,
        options: &ListDestinationsOptions,
    ) -> Result<DetailedResponse<DestinationList>> {
        require("instance_id", &options.instance_id)?;
        let builder = self.session.request(
            Method::GET,
            "/v1/instances/{instance_id}/destinations",
            &[("instance_id", options.instance_id.as_str())],
        );
        options
            .params
            .apply(builder)
            .headers(&options.headers)
            .send_json()
            .await
    }

    /// Collect every destination of an instance, page by page
    pub async fn list_all_destinations(
        &self,
        instance_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<DestinationListItem>> {
        let mut options = ListDestinationsOptions::new(instance_id);
        options.params.limit = Some(MAX_PAGE_SIZE);
        options.params.search = search.map(str::to_string);

        let mut all = Vec::new();
        loop {
            let page = self.list_destinations(&options).await?.into_result();
            let received = page.destinations.len();
            all.extend(page.destinations);
            match page.paging.next_offset(received) {
                Some(offset) => options.params.offset = Some(offset),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn create_destination(
        &self,
        options: &CreateDestinationOptions,
    ) -> Result<DetailedResponse<Destination>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            #[serde(rename = "type")]
            destination_type: DestinationType,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            config: Option<&'a DestinationConfig>,
        }

        self.session
            .request(
                Method::POST,
                "/v1/instances/{instance_id}/destinations",
                &[("instance_id", options.instance_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&Body {
                name: &options.name,
                destination_type: options.destination_type,
                description: options.description.as_deref(),
                config: options.config.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn get_destination(
        &self,
        options: &GetDestinationOptions,
    ) -> Result<DetailedResponse<Destination>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::GET,
                "/v1/instances/{instance_id}/destinations/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_destination(
        &self,
        options: &UpdateDestinationOptions,
    ) -> Result<DetailedResponse<Destination>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            config: Option<&'a DestinationConfig>,
        }

        self.session
            .request(
                Method::PATCH,
                "/v1/instances/{instance_id}/destinations/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&Patch {
                name: options.name.as_deref(),
                description: options.description.as_deref(),
                config: options.config.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_destination(
        &self,
        options: &DeleteDestinationOptions,
    ) -> Result<DetailedResponse<()>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::DELETE,
                "/v1/instances/{instance_id}/destinations/{id}",
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
    fn test_webhook_requires_url_and_verb() {
        let params = DestinationConfigParams {
            url: Some("https://example.com/hook".to_string()),
            ..Default::default()
        };
        let err = params.validate_for(DestinationType::Webhook).unwrap_err();
        assert!(err.to_string().contains("verb"));

        let params = DestinationConfigParams {
            url: Some("https://example.com/hook".to_string()),
            verb: Some("POST".to_string()),
            ..Default::default()
        };
        assert!(params.validate_for(DestinationType::Webhook).is_ok());
    }

    #[test]
    fn test_pagerduty_requires_keys() {
        let err = DestinationConfigParams::default()
            .validate_for(DestinationType::PagerDuty)
            .unwrap_err();
        assert!(err.to_string().contains("api_key, routing_key"));
    }

    #[test]
    fn test_invalid_verb() {
        let params = DestinationConfigParams {
            url: Some("https://example.com".to_string()),
            verb: Some("put".to_string()),
            ..Default::default()
        };
        assert!(params.validate_for(DestinationType::Webhook).is_err());
    }

    #[test]
    fn test_type_round_trips_through_str() {
        for t in [
            DestinationType::Webhook,
            DestinationType::CodeEngine,
            DestinationType::PushAndroid,
        ] {
            assert_eq!(t.as_str().parse::<DestinationType>().unwrap(), t);
        }
    }
}
