//! Topics: filters that route source events to subscriptions

use std::collections::HashMap;

use ibmcloud_common::{DetailedResponse, Method, Result};
use serde::{Deserialize, Serialize};

use super::{EventNotificationsV1, ListParams, Paging, MAX_PAGE_SIZE};
use crate::require;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A source attached to a topic, with its rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourcesItems {
    pub id: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSubscription {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination_id: Option<String>,
    #[serde(default)]
    pub destination_type: Option<String>,
}

/// A topic as returned by get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_count: Option<i64>,
    #[serde(default)]
    pub sources: Vec<TopicSource>,
    #[serde(default)]
    pub subscription_count: Option<i64>,
    #[serde(default)]
    pub subscriptions: Vec<TopicSubscription>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body returned by create and replace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicsListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_count: Option<i64>,
    #[serde(default)]
    pub sources_names: Vec<String>,
    #[serde(default)]
    pub subscription_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicList {
    #[serde(flatten)]
    pub paging: Paging,
    pub topics: Vec<TopicsListItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ListTopicsOptions {
    pub instance_id: String,
    pub params: ListParams,
    pub headers: HashMap<String, String>,
}

impl ListTopicsOptions {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTopicOptions {
    pub instance_id: String,
    pub name: String,
    pub description: Option<String>,
    pub sources: Vec<SourcesItems>,
    pub headers: HashMap<String, String>,
}

impl CreateTopicOptions {
    pub fn new(instance_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourcesItems>) -> Self {
        self.sources = sources;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTopicOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetTopicOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Replaces name, description and sources of a topic in one call
#[derive(Debug, Clone, Default)]
pub struct ReplaceTopicOptions {
    pub instance_id: String,
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub sources: Vec<SourcesItems>,
    pub headers: HashMap<String, String>,
}

impl ReplaceTopicOptions {
    pub fn new(
        instance_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteTopicOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteTopicOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct TopicBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "no_sources")]
    sources: &'a [SourcesItems],
}

fn no_sources(sources: &&[SourcesItems]) -> bool {
    sources.is_empty()
}

impl EventNotificationsV1 {
    pub async fn list_topics(
        &self,
        options: &ListTopicsOptions,
    ) -> Result<DetailedResponse<TopicList>> {
        require("instance_id", &options.instance_id)?;
        let builder = self.session.request(
            Method::GET,
            "/v1/instances/{instance_id}/topics",
            &[("instance_id", options.instance_id.as_str())],
        );
        options
            .params
            .apply(builder)
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn list_all_topics(
        &self,
        instance_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<TopicsListItem>> {
        let mut options = ListTopicsOptions::new(instance_id);
        options.params.limit = Some(MAX_PAGE_SIZE);
        options.params.search = search.map(str::to_string);

        let mut all = Vec::new();
        loop {
            let page = self.list_topics(&options).await?.into_result();
            let received = page.topics.len();
            all.extend(page.topics);
            match page.paging.next_offset(received) {
                Some(offset) => options.params.offset = Some(offset),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn create_topic(
        &self,
        options: &CreateTopicOptions,
    ) -> Result<DetailedResponse<TopicResponse>> {
        require("instance_id", &options.instance_id)?;
        require("name", &options.name)?;
        self.session
            .request(
                Method::POST,
                "/v1/instances/{instance_id}/topics",
                &[("instance_id", options.instance_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&TopicBody {
                name: &options.name,
                description: options.description.as_deref(),
                sources: &options.sources,
            })
            .send_json()
            .await
    }

    pub async fn get_topic(&self, options: &GetTopicOptions) -> Result<DetailedResponse<Topic>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::GET,
                "/v1/instances/{instance_id}/topics/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn replace_topic(
        &self,
        options: &ReplaceTopicOptions,
    ) -> Result<DetailedResponse<TopicResponse>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        require("name", &options.name)?;
        self.session
            .request(
                Method::PUT,
                "/v1/instances/{instance_id}/topics/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&TopicBody {
                name: &options.name,
                description: options.description.as_deref(),
                sources: &options.sources,
            })
            .send_json()
            .await
    }

    pub async fn delete_topic(&self, options: &DeleteTopicOptions) -> Result<DetailedResponse<()>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::DELETE,
                "/v1/instances/{instance_id}/topics/{id}",
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
