//! Sources: API-registered event producers

use std::collections::HashMap;

use ibmcloud_common::{DetailedResponse, Method, Result};
use serde::{Deserialize, Serialize};

use super::{EventNotificationsV1, ListParams, Paging, MAX_PAGE_SIZE};
use crate::require;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub topic_count: Option<i64>,
    #[serde(default)]
    pub topic_names: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceListItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub topic_count: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceList {
    #[serde(flatten)]
    pub paging: Paging,
    pub sources: Vec<SourceListItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ListSourcesOptions {
    pub instance_id: String,
    pub params: ListParams,
    pub headers: HashMap<String, String>,
}

impl ListSourcesOptions {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSourcesOptions {
    pub instance_id: String,
    pub name: String,
    pub description: String,
    pub enabled: Option<bool>,
    pub headers: HashMap<String, String>,
}

impl CreateSourcesOptions {
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetSourceOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetSourceOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSourceOptions {
    pub instance_id: String,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub headers: HashMap<String, String>,
}

impl UpdateSourceOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteSourceOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteSourceOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

impl EventNotificationsV1 {
    pub async fn list_sources(
        &self,
        options: &ListSourcesOptions,
    ) -> Result<DetailedResponse<SourceList>> {
        require("instance_id", &options.instance_id)?;
        let builder = self.session.request(
            Method::GET,
            "/v1/instances/{instance_id}/sources",
            &[("instance_id", options.instance_id.as_str())],
        );
        options
            .params
            .apply(builder)
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn list_all_sources(&self, instance_id: &str) -> Result<Vec<SourceListItem>> {
        let mut options = ListSourcesOptions::new(instance_id);
        options.params.limit = Some(MAX_PAGE_SIZE);

        let mut all = Vec::new();
        loop {
            let page = self.list_sources(&options).await?.into_result();
            let received = page.sources.len();
            all.extend(page.sources);
            match page.paging.next_offset(received) {
                Some(offset) => options.params.offset = Some(offset),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn create_sources(
        &self,
        options: &CreateSourcesOptions,
    ) -> Result<DetailedResponse<Source>> {
        require("instance_id", &options.instance_id)?;
        require("name", &options.name)?;
        require("description", &options.description)?;

        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            description: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            enabled: Option<bool>,
        }

        self.session
            .request(
                Method::POST,
                "/v1/instances/{instance_id}/sources",
                &[("instance_id", options.instance_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&Body {
                name: &options.name,
                description: &options.description,
                enabled: options.enabled,
            })
            .send_json()
            .await
    }

    pub async fn get_source(&self, options: &GetSourceOptions) -> Result<DetailedResponse<Source>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::GET,
                "/v1/instances/{instance_id}/sources/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_source(
        &self,
        options: &UpdateSourceOptions,
    ) -> Result<DetailedResponse<Source>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            enabled: Option<bool>,
        }

        self.session
            .request(
                Method::PATCH,
                "/v1/instances/{instance_id}/sources/{id}",
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&Patch {
                name: options.name.as_deref(),
                description: options.description.as_deref(),
                enabled: options.enabled,
            })
            .send_json()
            .await
    }

    pub async fn delete_source(
        &self,
        options: &DeleteSourceOptions,
    ) -> Result<DetailedResponse<()>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::DELETE,
                "/v1/instances/{instance_id}/sources/{id}",
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
