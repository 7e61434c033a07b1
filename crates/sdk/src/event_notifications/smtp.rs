//! SMTP configurations and their users
//!
//! A configuration owns a sending domain and the DNS records that prove
//! ownership of it. Users are credentials issued under a configuration; the
//! password is only returned when the user is created.

use std::collections::HashMap;

use ibmcloud_common::{DetailedResponse, Method, Result};
use serde::{Deserialize, Serialize};

use super::EventNotificationsV1;
use crate::require;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dkim {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub verification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnAuthorization {
    #[serde(default)]
    pub verification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Spf {
    #[serde(default)]
    pub txt_name: Option<String>,
    #[serde(default)]
    pub txt_value: Option<String>,
    #[serde(default)]
    pub verification: Option<String>,
}

/// Domain verification records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub dkim: Option<Dkim>,
    #[serde(default)]
    pub en_authorization: Option<EnAuthorization>,
    #[serde(default)]
    pub spf: Option<Spf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub domain: String,
    #[serde(default)]
    pub config: Option<SmtpConfig>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpUser {
    pub id: String,
    #[serde(default)]
    pub smtp_config_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Present only in the create response
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateSmtpConfigurationOptions {
    pub instance_id: String,
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub headers: HashMap<String, String>,
}

impl CreateSmtpConfigurationOptions {
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetSmtpConfigurationOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetSmtpConfigurationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSmtpConfigurationOptions {
    pub instance_id: String,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub headers: HashMap<String, String>,
}

impl UpdateSmtpConfigurationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteSmtpConfigurationOptions {
    pub instance_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteSmtpConfigurationOptions {
    pub fn new(instance_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSmtpUserOptions {
    pub instance_id: String,
    pub id: String,
    pub description: Option<String>,
    pub headers: HashMap<String, String>,
}

impl CreateSmtpUserOptions {
    pub fn new(instance_id: impl Into<String>, smtp_config_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: smtp_config_id.into(),
            ..Default::default()
        }
    }
}

/// Addresses one user: `id` is the SMTP configuration, `user_id` the user
#[derive(Debug, Clone, Default)]
pub struct SmtpUserOptions {
    pub instance_id: String,
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub headers: HashMap<String, String>,
}

impl SmtpUserOptions {
    pub fn new(
        instance_id: impl Into<String>,
        smtp_config_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            id: smtp_config_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(&self) -> Result<()> {
        require("instance_id", &self.instance_id)?;
        require("id", &self.id)?;
        require("user_id", &self.user_id)
    }
}

#[derive(Serialize)]
struct NameDescription<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

const CONFIG_PATH: &str = "/v1/instances/{instance_id}/smtp/config/{id}";
const USERS_PATH: &str = "/v1/instances/{instance_id}/smtp/config/{id}/users";
const USER_PATH: &str = "/v1/instances/{instance_id}/smtp/config/{id}/users/{user_id}";

impl EventNotificationsV1 {
    pub async fn create_smtp_configuration(
        &self,
        options: &CreateSmtpConfigurationOptions,
    ) -> Result<DetailedResponse<SmtpConfiguration>> {
        require("instance_id", &options.instance_id)?;
        require("name", &options.name)?;
        require("domain", &options.domain)?;

        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            domain: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
        }

        self.session
            .request(
                Method::POST,
                "/v1/instances/{instance_id}/smtp/config",
                &[("instance_id", options.instance_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&Body {
                name: &options.name,
                domain: &options.domain,
                description: options.description.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn get_smtp_configuration(
        &self,
        options: &GetSmtpConfigurationOptions,
    ) -> Result<DetailedResponse<SmtpConfiguration>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::GET,
                CONFIG_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_smtp_configuration(
        &self,
        options: &UpdateSmtpConfigurationOptions,
    ) -> Result<DetailedResponse<SmtpConfiguration>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::PATCH,
                CONFIG_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&NameDescription {
                name: options.name.as_deref(),
                description: options.description.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_smtp_configuration(
        &self,
        options: &DeleteSmtpConfigurationOptions,
    ) -> Result<DetailedResponse<()>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::DELETE,
                CONFIG_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_empty()
            .await
    }

    pub async fn create_smtp_user(
        &self,
        options: &CreateSmtpUserOptions,
    ) -> Result<DetailedResponse<SmtpUser>> {
        require("instance_id", &options.instance_id)?;
        require("id", &options.id)?;
        self.session
            .request(
                Method::POST,
                USERS_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&NameDescription {
                name: None,
                description: options.description.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn get_smtp_user(
        &self,
        options: &SmtpUserOptions,
    ) -> Result<DetailedResponse<SmtpUser>> {
        options.validate()?;
        self.session
            .request(
                Method::GET,
                USER_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                    ("user_id", options.user_id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_smtp_user(
        &self,
        options: &SmtpUserOptions,
    ) -> Result<DetailedResponse<SmtpUser>> {
        options.validate()?;
        self.session
            .request(
                Method::PATCH,
                USER_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                    ("user_id", options.user_id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&NameDescription {
                name: None,
                description: options.description.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_smtp_user(&self, options: &SmtpUserOptions) -> Result<DetailedResponse<()>> {
        options.validate()?;
        self.session
            .request(
                Method::DELETE,
                USER_PATH,
                &[
                    ("instance_id", options.instance_id.as_str()),
                    ("id", options.id.as_str()),
                    ("user_id", options.user_id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_empty()
            .await
    }
}
