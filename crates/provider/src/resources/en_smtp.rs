//! SMTP configurations and users.
//!
//! Configuration IDs are `<instance_guid>/<smtp_config_id>`; user IDs are
//! `<instance_guid>/<smtp_config_id>/<user_id>`. The user password is only
//! returned at creation, so state keeps the first value it saw.

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::event_notifications::{
    CreateSmtpConfigurationOptions, CreateSmtpUserOptions, DeleteSmtpConfigurationOptions,
    GetSmtpConfigurationOptions, SmtpConfiguration, SmtpUser, SmtpUserOptions,
    UpdateSmtpConfigurationOptions,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{optional_string_value, string_value, ResourceData};

pub const CONFIGURATION_TYPE_NAME: &str = "ibm_en_smtp_configuration";
pub const USER_TYPE_NAME: &str = "ibm_en_smtp_user";

#[derive(Debug, Deserialize)]
struct SmtpConfigurationConfig {
    instance_guid: String,
    name: String,
    domain: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SmtpUserConfig {
    instance_guid: String,
    smtp_config_id: String,
    #[serde(default)]
    description: Option<String>,
}

fn verification_records() -> AttributeType {
    use AttributeType::String as Str;
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::computed(
            "dkim",
            AttributeType::list_of(AttributeType::Object(vec![
                Attribute::computed("public_key", Str),
                Attribute::computed("selector", Str),
                Attribute::computed("verification", Str),
            ])),
        ),
        Attribute::computed(
            "en_authorization",
            AttributeType::list_of(AttributeType::Object(vec![Attribute::computed(
                "verification",
                Str,
            )])),
        ),
        Attribute::computed(
            "spf",
            AttributeType::list_of(AttributeType::Object(vec![
                Attribute::computed("txt_name", Str),
                Attribute::computed("txt_value", Str),
                Attribute::computed("verification", Str),
            ])),
        ),
    ]))
}

fn configuration_to_state(data: &mut ResourceData, config: &SmtpConfiguration) -> Result<()> {
    data.set("smtp_config_id", string_value(&config.id));
    data.set("name", string_value(&config.name));
    data.set("domain", string_value(&config.domain));
    data.set(
        "description",
        optional_string_value(config.description.as_deref()),
    );
    data.set("created_at", optional_string_value(config.created_at.as_deref()));
    data.set("updated_at", optional_string_value(config.updated_at.as_deref()));

    // nested blocks are single-element lists
    let records: Vec<serde_json::Value> = config
        .config
        .iter()
        .map(|c| {
            serde_json::json!({
                "dkim": c.dkim.iter().collect::<Vec<_>>(),
                "en_authorization": c.en_authorization.iter().collect::<Vec<_>>(),
                "spf": c.spf.iter().collect::<Vec<_>>(),
            })
        })
        .collect();
    data.set_encoded("config", &records)
}

fn user_to_state(data: &mut ResourceData, user: &SmtpUser) {
    data.set("user_id", string_value(&user.id));
    if let Some(config_id) = user.smtp_config_id.as_deref() {
        data.set("smtp_config_id", string_value(config_id));
    }
    data.set("description", optional_string_value(user.description.as_deref()));
    data.set("domain", optional_string_value(user.domain.as_deref()));
    data.set("username", optional_string_value(user.username.as_deref()));
    if let Some(password) = user.password.as_deref() {
        data.set("password", string_value(password));
    }
    data.set("created_at", optional_string_value(user.created_at.as_deref()));
    data.set("updated_at", optional_string_value(user.updated_at.as_deref()));
}

pub struct SmtpConfigurationResource;

#[async_trait]
impl Resource for SmtpConfigurationResource {
    fn type_name(&self) -> &'static str {
        CONFIGURATION_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("SMTP configuration for sending email notifications")
            .attribute(Attribute::required("instance_guid", AttributeType::String).force_new())
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(
                Attribute::required("domain", AttributeType::String)
                    .force_new()
                    .describe("Sending domain"),
            )
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(Attribute::computed("smtp_config_id", AttributeType::String))
            .attribute(
                Attribute::computed("config", verification_records())
                    .describe("DNS records proving ownership of the domain"),
            )
            .attribute(Attribute::computed("created_at", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: SmtpConfigurationConfig = data.config_as()?;
        let mut options =
            CreateSmtpConfigurationOptions::new(&config.instance_guid, &config.name, &config.domain);
        options.description = config.description.clone();

        let created = meta
            .event_notifications
            .create_smtp_configuration(&options)
            .await?
            .into_result();
        info!(id = %created.id, domain = %created.domain, "Created SMTP configuration");
        data.set_id(join_id(&[config.instance_guid.as_str(), created.id.as_str()]));
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
            .get_smtp_configuration(&GetSmtpConfigurationOptions::new(&instance, &id))
            .await;
        match found(lookup)? {
            Some(config) => {
                data.set("instance_guid", string_value(&instance));
                configuration_to_state(data, &config)
            }
            None => {
                gone(data, CONFIGURATION_TYPE_NAME);
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
        let config: SmtpConfigurationConfig = data.config_as()?;
        let [instance, id] = split_id::<2>(data.require_id()?)?;

        let mut options = UpdateSmtpConfigurationOptions::new(&instance, &id);
        if data.has_change("name") {
            options.name = Some(config.name);
        }
        if data.has_change("description") {
            options.description = Some(config.description.unwrap_or_default());
        }
        if options.name.is_some() || options.description.is_some() {
            meta.event_notifications
                .update_smtp_configuration(&options)
                .await?;
            info!(id = %id, "Updated SMTP configuration");
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
                .delete_smtp_configuration(&DeleteSmtpConfigurationOptions::new(&instance, &id))
                .await,
        )?;
        info!(id = %id, "Deleted SMTP configuration");
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
            .get_smtp_configuration(&GetSmtpConfigurationOptions::new(&instance, &id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}

pub struct SmtpUserResource;

#[async_trait]
impl Resource for SmtpUserResource {
    fn type_name(&self) -> &'static str {
        USER_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("SMTP user issued under an SMTP configuration")
            .attribute(Attribute::required("instance_guid", AttributeType::String).force_new())
            .attribute(Attribute::required("smtp_config_id", AttributeType::String).force_new())
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(Attribute::computed("user_id", AttributeType::String))
            .attribute(Attribute::computed("domain", AttributeType::String))
            .attribute(Attribute::computed("username", AttributeType::String))
            .attribute(Attribute::computed("password", AttributeType::String).sensitive())
            .attribute(Attribute::computed("created_at", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: SmtpUserConfig = data.config_as()?;
        let mut options = CreateSmtpUserOptions::new(&config.instance_guid, &config.smtp_config_id);
        options.description = config.description.clone();

        let user = meta
            .event_notifications
            .create_smtp_user(&options)
            .await?
            .into_result();
        info!(id = %user.id, smtp_config_id = %config.smtp_config_id, "Created SMTP user");
        data.set_id(join_id(&[
            config.instance_guid.as_str(),
            config.smtp_config_id.as_str(),
            user.id.as_str(),
        ]));
        user_to_state(data, &user);
        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, config_id, user_id] = split_id::<3>(data.require_id()?)?;
        let lookup = meta
            .event_notifications
            .get_smtp_user(&SmtpUserOptions::new(&instance, &config_id, &user_id))
            .await;
        match found(lookup)? {
            Some(user) => {
                data.set("instance_guid", string_value(&instance));
                data.set("smtp_config_id", string_value(&config_id));
                user_to_state(data, &user);
            }
            None => gone(data, USER_TYPE_NAME),
        }
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        if data.has_change("description") {
            let config: SmtpUserConfig = data.config_as()?;
            let [instance, config_id, user_id] = split_id::<3>(data.require_id()?)?;
            let options = SmtpUserOptions::new(&instance, &config_id, &user_id)
                .with_description(config.description.unwrap_or_default());
            meta.event_notifications.update_smtp_user(&options).await?;
            info!(id = %user_id, "Updated SMTP user");
        }
        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [instance, config_id, user_id] = split_id::<3>(data.require_id()?)?;
        deleted(
            meta.event_notifications
                .delete_smtp_user(&SmtpUserOptions::new(&instance, &config_id, &user_id))
                .await,
        )?;
        info!(id = %user_id, "Deleted SMTP user");
        data.clear_id();
        Ok(())
    }

    async fn exists(
        &self,
        _ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool> {
        let [instance, config_id, user_id] = split_id::<3>(data.require_id()?)?;
        let lookup = meta
            .event_notifications
            .get_smtp_user(&SmtpUserOptions::new(&instance, &config_id, &user_id))
            .await;
        Ok(found(lookup)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DynamicValue;

    fn user(password: Option<&str>) -> SmtpUser {
        SmtpUser {
            id: "user-1".to_string(),
            smtp_config_id: Some("cfg-1".to_string()),
            description: None,
            domain: Some("mail.example.com".to_string()),
            username: Some("smtp-user".to_string()),
            password: password.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_password_survives_reads_without_it() {
        let mut data = ResourceData::new(DynamicValue::Null, DynamicValue::Null);
        user_to_state(&mut data, &user(Some("s3cret")));
        user_to_state(&mut data, &user(None));
        assert_eq!(
            data.get("password").and_then(DynamicValue::as_string),
            Some("s3cret")
        );
        assert_eq!(
            data.get("username").and_then(DynamicValue::as_string),
            Some("smtp-user")
        );
    }

    #[test]
    fn test_password_is_sensitive() {
        let schema = SmtpUserResource.schema();
        let password = schema.get("password").map(|a| a.sensitive);
        assert_eq!(password, Some(true));
    }
}
