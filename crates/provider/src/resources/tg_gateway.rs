//! Transit gateway resource

use async_trait::async_trait;
use ibmcloud_common::{DetailedResponse, Observation, Result, Target};
use ibmcloud_sdk::transit_gateway::{
    CreateTransitGatewayOptions, DeleteTransitGatewayOptions, GetTransitGatewayOptions,
    TransitGateway, TransitGatewayApisV1, UpdateTransitGatewayOptions,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{bool_value, optional_string_value, string_value, ResourceData};

pub const TYPE_NAME: &str = "ibm_tg_gateway";

pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Deserialize)]
struct GatewayConfig {
    name: String,
    location: String,
    #[serde(default)]
    global: Option<bool>,
    #[serde(default)]
    resource_group: Option<String>,
}

pub struct GatewayResource;

/// Attributes shared with the gateway data sources
pub(crate) fn gateway_attributes(schema: Schema) -> Schema {
    schema
        .attribute(Attribute::computed("crn", AttributeType::String))
        .attribute(Attribute::computed("status", AttributeType::String))
        .attribute(Attribute::computed("created_at", AttributeType::String))
        .attribute(Attribute::computed("updated_at", AttributeType::String))
}

/// Copy a gateway into state; the ID is set by the caller
pub(crate) fn gateway_to_state(data: &mut ResourceData, gateway: &TransitGateway) {
    data.set("name", string_value(&gateway.name));
    data.set("location", optional_string_value(gateway.location.as_deref()));
    data.set("global", bool_value(gateway.global.unwrap_or(false)));
    data.set(
        "resource_group",
        optional_string_value(gateway.resource_group.as_ref().map(|rg| rg.id.as_str())),
    );
    data.set("crn", optional_string_value(gateway.crn.as_deref()));
    data.set("status", string_value(&gateway.status));
    data.set("created_at", optional_string_value(gateway.created_at.as_deref()));
    data.set("updated_at", optional_string_value(gateway.updated_at.as_deref()));
}

async fn get_gateway(
    client: &TransitGatewayApisV1,
    id: &str,
) -> Result<DetailedResponse<TransitGateway>> {
    client
        .get_transit_gateway(&GetTransitGatewayOptions::new(id))
        .await
}

#[async_trait]
impl Resource for GatewayResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        gateway_attributes(
            Schema::new("Transit gateway connecting networks across IBM Cloud")
                .attribute(Attribute::required("name", AttributeType::String))
                .attribute(
                    Attribute::required("location", AttributeType::String)
                        .force_new()
                        .describe("Location of the gateway, such as us-south"),
                )
                .attribute(
                    Attribute::optional_computed("global", AttributeType::Bool)
                        .describe("Route across all regions instead of the local one"),
                )
                .attribute(
                    Attribute::optional_computed("resource_group", AttributeType::String)
                        .force_new(),
                ),
        )
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: GatewayConfig = data.config_as()?;
        let client = meta.transit_gateway.as_ref();

        let mut options = CreateTransitGatewayOptions::new(&config.location, &config.name);
        if let Some(global) = config.global {
            options = options.with_global(global);
        }
        if let Some(rg) = config.resource_group.as_deref().filter(|rg| !rg.is_empty()) {
            options = options.with_resource_group(rg);
        }

        let gateway = client.create_transit_gateway(&options).await?.into_result();
        info!(id = %gateway.id, name = %gateway.name, "Created transit gateway");
        data.set_id(&gateway.id);

        let id = gateway.id.as_str();
        meta.provisioning_poller(&ctx.cancel)
            .wait_for(
                &Target::status_or_fail(&[STATUS_AVAILABLE], &[STATUS_FAILED]),
                || async move {
                    Observation::from_lookup(
                        get_gateway(client, id).await.map(DetailedResponse::into_result),
                    )
                },
            )
            .await?;

        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let id = data.require_id()?.to_string();
        match found(get_gateway(&meta.transit_gateway, &id).await)? {
            Some(gateway) => {
                gateway_to_state(data, &gateway);
                Ok(())
            }
            None => {
                gone(data, TYPE_NAME);
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
        let config: GatewayConfig = data.config_as()?;
        let id = data.require_id()?.to_string();

        let mut options = UpdateTransitGatewayOptions::new(&id);
        let mut changed = false;
        if data.has_change("name") {
            options = options.with_name(&config.name);
            changed = true;
        }
        if let Some(global) = config.global.filter(|_| data.has_change("global")) {
            options = options.with_global(global);
            changed = true;
        }
        if changed {
            meta.transit_gateway.update_transit_gateway(&options).await?;
            info!(id = %id, "Updated transit gateway");
        }

        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let id = data.require_id()?.to_string();
        let client = meta.transit_gateway.as_ref();

        deleted(
            client
                .delete_transit_gateway(&DeleteTransitGatewayOptions::new(&id))
                .await,
        )?;

        let id_ref = id.as_str();
        meta.teardown_poller(&ctx.cancel)
            .wait_for(&Target::Absent, || async move {
                Observation::from_lookup(
                    get_gateway(client, id_ref).await.map(DetailedResponse::into_result),
                )
            })
            .await?;

        info!(id = %id, "Deleted transit gateway");
        data.clear_id();
        Ok(())
    }

    async fn exists(
        &self,
        _ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool> {
        let id = data.require_id()?;
        Ok(found(get_gateway(&meta.transit_gateway, id).await)?.is_some())
    }
}
