//! Approve or reject a cross-account transit gateway connection.
//!
//! The action is a one-shot call: deleting the resource only forgets it.

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, Result};
use ibmcloud_sdk::transit_gateway::{
    ConnectionAction, CreateTransitGatewayConnectionActionsOptions,
    GetTransitGatewayConnectionOptions,
};
use serde::Deserialize;
use tracing::info;

use super::{found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{optional_string_value, string_value, ResourceData};

pub const TYPE_NAME: &str = "ibm_tg_connection_action";

#[derive(Debug, Deserialize)]
struct ActionConfig {
    gateway: String,
    connection_id: String,
    action: String,
}

pub struct ConnectionActionResource;

#[async_trait]
impl Resource for ConnectionActionResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Approve or reject a pending cross-account connection")
            .attribute(Attribute::required("gateway", AttributeType::String).force_new())
            .attribute(Attribute::required("connection_id", AttributeType::String).force_new())
            .attribute(
                Attribute::required("action", AttributeType::String)
                    .force_new()
                    .one_of(&["approve", "reject"]),
            )
            .attribute(Attribute::computed("status", AttributeType::String))
            .attribute(Attribute::computed("request_status", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: ActionConfig = data.config_as()?;
        let action: ConnectionAction = config.action.parse()?;

        meta.transit_gateway
            .create_transit_gateway_connection_actions(
                &CreateTransitGatewayConnectionActionsOptions::new(
                    &config.gateway,
                    &config.connection_id,
                    action,
                ),
            )
            .await?;
        info!(
            gateway = %config.gateway,
            connection = %config.connection_id,
            action = action.as_str(),
            "Applied connection action"
        );

        data.set_id(join_id(&[config.gateway.as_str(), config.connection_id.as_str()]));
        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [gateway_id, id] = split_id::<2>(data.require_id()?)?;
        let lookup = meta
            .transit_gateway
            .get_transit_gateway_connection(&GetTransitGatewayConnectionOptions::new(
                &gateway_id,
                &id,
            ))
            .await;
        match found(lookup)? {
            Some(conn) => {
                data.set("gateway", string_value(&gateway_id));
                data.set("connection_id", string_value(&conn.id));
                data.set("status", string_value(&conn.status));
                data.set(
                    "request_status",
                    optional_string_value(conn.request_status.as_deref()),
                );
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
        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        _meta: &ProviderMeta,
    ) -> Result<()> {
        data.clear_id();
        Ok(())
    }

    async fn exists(
        &self,
        _ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool> {
        let [gateway_id, id] = split_id::<2>(data.require_id()?)?;
        let lookup = meta
            .transit_gateway
            .get_transit_gateway_connection(&GetTransitGatewayConnectionOptions::new(
                &gateway_id,
                &id,
            ))
            .await;
        Ok(found(lookup)?.is_some())
    }
}
