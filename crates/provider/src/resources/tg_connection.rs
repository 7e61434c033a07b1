//! Transit gateway connection resource
//!
//! ID is `<gateway_id>/<connection_id>`.

use async_trait::async_trait;
use ibmcloud_common::{join_id, split_id, DetailedResponse, Observation, Result, Target};
use ibmcloud_sdk::transit_gateway::{
    CreateTransitGatewayConnectionOptions, DeleteTransitGatewayConnectionOptions,
    GetTransitGatewayConnectionOptions, TransitConnection, TransitGatewayApisV1,
    UpdateTransitGatewayConnectionOptions,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{optional_string_value, string_value, ResourceData};

pub const TYPE_NAME: &str = "ibm_tg_connection";

pub const STATUS_ATTACHED: &str = "attached";
/// Cross-account connections wait here until the network owner approves
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Deserialize)]
struct ConnectionConfig {
    gateway: String,
    network_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    network_id: Option<String>,
    #[serde(default)]
    network_account_id: Option<String>,
}

pub struct ConnectionResource;

async fn get_connection(
    client: &TransitGatewayApisV1,
    gateway_id: &str,
    id: &str,
) -> Result<DetailedResponse<TransitConnection>> {
    client
        .get_transit_gateway_connection(&GetTransitGatewayConnectionOptions::new(gateway_id, id))
        .await
}

fn connection_to_state(data: &mut ResourceData, gateway_id: &str, conn: &TransitConnection) {
    data.set("gateway", string_value(gateway_id));
    data.set("connection_id", string_value(&conn.id));
    data.set("name", string_value(&conn.name));
    data.set("network_type", string_value(&conn.network_type));
    data.set("network_id", optional_string_value(conn.network_id.as_deref()));
    data.set(
        "network_account_id",
        optional_string_value(conn.network_account_id.as_deref()),
    );
    data.set("status", string_value(&conn.status));
    data.set("request_status", optional_string_value(conn.request_status.as_deref()));
    data.set("created_at", optional_string_value(conn.created_at.as_deref()));
    data.set("updated_at", optional_string_value(conn.updated_at.as_deref()));
}

#[async_trait]
impl Resource for ConnectionResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Connection between a transit gateway and a network")
            .attribute(
                Attribute::required("gateway", AttributeType::String)
                    .force_new()
                    .describe("Transit gateway ID"),
            )
            .attribute(
                Attribute::required("network_type", AttributeType::String)
                    .force_new()
                    .one_of(&["classic", "vpc"]),
            )
            .attribute(Attribute::optional_computed("name", AttributeType::String))
            .attribute(
                Attribute::optional("network_id", AttributeType::String)
                    .force_new()
                    .describe("CRN of the VPC; not used for classic connections"),
            )
            .attribute(
                Attribute::optional("network_account_id", AttributeType::String)
                    .force_new()
                    .describe("Account owning the network, for cross-account connections"),
            )
            .attribute(Attribute::computed("connection_id", AttributeType::String))
            .attribute(Attribute::computed("status", AttributeType::String))
            .attribute(Attribute::computed("request_status", AttributeType::String))
            .attribute(Attribute::computed("created_at", AttributeType::String))
            .attribute(Attribute::computed("updated_at", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: ConnectionConfig = data.config_as()?;
        let client = meta.transit_gateway.as_ref();

        let mut options =
            CreateTransitGatewayConnectionOptions::new(&config.gateway, &config.network_type);
        if let Some(name) = config.name.as_deref().filter(|n| !n.is_empty()) {
            options = options.with_name(name);
        }
        if let Some(network_id) = config.network_id.as_deref().filter(|n| !n.is_empty()) {
            options = options.with_network_id(network_id);
        }
        let cross_account = config
            .network_account_id
            .as_deref()
            .filter(|a| !a.is_empty());
        if let Some(account) = cross_account {
            options = options.with_network_account_id(account);
        }

        let conn = client
            .create_transit_gateway_connection(&options)
            .await?
            .into_result();
        info!(gateway = %config.gateway, id = %conn.id, "Created transit gateway connection");
        data.set_id(join_id(&[config.gateway.as_str(), conn.id.as_str()]));

        let ready: &[&str] = if cross_account.is_some() {
            &[STATUS_ATTACHED, STATUS_PENDING]
        } else {
            &[STATUS_ATTACHED]
        };
        let (gateway_id, id) = (config.gateway.as_str(), conn.id.as_str());
        meta.provisioning_poller(&ctx.cancel)
            .wait_for(&Target::status_or_fail(ready, &[STATUS_FAILED]), || async move {
                Observation::from_lookup(
                    get_connection(client, gateway_id, id)
                        .await
                        .map(DetailedResponse::into_result),
                )
            })
            .await?;

        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [gateway_id, id] = split_id::<2>(data.require_id()?)?;
        match found(get_connection(&meta.transit_gateway, &gateway_id, &id).await)? {
            Some(conn) => {
                connection_to_state(data, &gateway_id, &conn);
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
        let config: ConnectionConfig = data.config_as()?;
        let [gateway_id, id] = split_id::<2>(data.require_id()?)?;

        if let Some(name) = config.name.filter(|_| data.has_change("name")) {
            let options = UpdateTransitGatewayConnectionOptions::new(&gateway_id, &id).with_name(name);
            meta.transit_gateway
                .update_transit_gateway_connection(&options)
                .await?;
            info!(gateway = %gateway_id, id = %id, "Renamed transit gateway connection");
        }

        self.read(ctx, data, meta).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let [gateway_id, id] = split_id::<2>(data.require_id()?)?;
        let client = meta.transit_gateway.as_ref();

        deleted(
            client
                .delete_transit_gateway_connection(&DeleteTransitGatewayConnectionOptions::new(
                    &gateway_id,
                    &id,
                ))
                .await,
        )?;

        let (gw, conn) = (gateway_id.as_str(), id.as_str());
        meta.teardown_poller(&ctx.cancel)
            .wait_for(&Target::Absent, || async move {
                Observation::from_lookup(
                    get_connection(client, gw, conn)
                        .await
                        .map(DetailedResponse::into_result),
                )
            })
            .await?;

        info!(gateway = %gateway_id, id = %id, "Deleted transit gateway connection");
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
        Ok(found(get_connection(&meta.transit_gateway, &gateway_id, &id).await)?.is_some())
    }
}
