//! Transit gateway and location lookups

use async_trait::async_trait;
use ibmcloud_common::Result;
use ibmcloud_sdk::transit_gateway::{GetGatewayLocationOptions, ListGatewayLocationsOptions};
use serde::Deserialize;
use serde_json::json;

use super::{no_match, DataSource};
use crate::meta::ProviderMeta;
use crate::resources::tg_gateway::{gateway_attributes, gateway_to_state};
use crate::resources::OperationContext;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{string_value, ResourceData};

pub const GATEWAY_TYPE_NAME: &str = "ibm_tg_gateway";
pub const GATEWAYS_TYPE_NAME: &str = "ibm_tg_gateways";
pub const LOCATION_TYPE_NAME: &str = "ibm_tg_location";
pub const LOCATIONS_TYPE_NAME: &str = "ibm_tg_locations";

#[derive(Debug, Deserialize)]
struct ByName {
    name: String,
}

fn connection_list() -> AttributeType {
    use AttributeType::String as Str;
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::computed("id", Str),
        Attribute::computed("name", Str),
        Attribute::computed("network_type", Str),
        Attribute::computed("network_id", Str),
        Attribute::computed("network_account_id", Str),
        Attribute::computed("status", Str),
        Attribute::computed("request_status", Str),
        Attribute::computed("created_at", Str),
        Attribute::computed("updated_at", Str),
    ]))
}

fn location_list(local: bool) -> AttributeType {
    use AttributeType::String as Str;
    let mut fields = vec![
        Attribute::computed("name", Str),
        Attribute::computed("type", Str),
    ];
    fields.push(if local {
        Attribute::computed("display_name", Str)
    } else {
        Attribute::computed("billing_location", Str)
    });
    AttributeType::list_of(AttributeType::Object(fields))
}

/// A single gateway by name, with its connections
pub struct GatewayDataSource;

#[async_trait]
impl DataSource for GatewayDataSource {
    fn type_name(&self) -> &'static str {
        GATEWAY_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        gateway_attributes(
            Schema::new("Look up a transit gateway by name")
                .attribute(Attribute::required("name", AttributeType::String))
                .attribute(Attribute::computed("location", AttributeType::String))
                .attribute(Attribute::computed("global", AttributeType::Bool))
                .attribute(Attribute::computed("resource_group", AttributeType::String))
                .attribute(Attribute::computed("connections", connection_list())),
        )
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let ByName { name } = data.config_as()?;
        let gateway = meta
            .transit_gateway
            .list_all_transit_gateways()
            .await?
            .into_iter()
            .find(|g| g.name == name)
            .ok_or_else(|| no_match("transit gateway", &name))?;

        let connections = meta
            .transit_gateway
            .list_all_transit_gateway_connections(&gateway.id)
            .await?;

        data.set_id(gateway.id.clone());
        gateway_to_state(data, &gateway);
        data.set_encoded("connections", &connections)
    }
}

/// Every gateway in the account
pub struct GatewaysDataSource;

#[async_trait]
impl DataSource for GatewaysDataSource {
    fn type_name(&self) -> &'static str {
        GATEWAYS_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::{Bool, String as Str};
        Schema::new("List transit gateways").attribute(Attribute::computed(
            "transit_gateways",
            AttributeType::list_of(AttributeType::Object(vec![
                Attribute::computed("id", Str),
                Attribute::computed("crn", Str),
                Attribute::computed("name", Str),
                Attribute::computed("location", Str),
                Attribute::computed("global", Bool),
                Attribute::computed("resource_group", Str),
                Attribute::computed("status", Str),
                Attribute::computed("created_at", Str),
                Attribute::computed("updated_at", Str),
            ])),
        ))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let gateways = meta.transit_gateway.list_all_transit_gateways().await?;
        let items: Vec<serde_json::Value> = gateways
            .iter()
            .map(|g| {
                json!({
                    "id": g.id,
                    "crn": g.crn,
                    "name": g.name,
                    "location": g.location,
                    "global": g.global.unwrap_or(false),
                    "resource_group": g.resource_group.as_ref().map(|rg| rg.id.as_str()),
                    "status": g.status,
                    "created_at": g.created_at,
                    "updated_at": g.updated_at,
                })
            })
            .collect();
        data.set_id(GATEWAYS_TYPE_NAME);
        data.set_encoded("transit_gateways", &items)
    }
}

/// One location and the locations reachable from it locally
pub struct LocationDataSource;

#[async_trait]
impl DataSource for LocationDataSource {
    fn type_name(&self) -> &'static str {
        LOCATION_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Look up a transit gateway location")
            .attribute(Attribute::required("name", AttributeType::String))
            .attribute(Attribute::computed("billing_location", AttributeType::String))
            .attribute(Attribute::computed("type", AttributeType::String))
            .attribute(Attribute::computed(
                "local_connection_locations",
                location_list(true),
            ))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let ByName { name } = data.config_as()?;
        let location = meta
            .transit_gateway
            .get_gateway_location(&GetGatewayLocationOptions::new(&name))
            .await?
            .into_result();

        data.set_id(location.name.clone());
        data.set("name", string_value(&location.name));
        data.set("billing_location", string_value(&location.billing_location));
        data.set("type", string_value(&location.location_type));
        data.set_encoded(
            "local_connection_locations",
            &location.local_connection_locations,
        )
    }
}

/// Every location a gateway can be created in
pub struct LocationsDataSource;

#[async_trait]
impl DataSource for LocationsDataSource {
    fn type_name(&self) -> &'static str {
        LOCATIONS_TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("List transit gateway locations")
            .attribute(Attribute::computed("locations", location_list(false)))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let collection = meta
            .transit_gateway
            .list_gateway_locations(&ListGatewayLocationsOptions::default())
            .await?
            .into_result();
        data.set_id(LOCATIONS_TYPE_NAME);
        data.set_encoded("locations", &collection.locations)
    }
}
