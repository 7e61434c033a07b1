//! Load balancer lookup by name

use async_trait::async_trait;
use ibmcloud_common::Result;
use serde::Deserialize;

use super::{no_match, DataSource};
use crate::meta::ProviderMeta;
use crate::resources::lbaas::{health_monitor_attributes, load_balancer_to_state, protocol_attributes};
use crate::resources::OperationContext;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ResourceData;

pub const TYPE_NAME: &str = "ibm_lbaas";

#[derive(Debug, Deserialize)]
struct LoadBalancerLookup {
    name: String,
}

pub struct LoadBalancerDataSource;

#[async_trait]
impl DataSource for LoadBalancerDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        use AttributeType::{Bool, Number, String as Str};
        Schema::new("Look up a load balancer by name")
            .attribute(Attribute::required("name", Str))
            .attribute(Attribute::computed("description", Str))
            .attribute(Attribute::computed("type", Str))
            .attribute(Attribute::computed("subnets", AttributeType::list_of(Number)))
            .attribute(Attribute::computed("protocols", protocol_attributes()))
            .attribute(Attribute::computed("health_monitors", health_monitor_attributes()))
            .attribute(Attribute::computed("ssl_ciphers", AttributeType::set_of(Str)))
            .attribute(Attribute::computed("use_system_public_ip_pool", Bool))
            .attribute(Attribute::computed("datacenter", Str))
            .attribute(Attribute::computed("status", Str))
            .attribute(Attribute::computed("provisioning_status", Str))
            .attribute(Attribute::computed("vip", Str))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let LoadBalancerLookup { name } = data.config_as()?;
        let lb = meta
            .lbaas
            .list_all_load_balancers()
            .await?
            .into_iter()
            .find(|lb| lb.name == name)
            .ok_or_else(|| no_match("load balancer", &name))?;
        data.set_id(lb.id.clone());
        load_balancer_to_state(data, &lb)
    }
}
