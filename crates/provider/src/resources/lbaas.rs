//! Load balancer as a service
//!
//! Provisioning is asynchronous in both directions: creates and updates
//! wait for `ACTIVE`, deletes wait until the load balancer reports `DELETED`
//! or stops being found.

use async_trait::async_trait;
use ibmcloud_common::{DetailedResponse, Error, Observation, Result, Target};
use ibmcloud_sdk::lbaas::{
    CreateLoadBalancerOptions, DeleteLoadBalancerOptions, GetLoadBalancerOptions, HealthMonitor,
    LbaasV1, LoadBalancer, LoadBalancerProtocol, UpdateLoadBalancerOptions, PROVISIONING_ACTIVE,
    PROVISIONING_DELETED, PROVISIONING_FAILED,
};
use serde::Deserialize;
use tracing::info;

use super::{deleted, found, gone, OperationContext, Resource};
use crate::diagnostics::Diagnostic;
use crate::meta::ProviderMeta;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{optional_string_value, string_value, DynamicValue, ResourceData};

pub const TYPE_NAME: &str = "ibm_lbaas";

#[derive(Debug, Deserialize)]
struct LoadBalancerConfig {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    load_balancer_type: Option<String>,
    subnets: Vec<i64>,
    #[serde(default)]
    protocols: Vec<LoadBalancerProtocol>,
    #[serde(default)]
    health_monitors: Option<Vec<HealthMonitor>>,
    #[serde(default)]
    ssl_ciphers: Option<Vec<String>>,
    #[serde(default)]
    use_system_public_ip_pool: Option<bool>,
}

impl LoadBalancerConfig {
    fn check(&self) -> Result<()> {
        if self.subnets.len() != 1 {
            return Err(Error::validation("exactly one subnet must be provided"));
        }
        self.protocols
            .iter()
            .try_for_each(LoadBalancerProtocol::validate)
    }
}

pub(crate) fn protocol_attributes() -> AttributeType {
    use AttributeType::{Number, String as Str};
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::required("frontend_protocol", Str).one_of(&["HTTP", "HTTPS", "TCP"]),
        Attribute::required("frontend_port", Number),
        Attribute::required("backend_protocol", Str).one_of(&["HTTP", "HTTPS", "TCP"]),
        Attribute::required("backend_port", Number),
        Attribute::optional_computed("load_balancing_method", Str).one_of(&[
            "round_robin",
            "weighted_round_robin",
            "least_connection",
        ]),
        Attribute::optional("session_stickiness", Str).one_of(&["SOURCE_IP"]),
        Attribute::optional("max_conn", Number),
        Attribute::optional("tls_certificate_id", Number),
        Attribute::computed("protocol_id", Str),
    ]))
}

pub(crate) fn health_monitor_attributes() -> AttributeType {
    use AttributeType::{Number, String as Str};
    AttributeType::list_of(AttributeType::Object(vec![
        Attribute::required("protocol", Str),
        Attribute::required("port", Number),
        Attribute::optional("interval", Number),
        Attribute::optional("max_retries", Number),
        Attribute::optional("timeout", Number),
        Attribute::optional("url_path", Str),
        Attribute::computed("monitor_id", Str),
    ]))
}

/// Copy a load balancer into state; the ID is set by the caller
pub(crate) fn load_balancer_to_state(data: &mut ResourceData, lb: &LoadBalancer) -> Result<()> {
    data.set("name", string_value(&lb.name));
    data.set("description", optional_string_value(lb.description.as_deref()));
    data.set("type", optional_string_value(lb.load_balancer_type.as_deref()));
    data.set("datacenter", optional_string_value(lb.datacenter.as_deref()));
    data.set("status", optional_string_value(lb.operating_status.as_deref()));
    data.set("provisioning_status", string_value(&lb.provisioning_status));
    data.set("vip", optional_string_value(lb.vip.as_deref()));
    data.set_encoded("subnets", &lb.subnets)?;
    data.set_encoded("protocols", &lb.protocols)?;
    data.set_encoded("health_monitors", &lb.health_monitors)?;
    data.set_encoded("ssl_ciphers", &lb.ssl_ciphers)?;
    if let Some(pool) = lb.use_system_public_ip_pool {
        data.set("use_system_public_ip_pool", DynamicValue::Bool(pool));
    }
    Ok(())
}

async fn get_load_balancer(client: &LbaasV1, id: &str) -> Result<DetailedResponse<LoadBalancer>> {
    client
        .get_load_balancer(&GetLoadBalancerOptions::new(id))
        .await
}

pub struct LoadBalancerResource;

impl LoadBalancerResource {
    async fn wait_active(
        &self,
        ctx: &OperationContext,
        meta: &ProviderMeta,
        id: &str,
    ) -> Result<()> {
        let client = meta.lbaas.as_ref();
        meta.provisioning_poller(&ctx.cancel)
            .wait_for(
                &Target::status_or_fail(&[PROVISIONING_ACTIVE], &[PROVISIONING_FAILED]),
                || async move {
                    Observation::from_lookup(
                        get_load_balancer(client, id)
                            .await
                            .map(DetailedResponse::into_result),
                    )
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for LoadBalancerResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Load balancer as a service")
            .attribute(Attribute::required("name", AttributeType::String).force_new())
            .attribute(Attribute::optional("description", AttributeType::String))
            .attribute(
                Attribute::optional_computed("type", AttributeType::String)
                    .force_new()
                    .one_of(&["PUBLIC", "PRIVATE"]),
            )
            .attribute(
                Attribute::required("subnets", AttributeType::list_of(AttributeType::Number))
                    .force_new()
                    .describe("Exactly one subnet ID"),
            )
            .attribute(Attribute::optional("protocols", protocol_attributes()))
            .attribute(Attribute::optional_computed(
                "health_monitors",
                health_monitor_attributes(),
            ))
            .attribute(Attribute::optional_computed(
                "ssl_ciphers",
                AttributeType::set_of(AttributeType::String),
            ))
            .attribute(
                Attribute::optional("use_system_public_ip_pool", AttributeType::Bool).force_new(),
            )
            .attribute(Attribute::computed("datacenter", AttributeType::String))
            .attribute(Attribute::computed("status", AttributeType::String))
            .attribute(Attribute::computed("provisioning_status", AttributeType::String))
            .attribute(Attribute::computed("vip", AttributeType::String))
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let Ok(config) = config.decode::<LoadBalancerConfig>() else {
            return Vec::new();
        };
        match config.check() {
            Ok(()) => Vec::new(),
            Err(e) => vec![Diagnostic::error("Invalid load balancer", e.to_string())],
        }
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let config: LoadBalancerConfig = data.config_as()?;
        config.check()?;

        let mut options = CreateLoadBalancerOptions::new(&config.name, config.subnets.clone());
        if let Some(lb_type) = config.load_balancer_type.as_deref() {
            options.load_balancer_type = lb_type.to_string();
        }
        options.description = config.description.clone();
        options.protocols = config.protocols.clone();
        options.use_system_public_ip_pool = config.use_system_public_ip_pool;

        let lb = meta
            .lbaas
            .create_load_balancer(&options)
            .await?
            .into_result();
        info!(id = %lb.id, name = %lb.name, "Created load balancer");
        data.set_id(lb.id.clone());

        self.wait_active(ctx, meta, &lb.id).await?;
        self.read(ctx, data, meta).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        let id = data.require_id()?.to_string();
        match found(get_load_balancer(&meta.lbaas, &id).await)? {
            Some(lb) if lb.provisioning_status != PROVISIONING_DELETED => {
                load_balancer_to_state(data, &lb)
            }
            _ => {
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
        let config: LoadBalancerConfig = data.config_as()?;
        config.check()?;
        let id = data.require_id()?.to_string();

        let mut options = UpdateLoadBalancerOptions::new(&id);
        if data.has_change("description") {
            options.description = Some(config.description.unwrap_or_default());
        }
        if data.has_change("protocols") {
            options.protocols = Some(config.protocols);
        }
        if data.has_change("health_monitors") {
            options.health_monitors = config.health_monitors;
        }
        if data.has_change("ssl_ciphers") {
            options.ssl_ciphers = config.ssl_ciphers;
        }

        let changed = options.description.is_some()
            || options.protocols.is_some()
            || options.health_monitors.is_some()
            || options.ssl_ciphers.is_some();
        if changed {
            meta.lbaas.update_load_balancer(&options).await?;
            info!(id = %id, "Updated load balancer");
            self.wait_active(ctx, meta, &id).await?;
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
        let client = meta.lbaas.as_ref();
        deleted(
            client
                .delete_load_balancer(&DeleteLoadBalancerOptions::new(&id))
                .await,
        )?;

        let lb_id = id.as_str();
        meta.teardown_poller(&ctx.cancel)
            .wait_for(&Target::Absent, || async move {
                let lookup = get_load_balancer(client, lb_id)
                    .await
                    .map(DetailedResponse::into_result);
                Ok(match Observation::from_lookup(lookup)? {
                    Observation::Present(lb) if lb.provisioning_status == PROVISIONING_DELETED => {
                        Observation::Absent
                    }
                    other => other,
                })
            })
            .await?;

        info!(id = %id, "Deleted load balancer");
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
        Ok(found(get_load_balancer(&meta.lbaas, id).await)?
            .is_some_and(|lb| lb.provisioning_status != PROVISIONING_DELETED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{int_value, make_state};

    fn protocol(frontend: &str, port: i64) -> DynamicValue {
        make_state(vec![
            ("frontend_protocol", string_value(frontend)),
            ("frontend_port", int_value(port)),
            ("backend_protocol", string_value("HTTP")),
            ("backend_port", int_value(80)),
        ])
    }

    fn config(subnets: Vec<i64>, protocols: Vec<DynamicValue>) -> DynamicValue {
        make_state(vec![
            ("name", string_value("lb-1")),
            (
                "subnets",
                DynamicValue::List(subnets.into_iter().map(int_value).collect()),
            ),
            ("protocols", DynamicValue::List(protocols)),
        ])
    }

    #[test]
    fn test_validate_accepts_http_listener() {
        let diags = LoadBalancerResource.validate(&config(vec![1], vec![protocol("HTTP", 80)]));
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_validate_requires_single_subnet() {
        let diags = LoadBalancerResource.validate(&config(vec![1, 2], vec![]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("exactly one subnet"));
    }

    #[test]
    fn test_validate_rejects_https_without_certificate() {
        let diags = LoadBalancerResource.validate(&config(vec![1], vec![protocol("HTTPS", 443)]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("tls_certificate_id"));
    }

    #[test]
    fn test_validate_rejects_port_out_of_range() {
        let diags = LoadBalancerResource.validate(&config(vec![1], vec![protocol("TCP", 70000)]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("frontend_port"));
    }
}
