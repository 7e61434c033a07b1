//! Load Balancer as a Service v1
//!
//! Classic-infrastructure load balancers. Changes are applied
//! asynchronously: the load balancer reports `*_PENDING` provisioning
//! status until the change lands and `ACTIVE` afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use ibmcloud_common::{
    DetailedResponse, Error, Method, Result, ServiceOptions, Session, StatusReport, Transport,
};
use serde::{Deserialize, Serialize};

use crate::{require, StartTokens};

/// Default service URL
pub const DEFAULT_SERVICE_URL: &str = "https://lbaas.cloud.ibm.com/v1";

/// Service name used for external configuration lookups
pub const DEFAULT_SERVICE_NAME: &str = "lbaas";

/// API version date sent when the caller does not choose one
pub const DEFAULT_VERSION: &str = "2021-03-31";

/// Infrastructure generation sent on every request
pub const GENERATION: i64 = 2;

pub const PROVISIONING_ACTIVE: &str = "ACTIVE";
pub const PROVISIONING_DELETED: &str = "DELETED";
pub const PROVISIONING_FAILED: &str = "FAILED";

/// Client for the LBaaS API
#[derive(Debug)]
pub struct LbaasV1 {
    session: Session,
}

impl LbaasV1 {
    pub fn new(options: ServiceOptions) -> Result<Self> {
        Ok(Self {
            session: Session::new(Self::prepare(options))?,
        })
    }

    pub fn with_transport(options: ServiceOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            session: Session::with_transport(Self::prepare(options), transport)?,
        })
    }

    /// Build a client from `LBAAS_*` environment variables
    pub fn new_using_external_config(options: ServiceOptions) -> Result<Self> {
        Self::new(options.merge_external_config()?)
    }

    fn prepare(mut options: ServiceOptions) -> ServiceOptions {
        if options.url.is_none() {
            options.url = Some(DEFAULT_SERVICE_URL.to_string());
        }
        if options.version.is_none() {
            options.version = Some(DEFAULT_VERSION.to_string());
        }
        options.generation = Some(GENERATION);
        options
    }

    pub fn service_url(&self) -> String {
        self.session.service_url()
    }

    pub fn set_service_url(&self, url: impl Into<String>) -> Result<()> {
        self.session.set_service_url(url)
    }

    pub async fn list_load_balancers(
        &self,
        options: &ListLoadBalancersOptions,
    ) -> Result<DetailedResponse<LoadBalancerCollection>> {
        self.session
            .request(Method::GET, "/load_balancers", &[])
            .query_opt("limit", options.limit)
            .query_opt("start", options.start.as_deref())
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn list_all_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        let mut options = ListLoadBalancersOptions::default();
        let mut all = Vec::new();
        let mut tokens = StartTokens::default();
        loop {
            let page = self.list_load_balancers(&options).await?.into_result();
            all.extend(page.load_balancers);
            match tokens.advance(page.next.and_then(|n| n.start))? {
                Some(start) => options.start = Some(start),
                None => break,
            }
        }
        Ok(all)
    }

    pub async fn create_load_balancer(
        &self,
        options: &CreateLoadBalancerOptions,
    ) -> Result<DetailedResponse<LoadBalancer>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
            subnets: &'a [i64],
            #[serde(rename = "type")]
            load_balancer_type: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "no_protocols")]
            protocols: &'a [LoadBalancerProtocol],
            #[serde(skip_serializing_if = "Option::is_none")]
            use_system_public_ip_pool: Option<bool>,
        }

        self.session
            .request(Method::POST, "/load_balancers", &[])
            .headers(&options.headers)
            .json_body(&Body {
                name: &options.name,
                subnets: &options.subnets,
                load_balancer_type: &options.load_balancer_type,
                description: options.description.as_deref(),
                protocols: &options.protocols,
                use_system_public_ip_pool: options.use_system_public_ip_pool,
            })
            .send_json()
            .await
    }

    pub async fn get_load_balancer(
        &self,
        options: &GetLoadBalancerOptions,
    ) -> Result<DetailedResponse<LoadBalancer>> {
        require("id", &options.id)?;
        self.session
            .request(Method::GET, "/load_balancers/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_load_balancer(
        &self,
        options: &UpdateLoadBalancerOptions,
    ) -> Result<DetailedResponse<LoadBalancer>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            protocols: Option<&'a Vec<LoadBalancerProtocol>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            health_monitors: Option<&'a Vec<HealthMonitor>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            ssl_ciphers: Option<&'a Vec<String>>,
        }

        self.session
            .request(Method::PATCH, "/load_balancers/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .json_body(&Patch {
                description: options.description.as_deref(),
                protocols: options.protocols.as_ref(),
                health_monitors: options.health_monitors.as_ref(),
                ssl_ciphers: options.ssl_ciphers.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_load_balancer(
        &self,
        options: &DeleteLoadBalancerOptions,
    ) -> Result<DetailedResponse<()>> {
        require("id", &options.id)?;
        self.session
            .request(Method::DELETE, "/load_balancers/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .send_empty()
            .await
    }
}

// Models

const PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "TCP"];
const METHODS: &[&str] = &["round_robin", "weighted_round_robin", "least_connection"];

/// A frontend/backend listener pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadBalancerProtocol {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_id: Option<String>,
    pub frontend_protocol: String,
    pub frontend_port: i64,
    pub backend_protocol: String,
    pub backend_port: i64,
    #[serde(default = "default_method")]
    pub load_balancing_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_stickiness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_conn: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_certificate_id: Option<i64>,
}

fn no_protocols(protocols: &&[LoadBalancerProtocol]) -> bool {
    protocols.is_empty()
}

fn default_method() -> String {
    "round_robin".to_string()
}

impl LoadBalancerProtocol {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("frontend_protocol", &self.frontend_protocol),
            ("backend_protocol", &self.backend_protocol),
        ] {
            if !PROTOCOLS.contains(&value.as_str()) {
                return Err(Error::validation(format!(
                    "{} must be one of {}; got {}",
                    field,
                    PROTOCOLS.join(", "),
                    value
                )));
            }
        }
        for (field, port) in [
            ("frontend_port", self.frontend_port),
            ("backend_port", self.backend_port),
        ] {
            if !(1..=65535).contains(&port) {
                return Err(Error::validation(format!(
                    "{} must be between 1 and 65535; got {}",
                    field, port
                )));
            }
        }
        if !METHODS.contains(&self.load_balancing_method.as_str()) {
            return Err(Error::validation(format!(
                "load_balancing_method must be one of {}; got {}",
                METHODS.join(", "),
                self.load_balancing_method
            )));
        }
        if let Some(max_conn) = self.max_conn {
            if !(1..=64000).contains(&max_conn) {
                return Err(Error::validation(format!(
                    "max_conn must be between 1 and 64000; got {}",
                    max_conn
                )));
            }
        }
        match (self.frontend_protocol.as_str(), self.tls_certificate_id) {
            ("HTTPS", None) => Err(Error::validation(
                "tls_certificate_id is required for HTTPS frontends",
            )),
            ("HTTPS", Some(_)) | (_, None) => Ok(()),
            (other, Some(_)) => Err(Error::validation(format!(
                "tls_certificate_id is only valid for HTTPS frontends, not {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthMonitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_id: Option<String>,
    pub protocol: String,
    pub port: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
}

/// A load balancer as returned by every operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datacenter: Option<String>,
    /// `PUBLIC` or `PRIVATE`
    #[serde(default, rename = "type")]
    pub load_balancer_type: Option<String>,
    #[serde(default)]
    pub subnets: Vec<i64>,
    #[serde(default)]
    pub protocols: Vec<LoadBalancerProtocol>,
    #[serde(default)]
    pub health_monitors: Vec<HealthMonitor>,
    #[serde(default)]
    pub ssl_ciphers: Vec<String>,
    #[serde(default)]
    pub use_system_public_ip_pool: Option<bool>,
    /// `ONLINE` or `OFFLINE`
    #[serde(default)]
    pub operating_status: Option<String>,
    #[serde(default)]
    pub provisioning_status: String,
    /// Virtual IP hostname
    #[serde(default)]
    pub vip: Option<String>,
}

impl StatusReport for LoadBalancer {
    fn status(&self) -> Option<&str> {
        Some(&self.provisioning_status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerNext {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerCollection {
    pub load_balancers: Vec<LoadBalancer>,
    #[serde(default)]
    pub next: Option<LoadBalancerNext>,
}

// Options

#[derive(Debug, Clone, Default)]
pub struct ListLoadBalancersOptions {
    pub limit: Option<i64>,
    pub start: Option<String>,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateLoadBalancerOptions {
    pub name: String,
    pub subnets: Vec<i64>,
    /// `PUBLIC` or `PRIVATE`
    pub load_balancer_type: String,
    pub description: Option<String>,
    pub protocols: Vec<LoadBalancerProtocol>,
    pub use_system_public_ip_pool: Option<bool>,
    pub headers: HashMap<String, String>,
}

impl CreateLoadBalancerOptions {
    pub fn new(name: impl Into<String>, subnets: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            subnets,
            load_balancer_type: "PUBLIC".to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        if self.subnets.len() != 1 {
            return Err(Error::validation("exactly one subnet must be provided"));
        }
        if self.load_balancer_type != "PUBLIC" && self.load_balancer_type != "PRIVATE" {
            return Err(Error::validation(format!(
                "type must be one of PUBLIC, PRIVATE; got {}",
                self.load_balancer_type
            )));
        }
        self.protocols.iter().try_for_each(LoadBalancerProtocol::validate)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetLoadBalancerOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetLoadBalancerOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLoadBalancerOptions {
    pub id: String,
    pub description: Option<String>,
    pub protocols: Option<Vec<LoadBalancerProtocol>>,
    pub health_monitors: Option<Vec<HealthMonitor>>,
    pub ssl_ciphers: Option<Vec<String>>,
    pub headers: HashMap<String, String>,
}

impl UpdateLoadBalancerOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("id", &self.id)?;
        if let Some(protocols) = &self.protocols {
            protocols.iter().try_for_each(LoadBalancerProtocol::validate)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteLoadBalancerOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteLoadBalancerOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
