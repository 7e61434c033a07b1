//! Transit Gateway APIs v1
//!
//! Gateways connect VPCs and classic networks across regions. Connections
//! attach a network to a gateway; cross-account connections stay `pending`
//! until approved through a connection action.

use std::collections::HashMap;
use std::sync::Arc;

use ibmcloud_common::{
    DetailedResponse, Error, Method, Result, ServiceOptions, Session, StatusReport, Transport,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{require, StartTokens};

/// Default service URL
pub const DEFAULT_SERVICE_URL: &str = "https://transit.cloud.ibm.com/v1";

/// Service name used for external configuration lookups
pub const DEFAULT_SERVICE_NAME: &str = "transit_gateway_apis";

/// Client for the Transit Gateway APIs
#[derive(Debug)]
pub struct TransitGatewayApisV1 {
    session: Session,
}

impl TransitGatewayApisV1 {
    /// Build a client. The options must carry the API `version` date.
    pub fn new(options: ServiceOptions) -> Result<Self> {
        Ok(Self {
            session: Session::new(Self::prepare(options)?)?,
        })
    }

    /// Build a client over a caller-supplied transport
    pub fn with_transport(options: ServiceOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            session: Session::with_transport(Self::prepare(options)?, transport)?,
        })
    }

    /// Build a client, filling URL and credentials from
    /// `TRANSIT_GATEWAY_APIS_*` environment variables
    pub fn new_using_external_config(options: ServiceOptions) -> Result<Self> {
        Self::new(options.merge_external_config()?)
    }

    fn prepare(mut options: ServiceOptions) -> Result<ServiceOptions> {
        match options.version.as_deref() {
            Some(v) if !v.is_empty() => {}
            _ => return Err(Error::validation("version must be provided")),
        }
        if options.url.is_none() {
            options.url = Some(DEFAULT_SERVICE_URL.to_string());
        }
        Ok(options)
    }

    pub fn service_url(&self) -> String {
        self.session.service_url()
    }

    pub fn set_service_url(&self, url: impl Into<String>) -> Result<()> {
        self.session.set_service_url(url)
    }

    // Transit gateways

    pub async fn list_transit_gateways(
        &self,
        options: &ListTransitGatewaysOptions,
    ) -> Result<DetailedResponse<TransitGatewayCollection>> {
        self.session
            .request(Method::GET, "/transit_gateways", &[])
            .query_opt("limit", options.limit)
            .query_opt("start", options.start.as_deref())
            .headers(&options.headers)
            .send_json()
            .await
    }

    /// Follow `next.start` tokens until every gateway has been collected
    pub async fn list_all_transit_gateways(&self) -> Result<Vec<TransitGateway>> {
        let mut options = ListTransitGatewaysOptions::default();
        let mut gateways = Vec::new();
        let mut tokens = StartTokens::default();
        loop {
            let page = self.list_transit_gateways(&options).await?.into_result();
            gateways.extend(page.transit_gateways);
            match tokens.advance(page.next.and_then(|n| n.start))? {
                Some(start) => options.start = Some(start),
                None => break,
            }
        }
        debug!(count = gateways.len(), "Listed transit gateways");
        Ok(gateways)
    }

    pub async fn create_transit_gateway(
        &self,
        options: &CreateTransitGatewayOptions,
    ) -> Result<DetailedResponse<TransitGateway>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Body<'a> {
            location: &'a str,
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            global: Option<bool>,
            #[serde(skip_serializing_if = "Option::is_none")]
            resource_group: Option<&'a ResourceGroupIdentity>,
        }

        self.session
            .request(Method::POST, "/transit_gateways", &[])
            .headers(&options.headers)
            .json_body(&Body {
                location: &options.location,
                name: &options.name,
                global: options.global,
                resource_group: options.resource_group.as_ref(),
            })
            .send_json()
            .await
    }

    pub async fn get_transit_gateway(
        &self,
        options: &GetTransitGatewayOptions,
    ) -> Result<DetailedResponse<TransitGateway>> {
        require("id", options.id.as_str())?;
        self.session
            .request(Method::GET, "/transit_gateways/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_transit_gateway(
        &self,
        options: &UpdateTransitGatewayOptions,
    ) -> Result<DetailedResponse<TransitGateway>> {
        require("id", options.id.as_str())?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            global: Option<bool>,
        }

        self.session
            .request(Method::PATCH, "/transit_gateways/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .json_body(&Patch {
                name: options.name.as_deref(),
                global: options.global,
            })
            .send_json()
            .await
    }

    pub async fn delete_transit_gateway(
        &self,
        options: &DeleteTransitGatewayOptions,
    ) -> Result<DetailedResponse<()>> {
        require("id", options.id.as_str())?;
        self.session
            .request(Method::DELETE, "/transit_gateways/{id}", &[("id", options.id.as_str())])
            .headers(&options.headers)
            .send_empty()
            .await
    }

    // Connections

    pub async fn list_transit_gateway_connections(
        &self,
        options: &ListTransitGatewayConnectionsOptions,
    ) -> Result<DetailedResponse<TransitConnectionCollection>> {
        require("transit_gateway_id", options.transit_gateway_id.as_str())?;
        self.session
            .request(
                Method::GET,
                "/transit_gateways/{transit_gateway_id}/connections",
                &[("transit_gateway_id", options.transit_gateway_id.as_str())],
            )
            .query_opt("limit", options.limit)
            .query_opt("start", options.start.as_deref())
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn list_all_transit_gateway_connections(
        &self,
        transit_gateway_id: &str,
    ) -> Result<Vec<TransitConnection>> {
        let mut options = ListTransitGatewayConnectionsOptions::new(transit_gateway_id);
        let mut connections = Vec::new();
        let mut tokens = StartTokens::default();
        loop {
            let page = self
                .list_transit_gateway_connections(&options)
                .await?
                .into_result();
            connections.extend(page.connections);
            match tokens.advance(page.next.and_then(|n| n.start))? {
                Some(start) => options.start = Some(start),
                None => break,
            }
        }
        Ok(connections)
    }

    pub async fn create_transit_gateway_connection(
        &self,
        options: &CreateTransitGatewayConnectionOptions,
    ) -> Result<DetailedResponse<TransitConnection>> {
        options.validate()?;

        #[derive(Serialize)]
        struct Body<'a> {
            network_type: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            network_id: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            network_account_id: Option<&'a str>,
        }

        self.session
            .request(
                Method::POST,
                "/transit_gateways/{transit_gateway_id}/connections",
                &[("transit_gateway_id", options.transit_gateway_id.as_str())],
            )
            .headers(&options.headers)
            .json_body(&Body {
                network_type: &options.network_type,
                name: options.name.as_deref(),
                network_id: options.network_id.as_deref(),
                network_account_id: options.network_account_id.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn get_transit_gateway_connection(
        &self,
        options: &GetTransitGatewayConnectionOptions,
    ) -> Result<DetailedResponse<TransitConnection>> {
        require("transit_gateway_id", options.transit_gateway_id.as_str())?;
        require("id", options.id.as_str())?;
        self.session
            .request(
                Method::GET,
                "/transit_gateways/{transit_gateway_id}/connections/{id}",
                &[
                    ("transit_gateway_id", options.transit_gateway_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn update_transit_gateway_connection(
        &self,
        options: &UpdateTransitGatewayConnectionOptions,
    ) -> Result<DetailedResponse<TransitConnection>> {
        require("transit_gateway_id", options.transit_gateway_id.as_str())?;
        require("id", options.id.as_str())?;

        #[derive(Serialize)]
        struct Patch<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<&'a str>,
        }

        self.session
            .request(
                Method::PATCH,
                "/transit_gateways/{transit_gateway_id}/connections/{id}",
                &[
                    ("transit_gateway_id", options.transit_gateway_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&Patch {
                name: options.name.as_deref(),
            })
            .send_json()
            .await
    }

    pub async fn delete_transit_gateway_connection(
        &self,
        options: &DeleteTransitGatewayConnectionOptions,
    ) -> Result<DetailedResponse<()>> {
        require("transit_gateway_id", options.transit_gateway_id.as_str())?;
        require("id", options.id.as_str())?;
        self.session
            .request(
                Method::DELETE,
                "/transit_gateways/{transit_gateway_id}/connections/{id}",
                &[
                    ("transit_gateway_id", options.transit_gateway_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .send_empty()
            .await
    }

    /// Approve or reject a cross-account connection request
    pub async fn create_transit_gateway_connection_actions(
        &self,
        options: &CreateTransitGatewayConnectionActionsOptions,
    ) -> Result<DetailedResponse<()>> {
        require("transit_gateway_id", options.transit_gateway_id.as_str())?;
        require("id", options.id.as_str())?;

        self.session
            .request(
                Method::POST,
                "/transit_gateways/{transit_gateway_id}/connections/{id}/actions",
                &[
                    ("transit_gateway_id", options.transit_gateway_id.as_str()),
                    ("id", options.id.as_str()),
                ],
            )
            .headers(&options.headers)
            .json_body(&serde_json::json!({ "action": options.action.as_str() }))
            .send_empty()
            .await
    }

    // Locations

    pub async fn list_gateway_locations(
        &self,
        options: &ListGatewayLocationsOptions,
    ) -> Result<DetailedResponse<TsCollection>> {
        self.session
            .request(Method::GET, "/locations", &[])
            .headers(&options.headers)
            .send_json()
            .await
    }

    pub async fn get_gateway_location(
        &self,
        options: &GetGatewayLocationOptions,
    ) -> Result<DetailedResponse<TsLocation>> {
        require("name", options.name.as_str())?;
        self.session
            .request(Method::GET, "/locations/{name}", &[("name", options.name.as_str())])
            .headers(&options.headers)
            .send_json()
            .await
    }
}

// Models

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupIdentity {
    pub id: String,
}

/// A transit gateway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitGateway {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub global: Option<bool>,
    #[serde(default)]
    pub resource_group: Option<ResourceGroupReference>,
    /// `available`, `failed`, `pending`, `deleting`
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StatusReport for TransitGateway {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationFirst {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationNext {
    pub href: String,
    #[serde(default)]
    pub start: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitGatewayCollection {
    pub transit_gateways: Vec<TransitGateway>,
    #[serde(default)]
    pub first: Option<PaginationFirst>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub next: Option<PaginationNext>,
}

/// A network attached to a transit gateway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub network_id: Option<String>,
    /// `vpc` or `classic`
    #[serde(default)]
    pub network_type: String,
    #[serde(default)]
    pub network_account_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// `pending`, `approved`, `rejected`, `expired`, `detached`
    #[serde(default)]
    pub request_status: Option<String>,
    /// `attached`, `failed`, `pending`, `deleting`, `detaching`, `detached`
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StatusReport for TransitConnection {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitConnectionCollection {
    pub connections: Vec<TransitConnection>,
    #[serde(default)]
    pub first: Option<PaginationFirst>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub next: Option<PaginationNext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsLocationBasic {
    pub billing_location: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsCollection {
    pub locations: Vec<TsLocationBasic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsLocalLocation {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
}

/// A gateway location with the locations it can reach locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsLocation {
    pub billing_location: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(default)]
    pub local_connection_locations: Vec<TsLocalLocation>,
}

// Options

#[derive(Debug, Clone, Default)]
pub struct ListTransitGatewaysOptions {
    pub limit: Option<i64>,
    pub start: Option<String>,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateTransitGatewayOptions {
    pub location: String,
    pub name: String,
    pub global: Option<bool>,
    pub resource_group: Option<ResourceGroupIdentity>,
    pub headers: HashMap<String, String>,
}

impl CreateTransitGatewayOptions {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = Some(global);
        self
    }

    pub fn with_resource_group(mut self, id: impl Into<String>) -> Self {
        self.resource_group = Some(ResourceGroupIdentity { id: id.into() });
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("location", &self.location)?;
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTransitGatewayOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetTransitGatewayOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTransitGatewayOptions {
    pub id: String,
    pub name: Option<String>,
    pub global: Option<bool>,
    pub headers: HashMap<String, String>,
}

impl UpdateTransitGatewayOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = Some(global);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteTransitGatewayOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteTransitGatewayOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListTransitGatewayConnectionsOptions {
    pub transit_gateway_id: String,
    pub limit: Option<i64>,
    pub start: Option<String>,
    pub headers: HashMap<String, String>,
}

impl ListTransitGatewayConnectionsOptions {
    pub fn new(transit_gateway_id: impl Into<String>) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTransitGatewayConnectionOptions {
    pub transit_gateway_id: String,
    pub network_type: String,
    pub name: Option<String>,
    pub network_id: Option<String>,
    pub network_account_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl CreateTransitGatewayConnectionOptions {
    pub fn new(transit_gateway_id: impl Into<String>, network_type: impl Into<String>) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            network_type: network_type.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    pub fn with_network_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.network_account_id = Some(account_id.into());
        self
    }

    /// A VPC connection needs the VPC CRN; a classic one must not carry it
    pub fn validate(&self) -> Result<()> {
        require("transit_gateway_id", &self.transit_gateway_id)?;
        require("network_type", &self.network_type)?;
        match self.network_type.as_str() {
            "vpc" if self.network_id.as_deref().unwrap_or("").is_empty() => Err(
                Error::validation("network_id must be provided for vpc connections"),
            ),
            "classic" if self.network_id.is_some() => Err(Error::validation(
                "network_id must not be set for classic connections",
            )),
            "vpc" | "classic" => Ok(()),
            other => Err(Error::validation(format!(
                "network_type must be one of vpc, classic; got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTransitGatewayConnectionOptions {
    pub transit_gateway_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetTransitGatewayConnectionOptions {
    pub fn new(transit_gateway_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTransitGatewayConnectionOptions {
    pub transit_gateway_id: String,
    pub id: String,
    pub name: Option<String>,
    pub headers: HashMap<String, String>,
}

impl UpdateTransitGatewayConnectionOptions {
    pub fn new(transit_gateway_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteTransitGatewayConnectionOptions {
    pub transit_gateway_id: String,
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteTransitGatewayConnectionOptions {
    pub fn new(transit_gateway_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Decision on a pending cross-account connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Approve,
    Reject,
}

impl ConnectionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionAction::Approve => "approve",
            ConnectionAction::Reject => "reject",
        }
    }
}

impl std::str::FromStr for ConnectionAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(ConnectionAction::Approve),
            "reject" => Ok(ConnectionAction::Reject),
            other => Err(Error::validation(format!(
                "action must be one of approve, reject; got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTransitGatewayConnectionActionsOptions {
    pub transit_gateway_id: String,
    pub id: String,
    pub action: ConnectionAction,
    pub headers: HashMap<String, String>,
}

impl CreateTransitGatewayConnectionActionsOptions {
    pub fn new(
        transit_gateway_id: impl Into<String>,
        id: impl Into<String>,
        action: ConnectionAction,
    ) -> Self {
        Self {
            transit_gateway_id: transit_gateway_id.into(),
            id: id.into(),
            action,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListGatewayLocationsOptions {
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetGatewayLocationOptions {
    pub name: String,
    pub headers: HashMap<String, String>,
}

impl GetGatewayLocationOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_required() {
        let err = TransitGatewayApisV1::new(ServiceOptions::new(DEFAULT_SERVICE_NAME)).unwrap_err();
        assert_eq!(err.kind(), ibmcloud_common::ErrorKind::Validation);
    }

    #[test]
    fn test_default_url() {
        let client = TransitGatewayApisV1::new(
            ServiceOptions::new(DEFAULT_SERVICE_NAME).with_version("2021-03-31"),
        )
        .unwrap();
        assert_eq!(client.service_url(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_connection_options_validation() {
        assert!(CreateTransitGatewayConnectionOptions::new("gw", "vpc")
            .validate()
            .is_err());
        assert!(CreateTransitGatewayConnectionOptions::new("gw", "vpc")
            .with_network_id("crn:v1:vpc")
            .validate()
            .is_ok());
        assert!(CreateTransitGatewayConnectionOptions::new("gw", "classic")
            .validate()
            .is_ok());
        assert!(CreateTransitGatewayConnectionOptions::new("gw", "directlink")
            .validate()
            .is_err());
    }

    #[test]
    fn test_gateway_decodes_partial_body() {
        let gateway: TransitGateway = serde_json::from_str(
            r#"{"id":"ef4dcb1a","name":"my-transit-gateway","status":"available"}"#,
        )
        .unwrap();
        assert_eq!(gateway.status(), Some("available"));
        assert!(gateway.location.is_none());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            "approve".parse::<ConnectionAction>().unwrap(),
            ConnectionAction::Approve
        );
        assert!("maybe".parse::<ConnectionAction>().is_err());
    }
}
