//! Resource Implementations
//!
//! Each resource maps Terraform create/read/update/delete onto one API
//! family. Adapters return SDK errors; the provider wraps them with the
//! operation, resource type and ID before turning them into diagnostics.

pub mod en_destination;
pub mod en_smtp;
pub mod en_source;
pub mod en_subscription;
pub mod en_topic;
pub mod lbaas;
pub mod tg_connection;
pub mod tg_connection_action;
pub mod tg_gateway;

use std::sync::Arc;

use async_trait::async_trait;
use ibmcloud_common::{CancellationToken, DetailedResponse, Result};
use tracing::warn;

use crate::diagnostics::Diagnostic;
use crate::meta::ProviderMeta;
use crate::schema::Schema;
use crate::state::{DynamicValue, ResourceData};

/// Per-call context threaded from the provider into adapters
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub cancel: CancellationToken,
}

impl OperationContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

/// Trait for resource operations
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Checks beyond what the schema expresses
    fn validate(&self, _config: &DynamicValue) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Create a new resource
    async fn create(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()>;

    /// Read an existing resource; clears the ID when it no longer exists
    async fn read(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()>;

    /// Update an existing resource
    async fn update(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()>;

    /// Delete a resource
    async fn delete(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()>;

    async fn exists(
        &self,
        ctx: &OperationContext,
        data: &ResourceData,
        meta: &ProviderMeta,
    ) -> Result<bool>;

    /// Adopt an existing remote object; the ID is already set
    async fn import(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()> {
        self.read(ctx, data, meta).await
    }
}

/// Every resource type the provider serves
pub fn all() -> Vec<Arc<dyn Resource>> {
    let mut resources: Vec<Arc<dyn Resource>> = vec![
        Arc::new(tg_gateway::GatewayResource),
        Arc::new(tg_connection::ConnectionResource),
        Arc::new(tg_connection_action::ConnectionActionResource),
        Arc::new(en_topic::TopicResource),
        Arc::new(en_source::SourceResource),
        Arc::new(en_smtp::SmtpConfigurationResource),
        Arc::new(en_smtp::SmtpUserResource),
        Arc::new(lbaas::LoadBalancerResource),
    ];
    resources.extend(
        en_destination::DestinationKind::ALL
            .iter()
            .map(|kind| Arc::new(en_destination::DestinationResource::new(*kind)) as Arc<dyn Resource>),
    );
    resources.extend(
        en_subscription::SubscriptionKind::ALL
            .iter()
            .map(|kind| Arc::new(en_subscription::SubscriptionResource::new(*kind)) as Arc<dyn Resource>),
    );
    resources
}

/// A lookup where "not found" is an answer rather than an error
pub(crate) fn found<T>(result: Result<DetailedResponse<T>>) -> Result<Option<T>> {
    match result {
        Ok(response) => Ok(Some(response.into_result())),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// A delete where "not found" means already gone
pub(crate) fn deleted<T>(result: Result<DetailedResponse<T>>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Drop a resource that disappeared remotely from state
pub(crate) fn gone(data: &mut ResourceData, resource_type: &str) {
    warn!(
        resource_type,
        id = data.id().unwrap_or_default(),
        "Resource no longer exists, removing from state"
    );
    data.clear_id();
}
