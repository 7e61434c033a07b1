//! Data sources
//!
//! Read-only lookups. Each data source shares its state mapping with the
//! resource of the same family so both report the same attributes.

pub mod event_notifications;
pub mod lbaas;
pub mod transit_gateway;

use std::sync::Arc;

use async_trait::async_trait;
use ibmcloud_common::{Error, Result};

use crate::meta::ProviderMeta;
use crate::resources::OperationContext;
use crate::schema::Schema;
use crate::state::ResourceData;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Fill `data` from the service; the data source must set an ID
    async fn read(
        &self,
        ctx: &OperationContext,
        data: &mut ResourceData,
        meta: &ProviderMeta,
    ) -> Result<()>;
}

/// Every data source type the provider serves
pub fn all() -> Vec<Arc<dyn DataSource>> {
    vec![
        Arc::new(transit_gateway::GatewayDataSource),
        Arc::new(transit_gateway::GatewaysDataSource),
        Arc::new(transit_gateway::LocationDataSource),
        Arc::new(transit_gateway::LocationsDataSource),
        Arc::new(event_notifications::DestinationsDataSource),
        Arc::new(event_notifications::TopicDataSource),
        Arc::new(event_notifications::TopicsDataSource),
        Arc::new(event_notifications::SubscriptionsDataSource),
        Arc::new(event_notifications::SourceDataSource),
        Arc::new(lbaas::LoadBalancerDataSource),
    ]
}

/// A lookup by name that matched nothing
pub(crate) fn no_match(kind: &str, name: &str) -> Error {
    Error::NotFound {
        message: format!("no {} named '{}'", kind, name),
    }
}
