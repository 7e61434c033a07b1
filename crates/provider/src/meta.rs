//! Configured clients shared by every adapter call

use std::sync::Arc;

use ibmcloud_common::{
    Authenticator, BearerTokenAuthenticator, CancellationToken, Error, IamAuthenticator, Poller,
    Result, ServiceOptions,
};
use ibmcloud_sdk::{event_notifications, lbaas, transit_gateway};
use ibmcloud_sdk::{EventNotificationsV1, LbaasV1, TransitGatewayApisV1};
use tracing::debug;

use crate::config::ProviderConfig;

/// Immutable set of API clients built once by `configure_provider`
#[derive(Debug)]
pub struct ProviderMeta {
    pub config: ProviderConfig,
    pub transit_gateway: Arc<TransitGatewayApisV1>,
    pub event_notifications: Arc<EventNotificationsV1>,
    pub lbaas: Arc<LbaasV1>,
}

impl ProviderMeta {
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        let authenticator = authenticator_for(&config)?;
        let timeout = config.timeout();

        let options = |name: &str| {
            ServiceOptions::new(name)
                .with_authenticator(authenticator.clone())
                .with_timeout(timeout)
        };

        let mut tg_options = options(transit_gateway::DEFAULT_SERVICE_NAME)
            .with_version(config.transit_gateway_version.clone());
        if let Some(url) = &config.endpoints.transit_gateway {
            tg_options = tg_options.with_url(url.clone());
        }

        let en_url = config.endpoints.event_notifications.clone().unwrap_or_else(|| {
            event_notifications::service_url_for_region(&config.region, config.visibility.is_private())
        });
        let en_options = options(event_notifications::DEFAULT_SERVICE_NAME).with_url(en_url);

        let mut lb_options = options(lbaas::DEFAULT_SERVICE_NAME);
        if let Some(url) = &config.endpoints.lbaas {
            lb_options = lb_options.with_url(url.clone());
        }

        debug!(
            region = %config.region,
            visibility = ?config.visibility,
            "Building service clients"
        );

        Ok(Self {
            transit_gateway: Arc::new(TransitGatewayApisV1::new(tg_options)?),
            event_notifications: Arc::new(EventNotificationsV1::new(en_options)?),
            lbaas: Arc::new(LbaasV1::new(lb_options)?),
            config,
        })
    }

    /// Poller for waiting on asynchronous creation
    pub fn provisioning_poller(&self, cancel: &CancellationToken) -> Poller {
        let polling = &self.config.polling;
        Poller::new(polling.provisioning_interval(), polling.provisioning_attempts)
            .with_cancellation(cancel.clone())
    }

    /// Poller for waiting on asynchronous deletion
    pub fn teardown_poller(&self, cancel: &CancellationToken) -> Poller {
        let polling = &self.config.polling;
        Poller::new(polling.teardown_interval(), polling.teardown_attempts)
            .with_cancellation(cancel.clone())
    }
}

fn authenticator_for(config: &ProviderConfig) -> Result<Arc<dyn Authenticator>> {
    if let Some(key) = config.ibmcloud_api_key.as_deref().filter(|k| !k.is_empty()) {
        let authenticator = match &config.iam_url {
            Some(url) => IamAuthenticator::with_url(key, url.clone()),
            None => IamAuthenticator::new(key),
        };
        return Ok(Arc::new(authenticator));
    }
    if let Some(token) = config.iam_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Arc::new(BearerTokenAuthenticator::new(token)));
    }
    Err(Error::Config(
        "ibmcloud_api_key or iam_token must be set (or IC_API_KEY / IC_IAM_TOKEN)".to_string(),
    ))
}
