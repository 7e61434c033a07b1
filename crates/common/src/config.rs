//! Service client configuration
//!
//! A client is built from [`ServiceOptions`], either filled in by the caller
//! or merged with the per-service environment variables
//! (`<SERVICE>_URL`, `<SERVICE>_AUTH_TYPE`, `<SERVICE>_APIKEY`,
//! `<SERVICE>_BEARER_TOKEN`, `<SERVICE>_AUTH_URL`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AuthType, Authenticator, BearerTokenAuthenticator, IamAuthenticator, NoAuthAuthenticator,
    DEFAULT_IAM_URL,
};
use crate::error::{Error, Result};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for constructing a service client
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Service name, used to derive environment variable names
    pub service_name: String,

    /// Base URL of the service
    pub url: Option<String>,

    pub authenticator: Option<Arc<dyn Authenticator>>,

    /// Per-request timeout
    pub timeout: Duration,

    /// API version date sent as the `version` query parameter
    pub version: Option<String>,

    /// Infrastructure generation sent as the `generation` query parameter
    pub generation: Option<i64>,

    /// Headers attached to every request
    pub headers: HashMap<String, String>,
}

impl ServiceOptions {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            url: None,
            authenticator: None,
            timeout: DEFAULT_TIMEOUT,
            version: None,
            generation: None,
            headers: HashMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Fill unset fields from the process environment
    pub fn merge_external_config(self) -> Result<Self> {
        self.merge_with(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from an arbitrary key lookup.
    ///
    /// An explicit URL or authenticator always wins over the external value.
    pub fn merge_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let external = ExternalConfig::load(&self.service_name, &lookup);

        if self.url.is_none() {
            self.url = external.url.clone();
        }
        if self.authenticator.is_none() {
            self.authenticator = Some(external.authenticator()?);
        }
        Ok(self)
    }
}

/// Values read from the environment for one service
#[derive(Debug, Clone, Default)]
pub struct ExternalConfig {
    pub url: Option<String>,
    pub auth_type: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub auth_url: Option<String>,
}

impl ExternalConfig {
    pub fn load<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            lookup(&env_key(service_name, suffix)).filter(|v| !v.trim().is_empty())
        };
        Self {
            url: get("URL"),
            auth_type: get("AUTH_TYPE"),
            api_key: get("APIKEY"),
            bearer_token: get("BEARER_TOKEN"),
            auth_url: get("AUTH_URL"),
        }
    }

    /// Build the authenticator the external config describes.
    ///
    /// Without an explicit auth type, an API key implies IAM.
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        let auth_type = match &self.auth_type {
            Some(t) => t.parse::<AuthType>()?,
            None if self.api_key.is_some() => AuthType::Iam,
            None => {
                return Err(Error::Config(
                    "no authentication type configured".to_string(),
                ))
            }
        };

        let authenticator: Arc<dyn Authenticator> = match auth_type {
            AuthType::NoAuth => Arc::new(NoAuthAuthenticator),
            AuthType::BearerToken => {
                let token = self.bearer_token.clone().ok_or_else(|| {
                    Error::Config("bearer token authentication requires a token".to_string())
                })?;
                Arc::new(BearerTokenAuthenticator::new(token))
            }
            AuthType::Iam => {
                let api_key = self.api_key.clone().ok_or_else(|| {
                    Error::Config("IAM authentication requires an API key".to_string())
                })?;
                let url = self
                    .auth_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IAM_URL.to_string());
                Arc::new(IamAuthenticator::with_url(api_key, url))
            }
        };
        authenticator.validate()?;
        Ok(authenticator)
    }
}

/// Environment variable name for a service setting, e.g.
/// `("transit_gateway_apis", "URL")` -> `TRANSIT_GATEWAY_APIS_URL`
pub fn env_key(service_name: &str, suffix: &str) -> String {
    let prefix: String = service_name
        .chars()
        .map(|c| match c {
            '-' | '.' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{}_{}", prefix, suffix)
}
