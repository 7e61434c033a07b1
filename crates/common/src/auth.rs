//! Request authenticators
//!
//! Every request carries an `Authorization` header produced by one of these.
//! The IAM authenticator exchanges an API key for a bearer token and caches
//! it until shortly before expiry.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Default IAM endpoint used for API key exchange
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const IAM_TOKEN_PATH: &str = "/identity/token";
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Supported authentication schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    NoAuth,
    BearerToken,
    Iam,
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "noauth" => Ok(AuthType::NoAuth),
            "bearertoken" => Ok(AuthType::BearerToken),
            "iam" => Ok(AuthType::Iam),
            other => Err(Error::Config(format!(
                "unrecognized authentication type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::NoAuth => write!(f, "noauth"),
            AuthType::BearerToken => write!(f, "bearerToken"),
            AuthType::Iam => write!(f, "iam"),
        }
    }
}

/// Produces the `Authorization` header value for outgoing requests
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    fn auth_type(&self) -> AuthType;

    /// Check the authenticator's own configuration
    fn validate(&self) -> Result<()>;

    /// Header value to attach, or `None` when the scheme sends nothing
    async fn authorization(&self) -> Result<Option<String>>;
}

/// Sends no credentials; used against mock servers and local endpoints
#[derive(Debug, Default, Clone)]
pub struct NoAuthAuthenticator;

#[async_trait]
impl Authenticator for NoAuthAuthenticator {
    fn auth_type(&self) -> AuthType {
        AuthType::NoAuth
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn authorization(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Sends a caller-supplied bearer token verbatim
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    token: String,
}

impl BearerTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    fn auth_type(&self) -> AuthType {
        AuthType::BearerToken
    }

    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("bearer token must not be empty".to_string()));
        }
        Ok(())
    }

    async fn authorization(&self) -> Result<Option<String>> {
        let token = self.token.trim_start_matches("Bearer ").trim();
        Ok(Some(format!("Bearer {}", token)))
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expiration: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

/// Exchanges an IBM Cloud API key for an IAM access token
pub struct IamAuthenticator {
    api_key: String,
    url: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, DEFAULT_IAM_URL)
    }

    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            url: url.into(),
            client,
            cached: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.ends_with(IAM_TOKEN_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, IAM_TOKEN_PATH)
        }
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.cached.lock();
        guard
            .as_ref()
            .filter(|t| Utc::now() < t.refresh_at)
            .map(|t| t.access_token.clone())
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let body = format!(
            "grant_type={}&apikey={}",
            urlencoding::encode(IAM_GRANT_TYPE),
            urlencoding::encode(&self.api_key)
        );

        debug!("Requesting IAM access token from {}", self.token_url());

        let response = self
            .client
            .post(self.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("IAM token request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Auth(format!("IAM token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Auth(format!(
                "IAM token request returned {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&bytes)
            )));
        }

        let token: IamTokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Auth(format!("IAM token response malformed: {}", e)))?;

        Ok(CachedToken {
            refresh_at: refresh_deadline(Utc::now(), token.expires_in, token.expiration),
            access_token: token.access_token,
        })
    }
}

/// Refresh once 80% of the token lifetime has elapsed
fn refresh_deadline(
    now: DateTime<Utc>,
    expires_in: Option<i64>,
    expiration: Option<i64>,
) -> DateTime<Utc> {
    let lifetime = match (expires_in, expiration) {
        (Some(secs), _) if secs > 0 => secs,
        (_, Some(at)) => (at - now.timestamp()).max(0),
        _ => 0,
    };
    now + chrono::Duration::seconds(lifetime * 8 / 10)
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("api_key", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    fn auth_type(&self) -> AuthType {
        AuthType::Iam
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("IAM API key must not be empty".to_string()));
        }
        url::Url::parse(&self.url)?;
        Ok(())
    }

    async fn authorization(&self) -> Result<Option<String>> {
        if let Some(token) = self.cached_token() {
            return Ok(Some(format!("Bearer {}", token)));
        }

        let fresh = self.request_token().await?;
        let header = format!("Bearer {}", fresh.access_token);
        *self.cached.lock() = Some(fresh);
        Ok(Some(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_auth_type_is_case_insensitive() {
        assert_eq!("NOAuth".parse::<AuthType>().unwrap(), AuthType::NoAuth);
        assert_eq!("IAM".parse::<AuthType>().unwrap(), AuthType::Iam);
        assert_eq!(
            "bearerToken".parse::<AuthType>().unwrap(),
            AuthType::BearerToken
        );
        assert!("someOtherAuth".parse::<AuthType>().is_err());
    }

    #[test]
    fn test_bearer_token_validation() {
        assert!(BearerTokenAuthenticator::new("").validate().is_err());
        assert!(BearerTokenAuthenticator::new("abc").validate().is_ok());
    }

    #[test]
    fn test_refresh_deadline_uses_lifetime_fraction() {
        let now = Utc::now();
        let at = refresh_deadline(now, Some(3600), None);
        assert_eq!((at - now).num_seconds(), 2880);

        let expired = refresh_deadline(now, None, None);
        assert_eq!(expired, now);
    }

    #[tokio::test]
    async fn test_iam_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .and(body_string_contains("apikey=my-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-1",
                "refresh_token": "not-used",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = IamAuthenticator::with_url("my-key", server.uri());
        assert!(auth.validate().is_ok());

        let first = auth.authorization().await.unwrap();
        let second = auth.authorization().await.unwrap();
        assert_eq!(first.as_deref(), Some("Bearer token-1"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_iam_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad key"))
            .mount(&server)
            .await;

        let auth = IamAuthenticator::with_url("bad", server.uri());
        let err = auth.authorization().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Auth);
    }
}
