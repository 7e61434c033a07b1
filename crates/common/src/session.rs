//! Service session and request building
//!
//! A [`Session`] holds everything shared by the operations of one client:
//! base URL, authenticator, default query parameters and headers, and the
//! transport. Each operation builds a [`RequestBuilder`] from a path
//! template, then sends it and interprets the response.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::{Authenticator, NoAuthAuthenticator};
use crate::config::ServiceOptions;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

/// A decoded response together with its status and headers
#[derive(Debug, Clone)]
pub struct DetailedResponse<T> {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub result: T,
}

impl<T> DetailedResponse<T> {
    pub fn into_result(self) -> T {
        self.result
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Connection state shared by every operation of a client
#[derive(Debug)]
pub struct Session {
    service_name: String,
    /// The only field a built session lets callers change, through
    /// [`set_service_url`](Self::set_service_url); requests read it per call.
    service_url: RwLock<String>,
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn Transport>,
    default_query: Vec<(String, String)>,
    default_headers: HashMap<String, String>,
}

impl Session {
    /// Build a session from options, validating URL and authenticator
    pub fn new(options: ServiceOptions) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(options.timeout)?);
        Self::with_transport(options, transport)
    }

    /// Build a session over a caller-supplied transport
    pub fn with_transport(options: ServiceOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        let authenticator = options
            .authenticator
            .unwrap_or_else(|| Arc::new(NoAuthAuthenticator));
        authenticator.validate()?;

        let service_url = options.url.unwrap_or_default();
        if !service_url.is_empty() {
            Url::parse(&service_url)?;
        }

        let mut default_query = Vec::new();
        if let Some(version) = options.version {
            default_query.push(("version".to_string(), version));
        }
        if let Some(generation) = options.generation {
            default_query.push(("generation".to_string(), generation.to_string()));
        }

        Ok(Self {
            service_name: options.service_name,
            service_url: RwLock::new(service_url),
            authenticator,
            transport,
            default_query,
            default_headers: options.headers,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_url(&self) -> String {
        self.service_url.read().clone()
    }

    /// Replace the base URL. An empty URL is accepted; operations then fail
    /// with [`Error::ServiceUrlMissing`].
    pub fn set_service_url(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        if !url.is_empty() {
            Url::parse(&url)?;
        }
        *self.service_url.write() = url;
        Ok(())
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Start a request for a path template such as
    /// `/transit_gateways/{id}/connections`.
    pub fn request<'a>(
        &'a self,
        method: Method,
        path: &str,
        path_params: &[(&str, &str)],
    ) -> RequestBuilder<'a> {
        let path = expand_path(path, path_params);
        RequestBuilder {
            session: self,
            method,
            path,
            query: self.default_query.clone(),
            headers: self
                .default_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: None,
        }
    }
}

/// Substitute `{name}` placeholders with percent-encoded values.
/// An empty value is reported when the request is sent.
fn expand_path(template: &str, params: &[(&str, &str)]) -> std::result::Result<String, String> {
    let mut path = template.to_string();
    for (name, value) in params {
        if value.is_empty() {
            return Err(format!("{} must be provided", name));
        }
        path = path.replace(
            &format!("{{{}}}", name),
            &urlencoding::encode(value),
        );
    }
    Ok(path)
}

/// One request in the making
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    session: &'a Session,
    method: Method,
    path: std::result::Result<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<std::result::Result<Vec<u8>, String>>,
}

impl<'a> RequestBuilder<'a> {
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present
    pub fn query_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Merge per-call headers; these are sent after the session defaults
    pub fn headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (k, v) in headers {
            self.headers.push((k.clone(), v.clone()));
        }
        self
    }

    pub fn json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_vec(body).map_err(|e| e.to_string()));
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self
    }

    fn build_url(&self) -> Result<Url> {
        let base = self.session.service_url();
        if base.is_empty() {
            return Err(Error::ServiceUrlMissing);
        }
        let path = self.path.clone().map_err(Error::Validation)?;

        let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &self.query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn execute(self) -> Result<ApiResponse> {
        let url = self.build_url()?;

        let body = match self.body {
            Some(Ok(bytes)) => Some(bytes),
            Some(Err(e)) => {
                return Err(Error::Validation(format!("request body not serializable: {}", e)))
            }
            None => None,
        };

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(auth) = self.session.authenticator.authorization().await? {
            headers.push(("Authorization".to_string(), auth));
        }
        headers.extend(self.headers);

        debug!(
            service = %self.session.service_name,
            method = %self.method,
            url = %url,
            "Sending request"
        );

        let response = self
            .session
            .transport
            .send(ApiRequest {
                method: self.method,
                url,
                headers,
                body,
            })
            .await?;

        debug!(
            service = %self.session.service_name,
            status = response.status,
            "Received response"
        );

        check_status(response)
    }

    /// Send and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<DetailedResponse<T>> {
        let response = self.execute().await?;
        let result = serde_json::from_slice(&response.body).map_err(|source| Error::Decode {
            status: response.status,
            source,
        })?;
        Ok(DetailedResponse {
            status: response.status,
            headers: response.headers,
            result,
        })
    }

    /// Send a request whose success response carries no body
    pub async fn send_empty(self) -> Result<DetailedResponse<()>> {
        let response = self.execute().await?;
        Ok(DetailedResponse {
            status: response.status,
            headers: response.headers,
            result: (),
        })
    }
}

fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    if (200..300).contains(&response.status) {
        return Ok(response);
    }

    let body = String::from_utf8_lossy(&response.body).to_string();
    let message = error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {}", response.status)
        } else {
            body.clone()
        }
    });

    if response.status == 404 {
        return Err(Error::NotFound { message });
    }
    Err(Error::Protocol {
        status: response.status,
        message,
        body: if body.is_empty() { None } else { Some(body) },
    })
}

/// Pull a human-readable message out of an IBM Cloud error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let text = |v: &serde_json::Value| v.as_str().map(str::to_string);

    value
        .get("errors")
        .and_then(|e| e.get(0))
        .and_then(|e| e.get("message"))
        .and_then(text)
        .or_else(|| value.get("message").and_then(text))
        .or_else(|| value.get("error").and_then(text))
        .or_else(|| value.get("errorMessage").and_then(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(url: &str) -> Session {
        Session::new(
            ServiceOptions::new("test_service")
                .with_url(url)
                .with_version("2021-03-31"),
        )
        .unwrap()
    }

    #[test]
    fn test_expand_path_encodes_values() {
        let path = expand_path("/things/{id}", &[("id", "a b/c")]).unwrap();
        assert_eq!(path, "/things/a%20b%2Fc");
    }

    #[test]
    fn test_expand_path_rejects_empty() {
        let err = expand_path("/things/{id}", &[("id", "")]).unwrap_err();
        assert!(err.contains("id"));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let result = Session::new(ServiceOptions::new("test_service").with_url("{BAD_URL_STRING"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"errors":[{"code":"not_found","message":"gateway not found"}]}"#;
        assert_eq!(error_message(body).as_deref(), Some("gateway not found"));
        assert_eq!(
            error_message(r#"{"message":"bad"}"#).as_deref(),
            Some("bad")
        );
        assert!(error_message("plain text").is_none());
    }

    #[tokio::test]
    async fn test_send_json_applies_version_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things/abc"))
            .and(query_param("version", "2021-03-31"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .mount(&server)
            .await;

        let s = session(&server.uri());
        let response = s
            .request(Method::GET, "/things/{id}", &[("id", "abc")])
            .send_json::<serde_json::Value>()
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.result["name"], "x");
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errors": [{"message": "nope"}]
            })))
            .mount(&server)
            .await;

        let err = session(&server.uri())
            .request(Method::GET, "/things/{id}", &[("id", "abc")])
            .send_json::<serde_json::Value>()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("} this is not valid json {"))
            .mount(&server)
            .await;

        let err = session(&server.uri())
            .request(Method::GET, "/things", &[])
            .send_json::<serde_json::Value>()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_set_service_url_redirects_later_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let s = Arc::new(session("https://example.invalid"));
        assert!(s.set_service_url("{BAD_URL_STRING").is_err());
        assert_eq!(s.service_url(), "https://example.invalid");

        let shared = Arc::clone(&s);
        shared.set_service_url(server.uri()).unwrap();
        let response = s
            .request(Method::GET, "/things", &[])
            .send_json::<serde_json::Value>()
            .await
            .unwrap();
        assert_eq!(response.result["name"], "x");
    }

    #[tokio::test]
    async fn test_empty_service_url_fails_without_request() {
        let s = session("https://example.invalid");
        s.set_service_url("").unwrap();

        let err = s
            .request(Method::GET, "/things", &[])
            .send_empty()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUrlMissing));
    }
}
