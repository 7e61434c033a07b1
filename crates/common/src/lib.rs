//! IBM Cloud common client library
//!
//! Shared session, transport, authentication, identifier and polling
//! primitives used by the service clients and the provider.

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod poller;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use auth::{
    AuthType, Authenticator, BearerTokenAuthenticator, IamAuthenticator, NoAuthAuthenticator,
};
pub use config::ServiceOptions;
pub use error::{Error, ErrorKind, Result, ERRORMSG_SERVICE_URL_MISSING};
pub use identity::{join_id, split_id};
pub use poller::{Converged, Observation, Poller, Sleeper, StatusReport, Target, TokioSleeper};
pub use session::{DetailedResponse, RequestBuilder, Session};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "us-south";
