//! Error types for IBM Cloud API clients

use thiserror::Error;

/// Result type alias using the client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Message carried by every operation attempted without a service URL
pub const ERRORMSG_SERVICE_URL_MISSING: &str = "service URL is missing";

/// Coarse classification of an [`Error`], for matching without string inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    NotFound,
    Decode,
    Validation,
    ServiceUrlMissing,
    Timeout,
    Failed,
    Cancelled,
    Config,
    Auth,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Decode => "decode",
            ErrorKind::Validation => "validation",
            ErrorKind::ServiceUrlMissing => "service_url_missing",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Failed => "failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
            ErrorKind::Auth => "auth",
        };
        f.write_str(name)
    }
}

/// Client error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("request failed with status {status}: {message}")]
    Protocol {
        status: u16,
        message: String,
        body: Option<String>,
    },

    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("operation response processing error (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{}", ERRORMSG_SERVICE_URL_MISSING)]
    ServiceUrlMissing,

    #[error("timed out after {attempts} attempts waiting for {target}; last observed state: {last_state}")]
    Timeout {
        target: String,
        last_state: String,
        attempts: u32,
    },

    #[error("reached failure state '{state}' while waiting for {target}")]
    Failed { target: String, state: String },

    #[error("cancelled while waiting for {target}")]
    Cancelled { target: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ServiceUrlMissing => ErrorKind::ServiceUrlMissing,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Failed { .. } => ErrorKind::Failed,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::Config,
            Error::Auth(_) => ErrorKind::Auth,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether a repeated observation could succeed where this one failed.
    ///
    /// Connection failures, rate limiting and server-side errors qualify;
    /// client-side errors (validation, decoding, 4xx) never do.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Protocol { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status code, when the error came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Protocol { status, .. } | Error::Decode { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", e))
    }
}
