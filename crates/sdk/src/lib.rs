//! IBM Cloud service clients
//!
//! One client per API family. Each holds an immutable [`Session`] and
//! exposes one async method per REST operation, taking a typed options
//! struct and returning a [`DetailedResponse`].
//!
//! [`Session`]: ibmcloud_common::Session
//! [`DetailedResponse`]: ibmcloud_common::DetailedResponse

pub mod event_notifications;
pub mod lbaas;
pub mod transit_gateway;

pub use event_notifications::EventNotificationsV1;
pub use lbaas::LbaasV1;
pub use transit_gateway::TransitGatewayApisV1;

use std::collections::HashSet;

use ibmcloud_common::{Error, Result};

/// Reject an empty required option before any request is built
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must be provided", field)));
    }
    Ok(())
}

/// Start tokens already requested by one paged listing
#[derive(Debug, Default)]
pub(crate) struct StartTokens {
    seen: HashSet<String>,
}

impl StartTokens {
    /// Accept the next page's start token, or fail if it was seen before
    pub(crate) fn advance(&mut self, start: Option<String>) -> Result<Option<String>> {
        match start {
            Some(start) if !self.seen.insert(start.clone()) => Err(Error::Protocol {
                status: 200,
                message: format!("pagination returned start token '{}' more than once", start),
                body: None,
            }),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_tokens_reject_repeat() {
        let mut tokens = StartTokens::default();
        assert_eq!(tokens.advance(Some("a".into())).unwrap().as_deref(), Some("a"));
        assert_eq!(tokens.advance(Some("b".into())).unwrap().as_deref(), Some("b"));
        assert!(tokens.advance(None).unwrap().is_none());
        let err = tokens.advance(Some("a".into())).unwrap_err();
        assert_eq!(err.status_code(), Some(200));
        assert!(!err.is_transient());
    }
}
