//! Event Notifications v1 admin API
//!
//! Every resource lives under a service instance:
//! `/v1/instances/{instance_id}/...`. List operations page with
//! `limit`/`offset` and report `total_count`.

use std::sync::Arc;

use ibmcloud_common::{Result, ServiceOptions, Session, Transport};
use serde::{Deserialize, Serialize};

pub mod destinations;
pub mod smtp;
pub mod sources;
pub mod subscriptions;
pub mod topics;

pub use destinations::*;
pub use smtp::*;
pub use sources::*;
pub use subscriptions::*;
pub use topics::*;

/// Default service URL (us-south, public)
pub const DEFAULT_SERVICE_URL: &str =
    "https://us-south.event-notifications.cloud.ibm.com/event-notifications";

/// Service name used for external configuration lookups
pub const DEFAULT_SERVICE_NAME: &str = "event_notifications";

/// Largest page the service accepts
pub const MAX_PAGE_SIZE: i64 = 100;

/// Service URL for a region, optionally on the private network
pub fn service_url_for_region(region: &str, private: bool) -> String {
    let prefix = if private { "private." } else { "" };
    format!(
        "https://{}{}.event-notifications.cloud.ibm.com/event-notifications",
        prefix, region
    )
}

/// Client for the Event Notifications admin API
#[derive(Debug)]
pub struct EventNotificationsV1 {
    pub(crate) session: Session,
}

impl EventNotificationsV1 {
    pub fn new(mut options: ServiceOptions) -> Result<Self> {
        if options.url.is_none() {
            options.url = Some(DEFAULT_SERVICE_URL.to_string());
        }
        Ok(Self {
            session: Session::new(options)?,
        })
    }

    pub fn with_transport(mut options: ServiceOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        if options.url.is_none() {
            options.url = Some(DEFAULT_SERVICE_URL.to_string());
        }
        Ok(Self {
            session: Session::with_transport(options, transport)?,
        })
    }

    /// Build a client from `EVENT_NOTIFICATIONS_*` environment variables
    pub fn new_using_external_config(options: ServiceOptions) -> Result<Self> {
        Self::new(options.merge_external_config()?)
    }

    pub fn service_url(&self) -> String {
        self.session.service_url()
    }

    pub fn set_service_url(&self, url: impl Into<String>) -> Result<()> {
        self.session.set_service_url(url)
    }
}

/// Link to a page of a list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHref {
    pub href: String,
}

/// Paging fields shared by every list response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub first: Option<PageHref>,
    #[serde(default)]
    pub previous: Option<PageHref>,
    #[serde(default)]
    pub next: Option<PageHref>,
}

impl Paging {
    /// Offset of the page after one holding `received` items, if any remain
    pub fn next_offset(&self, received: usize) -> Option<i64> {
        let next = self.offset + received as i64;
        if received == 0 || next >= self.total_count {
            None
        } else {
            Some(next)
        }
    }
}

/// Paging and search parameters accepted by list operations
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl ListParams {
    pub(crate) fn apply<'a>(
        &self,
        builder: ibmcloud_common::RequestBuilder<'a>,
    ) -> ibmcloud_common::RequestBuilder<'a> {
        builder
            .query_opt("limit", self.limit)
            .query_opt("offset", self.offset)
            .query_opt("search", self.search.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_urls() {
        assert_eq!(service_url_for_region("us-south", false), DEFAULT_SERVICE_URL);
        assert_eq!(
            service_url_for_region("eu-de", true),
            "https://private.eu-de.event-notifications.cloud.ibm.com/event-notifications"
        );
    }

    #[test]
    fn test_next_offset() {
        let paging = Paging {
            total_count: 5,
            offset: 0,
            limit: 2,
            ..Default::default()
        };
        assert_eq!(paging.next_offset(2), Some(2));

        let last = Paging {
            total_count: 5,
            offset: 4,
            limit: 2,
            ..Default::default()
        };
        assert_eq!(last.next_offset(1), None);
        assert_eq!(paging.next_offset(0), None);
    }
}
