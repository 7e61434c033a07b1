//! IBM Cloud Terraform Provider
//!
//! Resources and data sources for transit gateways, event notifications
//! and load balancers, served through the host-facing entry points in
//! [`provider`].

pub mod config;
pub mod data_sources;
pub mod diagnostics;
pub mod meta;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;
pub mod telemetry;

pub use config::ProviderConfig;
pub use diagnostics::{Diagnostic, Operation, ResourceError, Severity};
pub use meta::ProviderMeta;
pub use provider::IbmProvider;
pub use state::{DynamicValue, HostValue, ResourceData};
