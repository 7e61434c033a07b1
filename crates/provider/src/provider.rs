//! IBM Cloud Terraform Provider Implementation
//!
//! Entry points the host calls. Values arrive encoded ([`HostValue`]),
//! are decoded once, handed to the resource or data source adapter, and the
//! resulting state is encoded on the way out. Every entry point reports
//! problems as diagnostics rather than failing the call.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use ibmcloud_common::{CancellationToken, Error};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::ProviderConfig;
use crate::data_sources::{self, DataSource};
use crate::diagnostics::{has_errors, Diagnostic, Operation, ResourceError};
use crate::meta::ProviderMeta;
use crate::resources::{self, OperationContext, Resource};
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::{get_optional_string_attr, DynamicValue, HostValue, ResourceData};

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchemaResponse {
    pub provider: Schema,
    pub resource_schemas: BTreeMap<String, Schema>,
    pub data_source_schemas: BTreeMap<String, Schema>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigureProviderRequest {
    pub config: HostValue,
}

/// Shared by resource and data source validation
#[derive(Debug, Clone, Default)]
pub struct ValidateConfigRequest {
    pub type_name: String,
    pub config: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct ReadResourceResponse {
    pub new_state: HostValue,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanResourceChangeRequest {
    pub type_name: String,
    pub prior_state: HostValue,
    pub proposed_new_state: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct PlanResourceChangeResponse {
    pub planned_state: HostValue,
    pub requires_replace: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyResourceChangeRequest {
    pub type_name: String,
    pub prior_state: HostValue,
    pub planned_state: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyResourceChangeResponse {
    pub new_state: HostValue,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct ImportedResource {
    pub type_name: String,
    pub state: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ReadDataSourceRequest {
    pub type_name: String,
    pub config: HostValue,
}

#[derive(Debug, Clone, Default)]
pub struct ReadDataSourceResponse {
    pub state: HostValue,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceExistsResponse {
    pub exists: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Schema of the provider block itself
pub fn provider_schema() -> Schema {
    Schema::new("IBM Cloud")
        .attribute(
            Attribute::optional("ibmcloud_api_key", AttributeType::String)
                .sensitive()
                .describe("API key; falls back to IC_API_KEY or IBMCLOUD_API_KEY"),
        )
        .attribute(
            Attribute::optional("iam_token", AttributeType::String)
                .sensitive()
                .describe("IAM bearer token used when no API key is set"),
        )
        .attribute(Attribute::optional("region", AttributeType::String))
        .attribute(
            Attribute::optional("visibility", AttributeType::String)
                .one_of(&["public", "private", "public-and-private"]),
        )
        .attribute(
            Attribute::optional("ibmcloud_timeout", AttributeType::Number)
                .describe("Per-request timeout in seconds"),
        )
        .attribute(
            Attribute::optional("config_file", AttributeType::String)
                .describe("TOML file with endpoint and polling overrides"),
        )
}

/// IBM Cloud Terraform Provider
pub struct IbmProvider {
    /// Clients, set by `configure_provider`
    meta: RwLock<Option<Arc<ProviderMeta>>>,
    /// Fired by `stop_provider`; observed by in-flight polls
    stop: CancellationToken,
    resources: HashMap<&'static str, Arc<dyn Resource>>,
    data_sources: HashMap<&'static str, Arc<dyn DataSource>>,
}

impl Default for IbmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IbmProvider {
    pub fn new() -> Self {
        Self {
            meta: RwLock::new(None),
            stop: CancellationToken::new(),
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    /// A provider already configured from `config`, bypassing the
    /// environment and the provider block
    pub fn with_config(config: ProviderConfig) -> ibmcloud_common::Result<Self> {
        let meta = ProviderMeta::from_config(config)?;
        Ok(Self {
            meta: RwLock::new(Some(Arc::new(meta))),
            ..Self::new()
        })
    }

    fn context(&self) -> OperationContext {
        OperationContext::new(self.stop.clone())
    }

    async fn configured(&self) -> Result<Arc<ProviderMeta>, Diagnostic> {
        self.meta.read().await.clone().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "configure_provider must succeed before resources can be managed",
            )
        })
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, Diagnostic> {
        self.resources.get(type_name).cloned().ok_or_else(|| {
            Diagnostic::error(
                "Unknown resource type",
                format!("this provider has no resource type {}", type_name),
            )
        })
    }

    fn data_source(&self, type_name: &str) -> Result<Arc<dyn DataSource>, Diagnostic> {
        self.data_sources.get(type_name).cloned().ok_or_else(|| {
            Diagnostic::error(
                "Unknown data source type",
                format!("this provider has no data source type {}", type_name),
            )
        })
    }

    pub fn get_provider_schema(&self) -> ProviderSchemaResponse {
        info!("GetProviderSchema called");
        ProviderSchemaResponse {
            provider: provider_schema(),
            resource_schemas: self
                .resources
                .iter()
                .map(|(name, r)| (name.to_string(), r.schema()))
                .collect(),
            data_source_schemas: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.to_string(), d.schema()))
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    pub async fn configure_provider(&self, request: ConfigureProviderRequest) -> Vec<Diagnostic> {
        info!("ConfigureProvider called");

        let block = match decode(&request.config) {
            Ok(block) => block,
            Err(diag) => return vec![diag],
        };
        let mut diagnostics = provider_schema().validate(&block);
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        let base = ProviderConfig::default().with_env();
        let mut config = match get_optional_string_attr(&block, "config_file") {
            Some(path) => match base.overlay_file(Path::new(&path)) {
                Ok(config) => config,
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid config file", format!("{:#}", e))
                            .with_attribute("config_file"),
                    );
                    return diagnostics;
                }
            },
            None => base,
        };
        if let Err(e) = config.merge_block(&block) {
            diagnostics.push(Diagnostic::error("Invalid provider configuration", e));
            return diagnostics;
        }

        match ProviderMeta::from_config(config) {
            Ok(meta) => {
                info!(region = %meta.config.region, "Provider configured");
                *self.meta.write().await = Some(Arc::new(meta));
            }
            Err(e) => {
                error!("Failed to configure provider: {}", e);
                diagnostics.push(Diagnostic::error("Failed to configure provider", e.to_string()));
            }
        }
        diagnostics
    }

    pub fn validate_resource_config(&self, request: ValidateConfigRequest) -> Vec<Diagnostic> {
        debug!("ValidateResourceConfig called for {}", request.type_name);
        let resource = match self.resource(&request.type_name) {
            Ok(r) => r,
            Err(diag) => return vec![diag],
        };
        let config = match decode(&request.config) {
            Ok(config) => config,
            Err(diag) => return vec![diag],
        };
        let mut diagnostics = resource.schema().validate(&config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(resource.validate(&config));
        }
        diagnostics
    }

    pub fn validate_data_resource_config(&self, request: ValidateConfigRequest) -> Vec<Diagnostic> {
        debug!("ValidateDataResourceConfig called for {}", request.type_name);
        let data_source = match self.data_source(&request.type_name) {
            Ok(d) => d,
            Err(diag) => return vec![diag],
        };
        match decode(&request.config) {
            Ok(config) => data_source.schema().validate(&config),
            Err(diag) => vec![diag],
        }
    }

    pub async fn read_resource(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        info!("ReadResource called for {}", request.type_name);
        let result = async {
            let resource = self.resource(&request.type_name)?;
            let meta = self.configured().await?;
            let current = decode(&request.current_state)?;

            let mut data = ResourceData::new(DynamicValue::Null, current);
            resource
                .read(&self.context(), &mut data, &meta)
                .await
                .map_err(|e| failure(Operation::Read, &request.type_name, data.id(), e))?;
            encode(&data.into_state())
        }
        .await;

        match result {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: Vec::new(),
            },
            Err(diag) => ReadResourceResponse {
                new_state: HostValue::default(),
                diagnostics: vec![diag],
            },
        }
    }

    pub fn plan_resource_change(&self, request: PlanResourceChangeRequest) -> PlanResourceChangeResponse {
        debug!("PlanResourceChange called for {}", request.type_name);
        let result = (|| -> Result<(HostValue, Vec<String>), Diagnostic> {
            let resource = self.resource(&request.type_name)?;
            let prior = decode(&request.prior_state)?;
            let proposed = decode(&request.proposed_new_state)?;

            // Destroy plans carry no state
            if proposed.is_null() {
                return Ok((encode(&DynamicValue::Null)?, Vec::new()));
            }
            let schema = resource.schema();
            let requires_replace = if prior.is_null() {
                Vec::new()
            } else {
                schema.requires_replace(&prior, &proposed)
            };
            let planned = schema.plan(&prior, &proposed);
            Ok((encode(&planned)?, requires_replace))
        })();

        match result {
            Ok((planned_state, requires_replace)) => PlanResourceChangeResponse {
                planned_state,
                requires_replace,
                diagnostics: Vec::new(),
            },
            Err(diag) => PlanResourceChangeResponse {
                diagnostics: vec![diag],
                ..Default::default()
            },
        }
    }

    pub async fn apply_resource_change(
        &self,
        request: ApplyResourceChangeRequest,
    ) -> ApplyResourceChangeResponse {
        info!("ApplyResourceChange called for {}", request.type_name);
        // A failed apply still returns the state it reached.
        let result = async {
            let resource = self.resource(&request.type_name)?;
            let meta = self.configured().await?;
            let prior = decode(&request.prior_state)?;
            let planned = decode(&request.planned_state)?;
            let ctx = self.context();

            let (operation, mut data) = match (prior.is_null(), planned.is_null()) {
                (true, true) => return Ok((encode(&DynamicValue::Null)?, None)),
                (true, false) => (Operation::Create, ResourceData::new(planned, DynamicValue::Null)),
                (false, true) => (Operation::Delete, ResourceData::new(DynamicValue::Null, prior)),
                (false, false) => (Operation::Update, ResourceData::new(planned, prior)),
            };
            let outcome = match operation {
                Operation::Create => resource.create(&ctx, &mut data, &meta).await,
                Operation::Delete => resource.delete(&ctx, &mut data, &meta).await,
                _ => resource.update(&ctx, &mut data, &meta).await,
            };
            let diagnostic = outcome
                .err()
                .map(|e| failure(operation, &request.type_name, data.id(), e));
            Ok::<_, Diagnostic>((encode(&data.into_state())?, diagnostic))
        }
        .await;

        match result {
            Ok((new_state, diagnostic)) => ApplyResourceChangeResponse {
                new_state,
                diagnostics: diagnostic.into_iter().collect(),
            },
            Err(diag) => ApplyResourceChangeResponse {
                new_state: HostValue::default(),
                diagnostics: vec![diag],
            },
        }
    }

    pub async fn import_resource_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        info!(
            "ImportResourceState called for {} with ID {}",
            request.type_name, request.id
        );
        let result = async {
            let resource = self.resource(&request.type_name)?;
            let meta = self.configured().await?;

            let mut data = ResourceData::with_id(request.id.as_str());
            resource
                .import(&self.context(), &mut data, &meta)
                .await
                .map_err(|e| failure(Operation::Import, &request.type_name, Some(&request.id), e))?;
            if data.id().is_none() {
                return Err(Diagnostic::error(
                    "Cannot import non-existent remote object",
                    format!("{} {} does not exist", request.type_name, request.id),
                ));
            }
            encode(&data.into_state())
        }
        .await;

        match result {
            Ok(state) => ImportResourceStateResponse {
                imported_resources: vec![ImportedResource {
                    type_name: request.type_name,
                    state,
                }],
                diagnostics: Vec::new(),
            },
            Err(diag) => ImportResourceStateResponse {
                imported_resources: Vec::new(),
                diagnostics: vec![diag],
            },
        }
    }

    pub async fn read_data_source(&self, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        info!("ReadDataSource called for {}", request.type_name);
        let result = async {
            let data_source = self.data_source(&request.type_name)?;
            let meta = self.configured().await?;
            let config = decode(&request.config)?;

            let mut data = ResourceData::new(config, DynamicValue::Null);
            data_source
                .read(&self.context(), &mut data, &meta)
                .await
                .map_err(|e| {
                    let err = ResourceError::new(Operation::Read, request.type_name.as_str(), None, e);
                    error!("{}", err);
                    Diagnostic::error("Failed to read data source", err.to_string())
                })?;
            encode(&data.into_state())
        }
        .await;

        match result {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: Vec::new(),
            },
            Err(diag) => ReadDataSourceResponse {
                state: HostValue::default(),
                diagnostics: vec![diag],
            },
        }
    }

    /// Whether the object recorded in `current_state` still exists remotely
    pub async fn resource_exists(&self, request: ReadResourceRequest) -> ResourceExistsResponse {
        debug!("ResourceExists called for {}", request.type_name);
        let result = async {
            let resource = self.resource(&request.type_name)?;
            let meta = self.configured().await?;
            let current = decode(&request.current_state)?;

            let data = ResourceData::new(DynamicValue::Null, current);
            resource
                .exists(&self.context(), &data, &meta)
                .await
                .map_err(|e| failure(Operation::Exists, &request.type_name, data.id(), e))
        }
        .await;

        match result {
            Ok(exists) => ResourceExistsResponse {
                exists,
                diagnostics: Vec::new(),
            },
            Err(diag) => ResourceExistsResponse {
                exists: false,
                diagnostics: vec![diag],
            },
        }
    }

    /// Abort in-flight waits; later polls fail with a cancellation error
    pub fn stop_provider(&self) -> String {
        info!("StopProvider called");
        self.stop.cancel();
        String::new()
    }
}

fn decode(value: &HostValue) -> Result<DynamicValue, Diagnostic> {
    value
        .decode()
        .map_err(|e| Diagnostic::error("Invalid value", e.to_string()))
}

fn encode(value: &DynamicValue) -> Result<HostValue, Diagnostic> {
    HostValue::encode(value).map_err(|e| Diagnostic::error("Failed to encode state", e.to_string()))
}

fn failure(operation: Operation, type_name: &str, id: Option<&str>, source: Error) -> Diagnostic {
    let err = ResourceError::new(operation, type_name, id, source);
    error!(kind = %err.kind(), "{}", err);
    err.to_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{make_state, string_value};

    #[test]
    fn test_schema_lists_every_type() {
        let schema = IbmProvider::new().get_provider_schema();
        for name in [
            "ibm_tg_gateway",
            "ibm_tg_connection",
            "ibm_tg_connection_action",
            "ibm_en_destination_webhook",
            "ibm_en_destination_sn",
            "ibm_en_topic",
            "ibm_en_subscription_email",
            "ibm_en_subscription_cos",
            "ibm_en_source",
            "ibm_en_smtp_configuration",
            "ibm_en_smtp_user",
            "ibm_lbaas",
        ] {
            assert!(schema.resource_schemas.contains_key(name), "missing {}", name);
        }
        assert_eq!(schema.resource_schemas.len(), 26);
        assert_eq!(schema.data_source_schemas.len(), 10);
        assert!(schema.data_source_schemas.contains_key("ibm_tg_locations"));
    }

    #[test]
    fn test_validate_unknown_type() {
        let diags = IbmProvider::new().validate_resource_config(ValidateConfigRequest {
            type_name: "ibm_nope".to_string(),
            config: HostValue::default(),
        });
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Unknown resource type");
    }

    #[test]
    fn test_validate_reports_missing_argument() {
        let config = make_state(vec![("name", string_value("gw"))]);
        let diags = IbmProvider::new().validate_resource_config(ValidateConfigRequest {
            type_name: "ibm_tg_gateway".to_string(),
            config: HostValue::encode(&config).unwrap(),
        });
        assert!(has_errors(&diags));
        assert!(diags.iter().any(|d| d.summary == "Missing required argument"));
    }

    #[test]
    fn test_plan_marks_force_new_changes() {
        let provider = IbmProvider::new();
        let prior = make_state(vec![
            ("id", string_value("gw-1")),
            ("name", string_value("gw")),
            ("location", string_value("us-south")),
            ("status", string_value("available")),
        ]);
        let proposed = make_state(vec![
            ("id", DynamicValue::Null),
            ("name", string_value("gw")),
            ("location", string_value("eu-de")),
            ("status", DynamicValue::Null),
        ]);
        let response = provider.plan_resource_change(PlanResourceChangeRequest {
            type_name: "ibm_tg_gateway".to_string(),
            prior_state: HostValue::encode(&prior).unwrap(),
            proposed_new_state: HostValue::encode(&proposed).unwrap(),
        });
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.requires_replace, vec!["location".to_string()]);
    }

    #[tokio::test]
    async fn test_read_requires_configuration() {
        let response = IbmProvider::new()
            .read_resource(ReadResourceRequest {
                type_name: "ibm_tg_gateway".to_string(),
                current_state: HostValue::default(),
            })
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_visibility() {
        let block = make_state(vec![
            ("iam_token", string_value("token")),
            ("visibility", string_value("sideways")),
        ]);
        let diags = IbmProvider::new()
            .configure_provider(ConfigureProviderRequest {
                config: HostValue::encode(&block).unwrap(),
            })
            .await;
        assert!(has_errors(&diags));
    }
}
