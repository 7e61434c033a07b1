//! Provider configuration
//!
//! Values come from, in increasing precedence: defaults, environment
//! variables, an optional TOML file, and the provider block itself.

use std::path::Path;
use std::time::Duration;

use ibmcloud_common::DEFAULT_REGION;
use serde::{Deserialize, Serialize};

use crate::state::{get_int_attr, get_optional_string_attr, DynamicValue};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// IBM Cloud API key, exchanged for IAM tokens
    pub ibmcloud_api_key: Option<String>,

    /// Pre-issued IAM bearer token, used when no API key is set
    pub iam_token: Option<String>,

    pub region: String,

    pub visibility: Visibility,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// IAM token endpoint override
    pub iam_url: Option<String>,

    /// Transit gateway API version date
    pub transit_gateway_version: String,

    pub endpoints: EndpointsConfig,

    pub polling: PollingConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            ibmcloud_api_key: None,
            iam_token: None,
            region: DEFAULT_REGION.to_string(),
            visibility: Visibility::Public,
            timeout_secs: 60,
            iam_url: None,
            transit_gateway_version: "2021-03-31".to_string(),
            endpoints: EndpointsConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    PublicAndPrivate,
}

impl Visibility {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "public-and-private" => Some(Visibility::PublicAndPrivate),
            _ => None,
        }
    }

    pub fn is_private(&self) -> bool {
        *self == Visibility::Private
    }
}

/// Service URL overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub transit_gateway: Option<String>,
    pub event_notifications: Option<String>,
    pub lbaas: Option<String>,
}

/// Convergence polling budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub provisioning_interval_secs: u64,
    pub provisioning_attempts: u32,
    pub teardown_interval_secs: u64,
    pub teardown_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            provisioning_interval_secs: 5,
            provisioning_attempts: 24,
            teardown_interval_secs: 10,
            teardown_attempts: 24,
        }
    }
}

impl PollingConfig {
    pub fn provisioning_interval(&self) -> Duration {
        Duration::from_secs(self.provisioning_interval_secs)
    }

    pub fn teardown_interval(&self) -> Duration {
        Duration::from_secs(self.teardown_interval_secs)
    }
}

fn first_of<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|v| !v.is_empty())
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

impl ProviderConfig {
    /// Overlay the keys present in a TOML file; a missing file changes nothing
    pub fn overlay_file(self, path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(self);
        }
        let content = std::fs::read_to_string(path)?;
        let file: toml::Value = toml::from_str(&content)?;
        let mut merged = toml::Value::try_from(&self)?;
        merge_toml(&mut merged, file);
        Ok(merged.try_into::<Self>()?)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fill unset credentials and settings from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Environment values only replace defaults, never explicit settings.
    /// Apply before [`overlay_file`](Self::overlay_file) so a file value
    /// equal to a default still wins over the environment.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        if self.ibmcloud_api_key.is_none() {
            self.ibmcloud_api_key = first_of(&lookup, &["IC_API_KEY", "IBMCLOUD_API_KEY"]);
        }
        if self.iam_token.is_none() {
            self.iam_token = first_of(&lookup, &["IC_IAM_TOKEN", "IBMCLOUD_IAM_TOKEN"]);
        }
        if self.iam_url.is_none() {
            self.iam_url = first_of(&lookup, &["IBMCLOUD_IAM_API_ENDPOINT"]);
        }
        if self.region == defaults.region {
            if let Some(region) = first_of(&lookup, &["IC_REGION", "IBMCLOUD_REGION"]) {
                self.region = region;
            }
        }
        if self.timeout_secs == defaults.timeout_secs {
            if let Some(timeout) = first_of(&lookup, &["IC_TIMEOUT", "IBMCLOUD_TIMEOUT"])
                .and_then(|t| t.parse().ok())
            {
                self.timeout_secs = timeout;
            }
        }
        if self.visibility == defaults.visibility {
            if let Some(visibility) = first_of(&lookup, &["IC_VISIBILITY", "IBMCLOUD_VISIBILITY"])
                .and_then(|v| Visibility::parse(&v))
            {
                self.visibility = visibility;
            }
        }
        self
    }

    /// Overlay the attributes set in the provider block
    pub fn merge_block(&mut self, block: &DynamicValue) -> Result<(), String> {
        if let Some(key) = get_optional_string_attr(block, "ibmcloud_api_key") {
            self.ibmcloud_api_key = Some(key);
        }
        if let Some(token) = get_optional_string_attr(block, "iam_token") {
            self.iam_token = Some(token);
        }
        if let Some(region) = get_optional_string_attr(block, "region") {
            self.region = region;
        }
        if let Some(visibility) = get_optional_string_attr(block, "visibility") {
            self.visibility = Visibility::parse(&visibility).ok_or_else(|| {
                format!(
                    "visibility must be one of public, private, public-and-private; got {}",
                    visibility
                )
            })?;
        }
        let timeout = get_int_attr(block, "ibmcloud_timeout", 0);
        if timeout < 0 {
            return Err(format!("ibmcloud_timeout must not be negative; got {}", timeout));
        }
        if timeout > 0 {
            self.timeout_secs = timeout as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{int_value, make_state, string_value};

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.region, "us-south");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.polling.provisioning_attempts, 24);
        assert_eq!(config.polling.teardown_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_env_fallbacks() {
        let config = ProviderConfig::default().with_env_lookup(lookup(&[
            ("IBMCLOUD_API_KEY", "key-from-ibmcloud"),
            ("IC_REGION", "eu-de"),
            ("IC_TIMEOUT", "120"),
            ("IC_VISIBILITY", "private"),
        ]));
        assert_eq!(config.ibmcloud_api_key.as_deref(), Some("key-from-ibmcloud"));
        assert_eq!(config.region, "eu-de");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.visibility.is_private());
    }

    #[test]
    fn test_ic_variables_win_over_ibmcloud() {
        let config = ProviderConfig::default().with_env_lookup(lookup(&[
            ("IC_API_KEY", "ic"),
            ("IBMCLOUD_API_KEY", "ibmcloud"),
        ]));
        assert_eq!(config.ibmcloud_api_key.as_deref(), Some("ic"));
    }

    #[test]
    fn test_explicit_values_beat_environment() {
        let config = ProviderConfig {
            region: "jp-tok".to_string(),
            ..Default::default()
        }
        .with_env_lookup(lookup(&[("IC_REGION", "eu-de")]));
        assert_eq!(config.region, "jp-tok");
    }

    #[test]
    fn test_file_values_beat_environment() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("provider.toml");
        std::fs::write(&file, "region = \"us-south\"\ntimeout_secs = 60\n").unwrap();

        let config = ProviderConfig::default()
            .with_env_lookup(lookup(&[
                ("IC_REGION", "eu-de"),
                ("IC_TIMEOUT", "120"),
                ("IC_VISIBILITY", "private"),
            ]))
            .overlay_file(&file)
            .unwrap();
        assert_eq!(config.region, "us-south");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.visibility.is_private());
    }

    #[test]
    fn test_overlay_keeps_unset_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("provider.toml");
        std::fs::write(&file, "[polling]\nprovisioning_attempts = 3\n").unwrap();

        let base = ProviderConfig {
            iam_token: Some("token".to_string()),
            ..Default::default()
        };
        let config = base.overlay_file(&file).unwrap();
        assert_eq!(config.iam_token.as_deref(), Some("token"));
        assert_eq!(config.polling.provisioning_attempts, 3);
        assert_eq!(config.polling.teardown_attempts, 24);

        let missing = dir.path().join("absent.toml");
        let unchanged = config.clone().overlay_file(&missing).unwrap();
        assert_eq!(unchanged, config);
    }

    #[test]
    fn test_merge_block() {
        let mut config = ProviderConfig::default();
        let block = make_state(vec![
            ("region", string_value("eu-gb")),
            ("ibmcloud_timeout", int_value(30)),
            ("visibility", string_value("public-and-private")),
        ]);
        config.merge_block(&block).unwrap();
        assert_eq!(config.region, "eu-gb");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.visibility, Visibility::PublicAndPrivate);

        let bad = make_state(vec![("visibility", string_value("hidden"))]);
        assert!(config.merge_block(&bad).is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config: ProviderConfig = toml::from_str(
            r#"
            region = "eu-de"
            visibility = "private"

            [endpoints]
            transit_gateway = "http://127.0.0.1:9000"

            [polling]
            provisioning_interval_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.region, "eu-de");
        assert_eq!(config.visibility, Visibility::Private);
        assert_eq!(
            config.endpoints.transit_gateway.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert_eq!(config.polling.provisioning_interval_secs, 0);
        assert_eq!(config.polling.provisioning_attempts, 24);
        assert_eq!(config.timeout_secs, 60);
    }
}
