//! Shortcuts configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::{Region, Result, ShortcutsError};

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com/";

/// Default suffix appended to a resource name when a new resource group is
/// requested without an explicit name.
pub const DEFAULT_NEW_GROUP_SUFFIX: &str = "group";

/// Session configuration.
///
/// Authentication is not part of this configuration: the session is handed
/// an already authenticated management client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutsConfig {
    /// Subscription the session operates in.
    pub subscription_id: Option<String>,
    /// Resource Manager endpoint.
    ///
    /// The session never opens connections itself; this is read by whoever
    /// builds the [`ManagementClient`](crate::ManagementClient) handed to it,
    /// and is logged when the session starts.
    #[serde(default = "default_endpoint")]
    pub resource_manager_endpoint: Url,
    /// Region staged on every newly defined resource.
    #[serde(default)]
    pub default_region: Option<Region>,
    /// Tags staged on every newly defined resource.
    #[serde(default)]
    pub default_tags: HashMap<String, String>,
    /// Suffix for auto-named resource groups.
    #[serde(default = "default_group_suffix")]
    pub new_group_suffix: String,
}

fn default_endpoint() -> Url {
    // Constant input, always parses.
    Url::parse(DEFAULT_RESOURCE_MANAGER_ENDPOINT).expect("default endpoint is a valid URL")
}

fn default_group_suffix() -> String {
    DEFAULT_NEW_GROUP_SUFFIX.to_string()
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            subscription_id: None,
            resource_manager_endpoint: default_endpoint(),
            default_region: None,
            default_tags: HashMap::new(),
            new_group_suffix: default_group_suffix(),
        }
    }
}

impl ShortcutsConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> ShortcutsConfigBuilder {
        ShortcutsConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> ShortcutsConfigBuilder {
        let mut builder = ShortcutsConfigBuilder::new();

        if let Ok(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID") {
            builder = builder.subscription_id(subscription);
        }

        if let Ok(endpoint) = std::env::var("AZURE_RESOURCE_MANAGER_ENDPOINT") {
            builder = builder.resource_manager_endpoint(endpoint);
        }

        if let Ok(region) = std::env::var("AZURE_SHORTCUTS_DEFAULT_REGION") {
            builder = builder.default_region(region);
        }

        builder
    }

    /// Load configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The subscription id, or an error if none is configured.
    pub fn require_subscription_id(&self) -> Result<&str> {
        self.subscription_id
            .as_deref()
            .ok_or_else(|| ShortcutsError::Config("subscription id not specified".to_string()))
    }

    fn validate(&self) -> Result<()> {
        if let Some(subscription) = &self.subscription_id
            && subscription.trim().is_empty()
        {
            return Err(ShortcutsError::Config("subscription id is empty".to_string()));
        }

        if !matches!(self.resource_manager_endpoint.scheme(), "https" | "http") {
            return Err(ShortcutsError::Config(format!(
                "unsupported endpoint scheme '{}'",
                self.resource_manager_endpoint.scheme()
            )));
        }

        if self.new_group_suffix.contains('/') {
            return Err(ShortcutsError::Config(
                "new group suffix must not contain '/'".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for shortcuts configuration.
#[derive(Debug, Clone, Default)]
pub struct ShortcutsConfigBuilder {
    config: ShortcutsConfig,
    endpoint: Option<String>,
}

impl ShortcutsConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subscription id.
    pub fn subscription_id(mut self, subscription: impl Into<String>) -> Self {
        self.config.subscription_id = Some(subscription.into());
        self
    }

    /// Set the Resource Manager endpoint. Parsed when the config is built.
    pub fn resource_manager_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the default region for new definitions.
    pub fn default_region(mut self, region: impl Into<Region>) -> Self {
        self.config.default_region = Some(region.into());
        self
    }

    /// Add a tag staged on every new definition.
    pub fn default_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_tags.insert(key.into(), value.into());
        self
    }

    /// Set the suffix used for auto-named resource groups.
    pub fn new_group_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.new_group_suffix = suffix.into();
        self
    }

    /// Build the configuration.
    pub fn build(mut self) -> Result<ShortcutsConfig> {
        if let Some(endpoint) = self.endpoint.take() {
            self.config.resource_manager_endpoint = Url::parse(&endpoint).map_err(|e| {
                ShortcutsError::Config(format!("invalid endpoint '{endpoint}': {e}"))
            })?;
        }

        self.config.validate()?;
        Ok(self.config)
    }
}
