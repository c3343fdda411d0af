//! Resource providers.
//!
//! Providers are read-only: they can be listed, read and refreshed, but
//! never defined or deleted through this crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use shortcuts_core::{ResourceKind, Result, ShortcutsError, latest_version, name_from_resource_id};

use crate::Subscription;
use crate::model::{Inner, ResourceModel};

/// A resource type offered by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceType {
    /// Type name within the provider namespace, such as `virtualMachines`.
    #[serde(rename = "resourceType")]
    pub name: String,
    /// Published API versions.
    pub api_versions: Vec<String>,
    /// Regions the type is offered in.
    pub locations: Vec<String>,
}

impl ResourceType {
    /// Greatest API version in plain string order.
    ///
    /// Versions are compared as strings, so `"10.0"` sorts before `"2.0"`.
    /// Date-based versions such as `2015-06-15` order correctly.
    pub fn latest_api_version(&self) -> Option<String> {
        latest_version(&self.api_versions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ProviderModel {
    namespace: Option<String>,
    registration_state: Option<String>,
    resource_types: Vec<ResourceType>,
}

impl ResourceModel for ProviderModel {
    const KIND: ResourceKind = ResourceKind::Provider;
}

/// A resource provider namespace, such as `Microsoft.Compute`.
#[derive(Debug, Clone)]
pub struct Provider {
    subscription: Subscription,
    inner: Inner<ProviderModel>,
}

impl Provider {
    /// Provider resource id.
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// Provider namespace.
    pub fn namespace(&self) -> &str {
        self.inner
            .properties
            .namespace
            .as_deref()
            .unwrap_or(&self.inner.name)
    }

    /// Registration state, such as `Registered`.
    pub fn registration_state(&self) -> Option<&str> {
        self.inner.properties.registration_state.as_deref()
    }

    /// Resource types keyed by type name.
    pub fn resource_types(&self) -> BTreeMap<&str, &ResourceType> {
        self.inner
            .properties
            .resource_types
            .iter()
            .map(|t| (t.name.as_str(), t))
            .collect()
    }

    /// Look up one resource type, ignoring case.
    pub fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.inner
            .properties
            .resource_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Re-read the provider.
    pub async fn refresh(&mut self) -> Result<&mut Self> {
        let record = self
            .subscription
            .client()
            .get_native(ResourceKind::Provider, None, &self.inner.name)
            .await?;
        self.inner = Inner::from_native(record)?;
        debug!(namespace = %self.namespace(), "Refreshed provider");
        Ok(self)
    }
}

/// Resource providers of a subscription, keyed by namespace.
#[derive(Debug, Clone)]
pub struct Providers {
    subscription: Subscription,
}

impl Providers {
    pub(crate) fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Read a provider by namespace or id.
    pub async fn get(&self, namespace: &str) -> Result<Provider> {
        let name = name_from_resource_id(namespace).ok_or_else(|| {
            ShortcutsError::validation(format!("'{namespace}' is not a provider namespace"))
        })?;

        let record = self
            .subscription
            .client()
            .get_native(ResourceKind::Provider, None, &name)
            .await?;
        self.wrap(record)
    }

    /// Every provider visible to the subscription.
    pub async fn as_map(&self) -> Result<BTreeMap<String, Provider>> {
        let records = self
            .subscription
            .client()
            .list_native(ResourceKind::Provider, None)
            .await?;

        let mut map = BTreeMap::new();
        for record in records {
            let provider = self.wrap(record)?;
            map.insert(provider.namespace().to_string(), provider);
        }

        debug!(count = map.len(), "Listed providers");
        Ok(map)
    }

    fn wrap(&self, record: shortcuts_core::NativeRecord) -> Result<Provider> {
        Ok(Provider {
            subscription: self.subscription.clone(),
            inner: Inner::from_native(record)?,
        })
    }
}
