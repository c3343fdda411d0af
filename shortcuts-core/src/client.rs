//! The management client seam.
//!
//! Every remote call made by the facade goes through [`ManagementClient`].
//! Implementations are handed in already authenticated; the facade never
//! builds credentials or HTTP clients itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{Result, ShortcutsError};

/// Resource types the facade knows how to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A resource group. Subscription scoped.
    ResourceGroup,
    /// A compute availability set.
    AvailabilitySet,
    /// A network security group.
    NetworkSecurityGroup,
    /// A public IP address.
    PublicIpAddress,
    /// A virtual machine.
    VirtualMachine,
    /// A resource provider registration. Subscription scoped, read only.
    Provider,
}

impl ResourceKind {
    /// The ARM resource type, e.g. `Microsoft.Network/publicIPAddresses`.
    pub fn resource_type(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "Microsoft.Resources/resourceGroups",
            ResourceKind::AvailabilitySet => "Microsoft.Compute/availabilitySets",
            ResourceKind::NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            ResourceKind::PublicIpAddress => "Microsoft.Network/publicIPAddresses",
            ResourceKind::VirtualMachine => "Microsoft.Compute/virtualMachines",
            ResourceKind::Provider => "Microsoft.Resources/providers",
        }
    }

    /// Whether resources of this kind live inside a resource group.
    pub fn is_group_scoped(&self) -> bool {
        !matches!(self, ResourceKind::ResourceGroup | ResourceKind::Provider)
    }

    /// Longest name the service accepts for this kind.
    pub fn max_name_len(&self) -> usize {
        match self {
            ResourceKind::ResourceGroup => 90,
            ResourceKind::VirtualMachine => 64,
            ResourceKind::Provider => 256,
            _ => 80,
        }
    }

    /// Human readable name used in errors and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resource group",
            ResourceKind::AvailabilitySet => "availability set",
            ResourceKind::NetworkSecurityGroup => "network security group",
            ResourceKind::PublicIpAddress => "public IP address",
            ResourceKind::VirtualMachine => "virtual machine",
            ResourceKind::Provider => "provider",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The remote representation of a resource, as exchanged with the client.
///
/// The envelope fields are shared by every resource type; everything type
/// specific lives in `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRecord {
    /// Resource id assigned by the service.
    #[serde(default)]
    pub id: Option<String>,
    /// Short resource name.
    pub name: String,
    /// Region the resource lives in.
    #[serde(default)]
    pub location: Option<String>,
    /// Resource tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Provisioning state reported by the service.
    #[serde(default)]
    pub provisioning_state: Option<String>,
    /// Resource specific payload.
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl NativeRecord {
    /// Create a record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the properties payload.
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }
}

/// Remote management operations, per resource kind.
///
/// `group` is `None` for subscription scoped kinds (resource groups and
/// providers) and for subscription wide listings.
///
/// Implementations must be safe to share between tasks; the facade adds
/// no synchronization of its own.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// List resources of a kind, optionally restricted to a resource group.
    async fn list_native(&self, kind: ResourceKind, group: Option<&str>)
        -> Result<Vec<NativeRecord>>;

    /// Read one resource. Fails with [`ShortcutsError::NotFound`] if absent.
    async fn get_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
    ) -> Result<NativeRecord>;

    /// Create or replace a resource.
    ///
    /// The returned record, when present, may be partial.
    async fn create_or_update_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
        record: NativeRecord,
    ) -> Result<Option<NativeRecord>>;

    /// Request deletion of a resource.
    ///
    /// Returning `Ok` means the request was accepted. Listings may still
    /// include the resource for a while afterwards.
    async fn delete_native(&self, kind: ResourceKind, group: Option<&str>, name: &str)
        -> Result<()>;

    /// Invoke a resource action such as `restart` on a virtual machine.
    async fn invoke_action(
        &self,
        kind: ResourceKind,
        _group: Option<&str>,
        _name: &str,
        action: &str,
    ) -> Result<()> {
        Err(ShortcutsError::validation(format!(
            "action '{action}' is not supported on a {kind}"
        )))
    }
}
