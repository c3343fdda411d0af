//! Public IP addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

use shortcuts_core::{ResourceKind, Result, ShortcutsError};

use crate::collection::Collection;
use crate::model::{GroupScopedModel, ResourceModel};
use crate::resource::Resource;

/// How the address is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IpAllocationMethod {
    /// Assigned when the resource is created and kept until deletion.
    Static,
    /// Assigned when attached to a running resource.
    #[default]
    Dynamic,
}

impl fmt::Display for IpAllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAllocationMethod::Static => f.write_str("Static"),
            IpAllocationMethod::Dynamic => f.write_str("Dynamic"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DnsSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    domain_name_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fqdn: Option<String>,
}

/// Public IP address properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicIpAddressModel {
    #[serde(rename = "publicIPAllocationMethod")]
    allocation_method: IpAllocationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_settings: Option<DnsSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    idle_timeout_in_minutes: Option<u32>,
}

impl ResourceModel for PublicIpAddressModel {
    const KIND: ResourceKind = ResourceKind::PublicIpAddress;

    fn validate(&self) -> Result<()> {
        if let Some(label) = self
            .dns_settings
            .as_ref()
            .and_then(|dns| dns.domain_name_label.as_deref())
        {
            validate_leaf_domain_label(label)?;
        }

        if let Some(minutes) = self.idle_timeout_in_minutes
            && !(4..=30).contains(&minutes)
        {
            return Err(ShortcutsError::validation(format!(
                "idle timeout must be between 4 and 30 minutes, got {minutes}"
            )));
        }

        Ok(())
    }
}

impl GroupScopedModel for PublicIpAddressModel {}

/// A public IP address.
pub type PublicIpAddress = Resource<PublicIpAddressModel>;

/// Public IP addresses of a subscription, keyed by resource id.
pub type PublicIpAddresses = Collection<PublicIpAddressModel>;

impl Resource<PublicIpAddressModel> {
    /// Assigned address. Dynamic addresses have none until attached.
    pub fn ip_address(&self) -> Option<&str> {
        self.inner.properties.ip_address.as_deref()
    }

    /// How the address is assigned.
    pub fn ip_allocation_method(&self) -> IpAllocationMethod {
        self.inner.properties.allocation_method
    }

    /// DNS label under the region's `cloudapp.azure.com` zone.
    pub fn leaf_domain_label(&self) -> Option<&str> {
        self.inner
            .properties
            .dns_settings
            .as_ref()
            .and_then(|dns| dns.domain_name_label.as_deref())
    }

    /// Fully qualified domain name, computed by the service from the label.
    pub fn fqdn(&self) -> Option<&str> {
        self.inner
            .properties
            .dns_settings
            .as_ref()
            .and_then(|dns| dns.fqdn.as_deref())
    }

    /// Minutes an idle TCP connection is kept open, if set.
    pub fn idle_timeout_in_minutes(&self) -> Option<u32> {
        self.inner.properties.idle_timeout_in_minutes
    }

    /// Switch to static allocation. The address is assigned on the next write.
    pub fn with_static_ip(self) -> Self {
        self.stage(|inner| inner.properties.allocation_method = IpAllocationMethod::Static)
    }

    /// Switch to dynamic allocation, releasing any static address.
    pub fn with_dynamic_ip(self) -> Self {
        self.stage(|inner| {
            inner.properties.allocation_method = IpAllocationMethod::Dynamic;
            inner.properties.ip_address = None;
        })
    }

    /// Set the DNS label. Must be unique within the region.
    pub fn with_leaf_domain_label(self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.stage(move |inner| {
            inner.properties.dns_settings = Some(DnsSettings {
                domain_name_label: Some(label.clone()),
                fqdn: None,
            })
        })
    }

    /// Remove the DNS label and with it the FQDN.
    pub fn without_leaf_domain_label(self) -> Self {
        self.stage(|inner| inner.properties.dns_settings = None)
    }

    /// Close idle TCP connections after 4 to 30 minutes.
    pub fn with_idle_timeout_in_minutes(self, minutes: u32) -> Self {
        self.stage(move |inner| inner.properties.idle_timeout_in_minutes = Some(minutes))
    }
}

/// Labels are 3 to 63 characters of lowercase letters, digits and hyphens,
/// starting with a letter and not ending with a hyphen.
fn validate_leaf_domain_label(label: &str) -> Result<()> {
    let bytes = label.as_bytes();
    let valid = (3..=63).contains(&bytes.len())
        && bytes[0].is_ascii_lowercase()
        && bytes[bytes.len() - 1] != b'-'
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');

    if valid {
        Ok(())
    } else {
        Err(ShortcutsError::validation(format!(
            "'{label}' is not a valid domain name label"
        )))
    }
}
