//! Availability sets.

use serde::{Deserialize, Serialize};

use shortcuts_core::{ResourceKind, Result, ShortcutsError};

use crate::collection::Collection;
use crate::model::{GroupScopedModel, ResourceModel, SubResource};
use crate::resource::Resource;

const MAX_FAULT_DOMAINS: u32 = 3;
const MAX_UPDATE_DOMAINS: u32 = 20;

/// Availability set properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvailabilitySetModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    platform_fault_domain_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform_update_domain_count: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    virtual_machines: Vec<SubResource>,
}

impl ResourceModel for AvailabilitySetModel {
    const KIND: ResourceKind = ResourceKind::AvailabilitySet;

    fn validate(&self) -> Result<()> {
        if let Some(count) = self.platform_fault_domain_count
            && !(1..=MAX_FAULT_DOMAINS).contains(&count)
        {
            return Err(ShortcutsError::validation(format!(
                "fault domain count must be between 1 and {MAX_FAULT_DOMAINS}, got {count}"
            )));
        }

        if let Some(count) = self.platform_update_domain_count
            && !(1..=MAX_UPDATE_DOMAINS).contains(&count)
        {
            return Err(ShortcutsError::validation(format!(
                "update domain count must be between 1 and {MAX_UPDATE_DOMAINS}, got {count}"
            )));
        }

        Ok(())
    }
}

impl GroupScopedModel for AvailabilitySetModel {}

/// An availability set.
pub type AvailabilitySet = Resource<AvailabilitySetModel>;

/// Availability sets of a subscription, keyed by resource id.
pub type AvailabilitySets = Collection<AvailabilitySetModel>;

impl Resource<AvailabilitySetModel> {
    /// Ids of the virtual machines placed in this set.
    pub fn virtual_machine_ids(&self) -> Vec<&str> {
        self.inner
            .properties
            .virtual_machines
            .iter()
            .map(|vm| vm.id.as_str())
            .collect()
    }

    /// Number of fault domains, if set.
    pub fn platform_fault_domain_count(&self) -> Option<u32> {
        self.inner.properties.platform_fault_domain_count
    }

    /// Number of update domains, if set.
    pub fn platform_update_domain_count(&self) -> Option<u32> {
        self.inner.properties.platform_update_domain_count
    }

    /// Spread members over `count` fault domains.
    pub fn with_fault_domain_count(self, count: u32) -> Self {
        self.stage(move |inner| inner.properties.platform_fault_domain_count = Some(count))
    }

    /// Spread members over `count` update domains.
    pub fn with_update_domain_count(self, count: u32) -> Self {
        self.stage(move |inner| inner.properties.platform_update_domain_count = Some(count))
    }
}
