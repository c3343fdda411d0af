//! Resource groups.

use serde::{Deserialize, Serialize};

use shortcuts_core::ResourceKind;

use crate::collection::Collection;
use crate::model::ResourceModel;
use crate::resource::Resource;

/// Resource group properties. Groups carry no settings beyond the envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupModel {}

impl ResourceModel for ResourceGroupModel {
    const KIND: ResourceKind = ResourceKind::ResourceGroup;
}

/// A resource group.
pub type ResourceGroup = Resource<ResourceGroupModel>;

/// Resource groups of a subscription, keyed by name.
pub type ResourceGroups = Collection<ResourceGroupModel>;
