//! Resource identifier helpers.
//!
//! Resource ids come back from the service as ARM paths such as
//! `/subscriptions/<sub>/resourceGroups/<group>/providers/Microsoft.Network/publicIPAddresses/<name>`.
//! Callers may also use the short `<group>/<name>` form. Ids are kept as
//! plain strings on the wrappers; these helpers derive parts on demand.

use crate::{Result, ShortcutsError};

const RESOURCE_GROUPS_SEGMENT: &str = "resourcegroups";
const SUBSCRIPTIONS_SEGMENT: &str = "subscriptions";

/// Components of a group-scoped resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    /// Subscription id, when the id is a full ARM path.
    pub subscription: Option<String>,
    /// Resource group name.
    pub group: String,
    /// Resource name.
    pub name: String,
}

impl ResourceId {
    /// Parse either a full ARM id or the short `<group>/<name>` form.
    pub fn parse(id: &str) -> Result<Self> {
        let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();

        let group_pos = segments
            .iter()
            .position(|s| s.eq_ignore_ascii_case(RESOURCE_GROUPS_SEGMENT));

        // Without a leading slash two segments are always `<group>/<name>`,
        // even when the group is itself named `resourceGroups`.
        let short_form = !id.starts_with('/') && segments.len() == 2;

        match (group_pos, segments.as_slice()) {
            (_, [group, name]) if short_form => Ok(Self {
                subscription: None,
                group: group.to_string(),
                name: name.to_string(),
            }),
            (Some(pos), _) if pos + 2 < segments.len() => {
                let subscription = segments
                    .iter()
                    .position(|s| s.eq_ignore_ascii_case(SUBSCRIPTIONS_SEGMENT))
                    .and_then(|p| segments.get(p + 1))
                    .map(|s| s.to_string());

                Ok(Self {
                    subscription,
                    group: segments[pos + 1].to_string(),
                    name: segments[segments.len() - 1].to_string(),
                })
            }
            (None, [group, name]) => Ok(Self {
                subscription: None,
                group: group.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ShortcutsError::validation(format!(
                "'{id}' is not a resource id of the form <group>/<name> or an ARM resource path"
            ))),
        }
    }

    /// Build a full ARM id for a group-scoped resource.
    pub fn arm(subscription: &str, group: &str, resource_type: &str, name: &str) -> String {
        format!("/subscriptions/{subscription}/resourceGroups/{group}/providers/{resource_type}/{name}")
    }

    /// Build the ARM id of a resource group.
    pub fn arm_group(subscription: &str, group: &str) -> String {
        format!("/subscriptions/{subscription}/resourceGroups/{group}")
    }
}

/// Extract the resource group name from a resource id.
pub fn group_from_resource_id(id: &str) -> Option<String> {
    ResourceId::parse(id).ok().map(|parsed| parsed.group)
}

/// Extract the resource name from a resource id.
///
/// This is the last path segment, so it also works for resource group ids.
pub fn name_from_resource_id(id: &str) -> Option<String> {
    id.rsplit('/')
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}
