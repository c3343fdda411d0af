//! Typed resource snapshots.
//!
//! Each resource type has a properties model implementing [`ResourceModel`].
//! [`Inner`] pairs that model with the envelope fields shared by every
//! resource and is the one snapshot a wrapper owns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use shortcuts_core::{NativeRecord, ResourceKind, Result, ShortcutsError};

/// Properties model of a resource type.
pub trait ResourceModel:
    Clone + Default + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The resource kind this model describes.
    const KIND: ResourceKind;

    /// Properties staged on a freshly defined resource.
    fn blank(_name: &str) -> Self {
        Self::default()
    }

    /// Checks that apply to every write.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Checks that a definition is complete enough to provision.
    fn validate_definition(&self) -> Result<()> {
        Ok(())
    }
}

/// Marker for models of resources that live inside a resource group.
pub trait GroupScopedModel: ResourceModel {}

/// Reference to another resource by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    /// Resource id.
    pub id: String,
}

impl SubResource {
    /// Reference a resource id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Last known state of a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Inner<P> {
    pub(crate) id: Option<String>,
    pub(crate) name: String,
    pub(crate) location: Option<String>,
    pub(crate) tags: HashMap<String, String>,
    pub(crate) provisioning_state: Option<String>,
    pub(crate) properties: P,
}

impl<P: ResourceModel> Inner<P> {
    pub(crate) fn blank(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            location: None,
            tags: HashMap::new(),
            provisioning_state: None,
            properties: P::blank(name),
        }
    }

    pub(crate) fn from_native(record: NativeRecord) -> Result<Self> {
        let properties = if record.properties.is_null() {
            P::default()
        } else {
            serde_json::from_value(record.properties)?
        };

        Ok(Self {
            id: record.id,
            name: record.name,
            location: record.location,
            tags: record.tags,
            provisioning_state: record.provisioning_state,
            properties,
        })
    }

    pub(crate) fn to_native(&self) -> Result<NativeRecord> {
        Ok(NativeRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            tags: self.tags.clone(),
            provisioning_state: self.provisioning_state.clone(),
            properties: serde_json::to_value(&self.properties)?,
        })
    }
}

/// Check a name against the rules that can be verified locally.
///
/// The service owns the full naming rules; anything else it rejects
/// surfaces when the resource is provisioned.
pub(crate) fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShortcutsError::validation(format!("{kind} name must not be empty")));
    }

    let max = kind.max_name_len();
    if name.chars().count() > max {
        return Err(ShortcutsError::validation(format!(
            "{kind} name '{name}' is longer than {max} characters"
        )));
    }

    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
        return Err(ShortcutsError::validation(format!(
            "{kind} name '{}' contains invalid character {c:?}",
            name.escape_debug()
        )));
    }

    Ok(())
}
