//! Generic resource wrapper.
//!
//! A [`Resource`] owns one snapshot of a remote resource. Fluent setters
//! stage changes into that snapshot; the verbs synchronize it with the
//! service:
//!
//! ```text
//! Defined --provision--> Bound --refresh/apply--> Bound --delete--> Deleted
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use shortcuts_core::{
    NativeRecord, Region, ResourceKind, Result, ShortcutsError, group_from_resource_id,
};

use crate::Subscription;
use crate::model::{GroupScopedModel, Inner, ResourceModel, validate_name};

/// Lifecycle state of a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Described locally, not yet confirmed to exist remotely.
    Defined,
    /// Corresponds to a confirmed remote resource.
    Bound,
    /// Deleted through this wrapper. Terminal.
    Deleted,
}

impl Lifecycle {
    /// Lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Defined => "defined",
            Lifecycle::Bound => "bound",
            Lifecycle::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GroupSelection {
    Unset,
    Existing(String),
    /// Create the group if missing. `None` derives the name from the resource.
    New(Option<String>),
}

type Change<P> = Arc<dyn Fn(&mut Inner<P>) + Send + Sync>;

/// Changes staged on a wrapper that has not read its resource yet.
///
/// `apply` replays them over the remote state so unstaged fields keep
/// their current values.
pub(crate) struct Unread<P>(Vec<Change<P>>);

impl<P> Clone for Unread<P> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<P> fmt::Debug for Unread<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unread").field("staged", &self.0.len()).finish()
    }
}

/// A managed resource.
///
/// Use the per-type aliases such as [`crate::PublicIpAddress`] rather than
/// naming this type directly.
#[derive(Debug, Clone)]
pub struct Resource<P> {
    subscription: Subscription,
    lifecycle: Lifecycle,
    group: GroupSelection,
    unread: Option<Unread<P>>,
    pub(crate) inner: Inner<P>,
}

impl<P: ResourceModel> Resource<P> {
    pub(crate) fn defined(subscription: Subscription, name: &str) -> Result<Self> {
        validate_name(P::KIND, name)?;

        let mut inner = Inner::blank(name);
        let config = subscription.config();
        inner.location = config.default_region.as_ref().map(|r| r.as_str().to_string());
        inner.tags = config.default_tags.clone();

        Ok(Self {
            subscription,
            lifecycle: Lifecycle::Defined,
            group: GroupSelection::Unset,
            unread: None,
            inner,
        })
    }

    pub(crate) fn bound(
        subscription: Subscription,
        group: Option<&str>,
        record: NativeRecord,
    ) -> Result<Self> {
        let inner = Inner::<P>::from_native(record)?;
        let group = if P::KIND.is_group_scoped() {
            inner
                .id
                .as_deref()
                .and_then(group_from_resource_id)
                .or_else(|| group.map(str::to_string))
                .map_or(GroupSelection::Unset, GroupSelection::Existing)
        } else {
            GroupSelection::Unset
        };

        Ok(Self {
            subscription,
            lifecycle: Lifecycle::Bound,
            group,
            unread: None,
            inner,
        })
    }

    /// A bound wrapper for an existing resource that has not been read.
    pub(crate) fn unread(subscription: Subscription, group: Option<String>, name: String) -> Self {
        Self {
            subscription,
            lifecycle: Lifecycle::Bound,
            group: group.map_or(GroupSelection::Unset, GroupSelection::Existing),
            unread: Some(Unread(Vec::new())),
            inner: Inner {
                name,
                ..Default::default()
            },
        }
    }

    /// Resource id assigned by the service, once known.
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Region, if staged or known.
    pub fn region(&self) -> Option<&str> {
        self.inner.location.as_deref()
    }

    /// Tags.
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.inner.tags
    }

    /// Provisioning state last reported by the service.
    pub fn provisioning_state(&self) -> Option<&str> {
        self.inner.provisioning_state.as_deref()
    }

    /// Lifecycle state of this wrapper.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Group used for remote calls.
    pub(crate) fn group_name(&self) -> Option<&str> {
        match &self.group {
            GroupSelection::Existing(name) | GroupSelection::New(Some(name)) => Some(name),
            GroupSelection::New(None) | GroupSelection::Unset => None,
        }
    }

    /// Apply a change to the snapshot, recording it when the resource has
    /// not been read yet.
    pub(crate) fn stage(
        mut self,
        change: impl Fn(&mut Inner<P>) + Send + Sync + 'static,
    ) -> Self {
        change(&mut self.inner);
        if let Some(Unread(changes)) = &mut self.unread {
            changes.push(Arc::new(change));
        }
        self
    }

    /// Set the region.
    pub fn with_region(self, region: impl Into<Region>) -> Self {
        let location = region.into().as_str().to_string();
        self.stage(move |inner| inner.location = Some(location.clone()))
    }

    /// Replace all tags.
    pub fn with_tags(self, tags: HashMap<String, String>) -> Self {
        self.stage(move |inner| inner.tags = tags.clone())
    }

    /// Add or replace a tag.
    pub fn with_tag(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.stage(move |inner| {
            inner.tags.insert(key.clone(), value.clone());
        })
    }

    /// Remove a tag.
    pub fn without_tag(self, key: &str) -> Self {
        let key = key.to_string();
        self.stage(move |inner| {
            inner.tags.remove(&key);
        })
    }

    /// Create the resource.
    ///
    /// Ensures a resource group declared with `with_new_resource_group*`
    /// exists, sends the staged state, then reads the resource back so the
    /// returned wrapper holds what the service stored.
    pub async fn provision(mut self) -> Result<Self> {
        self.require_state("provision", Lifecycle::Defined)?;
        self.inner.properties.validate_definition()?;
        self.inner.properties.validate()?;

        let region = self.inner.location.clone().ok_or_else(|| {
            ShortcutsError::validation(format!(
                "a region is required to provision {} '{}'",
                P::KIND,
                self.inner.name
            ))
        })?;

        let group = if P::KIND.is_group_scoped() {
            Some(self.resolve_group(&region).await?)
        } else {
            None
        };

        info!(
            kind = %P::KIND,
            name = %self.inner.name,
            group = ?group,
            region = %region,
            "Provisioning resource"
        );

        let record = self.inner.to_native()?;
        let response = self
            .subscription
            .client()
            .create_or_update_native(P::KIND, group.as_deref(), &self.inner.name, record)
            .await?;

        if response.is_none_or(|r| r.properties.is_null()) {
            warn!(name = %self.inner.name, "Create response was partial, re-reading");
        }

        let record = self
            .subscription
            .client()
            .get_native(P::KIND, group.as_deref(), &self.inner.name)
            .await?;

        self.inner = Inner::from_native(record)?;
        self.lifecycle = Lifecycle::Bound;
        if let Some(group) = group {
            self.group = GroupSelection::Existing(group);
        }

        Ok(self)
    }

    /// Send staged changes for an existing resource.
    ///
    /// The region cannot change but must be resent; when none is staged the
    /// current remote region is read and reused. A wrapper from
    /// [`Collection::update`](crate::Collection::update) reads the resource
    /// first and replays its staged changes over it, so fields it never
    /// touched keep their remote values.
    pub async fn apply(mut self) -> Result<Self> {
        self.require_state("apply", Lifecycle::Bound)?;
        self.inner.properties.validate()?;

        let group = self.group_name().map(str::to_string);
        let client = self.subscription.client();

        if let Some(Unread(changes)) = self.unread.take() {
            let current = client
                .get_native(P::KIND, group.as_deref(), &self.inner.name)
                .await?;
            let mut inner = Inner::from_native(current)?;
            for change in &changes {
                change(&mut inner);
            }
            inner.properties.validate()?;
            debug!(name = %self.inner.name, staged = changes.len(), "Replayed staged changes over remote state");
            self.inner = inner;
        } else if self.inner.location.is_none() {
            let current = client
                .get_native(P::KIND, group.as_deref(), &self.inner.name)
                .await?;
            debug!(name = %self.inner.name, region = ?current.location, "Reusing remote region");
            self.inner.location = current.location;
        }

        info!(kind = %P::KIND, name = %self.inner.name, group = ?group, "Applying resource update");

        let record = self.inner.to_native()?;
        client
            .create_or_update_native(P::KIND, group.as_deref(), &self.inner.name, record)
            .await?;

        let record = client
            .get_native(P::KIND, group.as_deref(), &self.inner.name)
            .await?;
        self.inner = Inner::from_native(record)?;

        Ok(self)
    }

    /// Re-read the resource, discarding staged changes.
    pub async fn refresh(&mut self) -> Result<&mut Self> {
        self.require_state("refresh", Lifecycle::Bound)?;
        self.inner = self.fetch().await?;
        self.unread = None;
        Ok(self)
    }

    /// Delete the resource.
    ///
    /// Success means the service accepted the request. Listings may keep
    /// returning the resource for a short while afterwards.
    pub async fn delete(&mut self) -> Result<()> {
        self.require_state("delete", Lifecycle::Bound)?;

        self.subscription
            .client()
            .delete_native(P::KIND, self.group_name(), &self.inner.name)
            .await?;
        self.lifecycle = Lifecycle::Deleted;

        info!(kind = %P::KIND, name = %self.inner.name, group = ?self.group_name(), "Deleted resource");
        Ok(())
    }

    pub(crate) fn require_state(&self, operation: &'static str, state: Lifecycle) -> Result<()> {
        if self.lifecycle == state {
            Ok(())
        } else {
            Err(ShortcutsError::invalid_state(operation, self.lifecycle.as_str()))
        }
    }

    async fn fetch(&self) -> Result<Inner<P>> {
        let record = self
            .subscription
            .client()
            .get_native(P::KIND, self.group_name(), &self.inner.name)
            .await?;
        debug!(kind = %P::KIND, name = %self.inner.name, "Read resource");
        Inner::from_native(record)
    }

    async fn resolve_group(&self, region: &str) -> Result<String> {
        match &self.group {
            GroupSelection::Unset => Err(ShortcutsError::validation(format!(
                "a resource group is required to provision {} '{}'",
                P::KIND,
                self.inner.name
            ))),
            GroupSelection::Existing(name) => {
                validate_name(ResourceKind::ResourceGroup, name)?;
                Ok(name.clone())
            }
            GroupSelection::New(name) => {
                let name = name.clone().unwrap_or_else(|| {
                    format!(
                        "{}{}",
                        self.inner.name,
                        self.subscription.config().new_group_suffix
                    )
                });
                validate_name(ResourceKind::ResourceGroup, &name)?;
                ensure_resource_group(&self.subscription, &name, region).await?;
                Ok(name)
            }
        }
    }
}

impl<P: GroupScopedModel> Resource<P> {
    /// Resource group the resource lives in, or will be created in.
    pub fn resource_group(&self) -> Option<&str> {
        self.group_name()
    }

    /// Place the resource in an existing resource group.
    pub fn with_existing_resource_group(mut self, group: impl Into<String>) -> Self {
        self.group = GroupSelection::Existing(group.into());
        self
    }

    /// Place the resource in a new resource group named after the resource.
    pub fn with_new_resource_group(mut self) -> Self {
        self.group = GroupSelection::New(None);
        self
    }

    /// Place the resource in a new resource group, created if missing.
    pub fn with_new_resource_group_named(mut self, group: impl Into<String>) -> Self {
        self.group = GroupSelection::New(Some(group.into()));
        self
    }
}

/// Make sure a resource group exists, creating it in `region` if missing.
///
/// Any failure is reported as [`ShortcutsError::Dependency`].
pub(crate) async fn ensure_resource_group(
    subscription: &Subscription,
    name: &str,
    region: &str,
) -> Result<()> {
    let client = subscription.client();

    match client
        .get_native(ResourceKind::ResourceGroup, None, name)
        .await
    {
        Ok(_) => {
            debug!(group = %name, "Resource group already exists");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            let record = NativeRecord::named(name).with_location(region);
            client
                .create_or_update_native(ResourceKind::ResourceGroup, None, name, record)
                .await
                .map_err(|e| ShortcutsError::dependency(name, e))?;
            info!(group = %name, region = %region, "Created resource group");
            Ok(())
        }
        Err(e) => Err(ShortcutsError::dependency(name, e)),
    }
}
