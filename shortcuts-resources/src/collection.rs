//! Generic collection accessor.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info};

use shortcuts_core::{ResourceId, Result, ShortcutsError, name_from_resource_id};

use crate::Subscription;
use crate::model::{GroupScopedModel, ResourceModel, validate_name};
use crate::resource::Resource;

/// Entry point for one resource type within a subscription.
///
/// Obtained from the per-type methods on [`Subscription`], for example
/// [`Subscription::public_ip_addresses`].
pub struct Collection<P> {
    subscription: Subscription,
    _model: PhantomData<fn() -> P>,
}

impl<P> Clone for Collection<P> {
    fn clone(&self) -> Self {
        Self {
            subscription: self.subscription.clone(),
            _model: PhantomData,
        }
    }
}

impl<P: ResourceModel> fmt::Debug for Collection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &P::KIND)
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<P: ResourceModel> Collection<P> {
    pub(crate) fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            _model: PhantomData,
        }
    }

    /// Start describing a resource that does not exist yet.
    ///
    /// Nothing is sent until the returned wrapper is provisioned. The
    /// configured default region and tags are staged up front.
    pub fn define(&self, name: &str) -> Result<Resource<P>> {
        let resource = Resource::defined(self.subscription.clone(), name)?;
        debug!(kind = %P::KIND, name = %name, "Defined resource");
        Ok(resource)
    }

    /// Read an existing resource by id.
    ///
    /// Group scoped resources accept a full resource id or the short
    /// `group/name` form; other kinds accept an id or a bare name.
    pub async fn get(&self, id: &str) -> Result<Resource<P>> {
        let (group, name) = self.split_id(id)?;
        self.fetch(group.as_deref(), &name).await
    }

    /// Wrap an existing resource for modification without reading it.
    ///
    /// Stage changes on the returned wrapper and send them with
    /// [`Resource::apply`], which reads the resource and replays the staged
    /// changes over it. Until then accessors only reflect staged values.
    pub fn update(&self, id: &str) -> Result<Resource<P>> {
        let (group, name) = self.split_id(id)?;
        Ok(Resource::unread(self.subscription.clone(), group, name))
    }

    /// Every resource of this type in the subscription.
    ///
    /// Group scoped resources are keyed by resource id, others by name.
    pub async fn as_map(&self) -> Result<BTreeMap<String, Resource<P>>> {
        self.list(None).await
    }

    /// Delete a resource by id.
    ///
    /// Success means the service accepted the request; a listing taken
    /// right afterwards may still contain the resource.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (group, name) = self.split_id(id)?;
        self.remove(group.as_deref(), &name).await
    }

    async fn fetch(&self, group: Option<&str>, name: &str) -> Result<Resource<P>> {
        let record = self
            .subscription
            .client()
            .get_native(P::KIND, group, name)
            .await?;
        debug!(kind = %P::KIND, group = ?group, name = %name, "Read resource");
        Resource::bound(self.subscription.clone(), group, record)
    }

    async fn list(&self, group: Option<&str>) -> Result<BTreeMap<String, Resource<P>>> {
        let records = self.subscription.client().list_native(P::KIND, group).await?;

        let mut map = BTreeMap::new();
        for record in records {
            let resource = Resource::bound(self.subscription.clone(), group, record)?;
            let key = match (P::KIND.is_group_scoped(), resource.id()) {
                (true, Some(id)) => id.to_string(),
                (true, None) => format!(
                    "{}/{}",
                    resource.group_name().unwrap_or_default(),
                    resource.name()
                ),
                (false, _) => resource.name().to_string(),
            };
            map.insert(key, resource);
        }

        debug!(kind = %P::KIND, group = ?group, count = map.len(), "Listed resources");
        Ok(map)
    }

    async fn remove(&self, group: Option<&str>, name: &str) -> Result<()> {
        self.subscription
            .client()
            .delete_native(P::KIND, group, name)
            .await?;
        info!(kind = %P::KIND, group = ?group, name = %name, "Deleted resource");
        Ok(())
    }

    fn split_id(&self, id: &str) -> Result<(Option<String>, String)> {
        if P::KIND.is_group_scoped() {
            let parsed = ResourceId::parse(id)?;
            return Ok((Some(parsed.group), parsed.name));
        }

        let name = name_from_resource_id(id).ok_or_else(|| {
            ShortcutsError::validation(format!("'{id}' is not a valid {} id", P::KIND))
        })?;
        Ok((None, name))
    }
}

impl<P: GroupScopedModel> Collection<P> {
    /// Read an existing resource by group and name.
    pub async fn get_in(&self, group: &str, name: &str) -> Result<Resource<P>> {
        self.fetch(Some(group), name).await
    }

    /// Every resource of this type in one resource group, keyed by id.
    pub async fn as_map_in(&self, group: &str) -> Result<BTreeMap<String, Resource<P>>> {
        validate_name(shortcuts_core::ResourceKind::ResourceGroup, group)?;
        self.list(Some(group)).await
    }

    /// Delete a resource by group and name.
    pub async fn delete_in(&self, group: &str, name: &str) -> Result<()> {
        self.remove(Some(group), name).await
    }
}
