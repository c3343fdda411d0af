//! The session every collection and wrapper operates in.

use std::fmt;
use std::sync::Arc;
use tracing::info;

use shortcuts_core::{ManagementClient, ShortcutsConfig};

use crate::{
    AvailabilitySets, NetworkSecurityGroups, Providers, PublicIpAddresses, ResourceGroups,
    VirtualMachines,
};

struct SubscriptionInner {
    client: Arc<dyn ManagementClient>,
    config: ShortcutsConfig,
}

/// An authenticated session against one subscription.
///
/// Cheap to clone; clones share the same client. The session adds no
/// synchronization on top of the client, so sharing it between tasks is
/// only as safe as the client is.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Create a session from an authenticated client and a configuration.
    pub fn new(client: Arc<dyn ManagementClient>, config: ShortcutsConfig) -> Self {
        info!(
            subscription = ?config.subscription_id,
            endpoint = %config.resource_manager_endpoint,
            default_region = ?config.default_region,
            "Shortcuts session initialized"
        );

        Self {
            inner: Arc::new(SubscriptionInner { client, config }),
        }
    }

    /// Create a session with the default configuration.
    pub fn with_client(client: impl ManagementClient + 'static) -> Self {
        Self::new(Arc::new(client), ShortcutsConfig::default())
    }

    /// The management client.
    pub fn client(&self) -> &dyn ManagementClient {
        self.inner.client.as_ref()
    }

    /// The configuration.
    pub fn config(&self) -> &ShortcutsConfig {
        &self.inner.config
    }

    /// Resource groups in this subscription.
    pub fn resource_groups(&self) -> ResourceGroups {
        ResourceGroups::new(self.clone())
    }

    /// Availability sets in this subscription.
    pub fn availability_sets(&self) -> AvailabilitySets {
        AvailabilitySets::new(self.clone())
    }

    /// Network security groups in this subscription.
    pub fn network_security_groups(&self) -> NetworkSecurityGroups {
        NetworkSecurityGroups::new(self.clone())
    }

    /// Public IP addresses in this subscription.
    pub fn public_ip_addresses(&self) -> PublicIpAddresses {
        PublicIpAddresses::new(self.clone())
    }

    /// Virtual machines in this subscription.
    pub fn virtual_machines(&self) -> VirtualMachines {
        VirtualMachines::new(self.clone())
    }

    /// Resource providers registered in this subscription.
    pub fn providers(&self) -> Providers {
        Providers::new(self.clone())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("subscription_id", &self.inner.config.subscription_id)
            .field("endpoint", &self.inner.config.resource_manager_endpoint.as_str())
            .finish_non_exhaustive()
    }
}
