//! Integration tests for common Azure Shortcuts workflows.
//!
//! These tests drive the public facade end to end against the in-memory
//! management client.

use async_trait::async_trait;
use azure_shortcuts::prelude::*;
use azure_shortcuts::{NativeRecord, Operation, ResourceKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn session() -> (MemoryManagementClient, Subscription) {
    let client = MemoryManagementClient::with_subscription("11111111-2222-3333-4444-555555555555");
    let config = ShortcutsConfig::builder()
        .subscription_id(client.subscription_id())
        .build()
        .unwrap();
    let subscription = Subscription::new(Arc::new(client.clone()), config);
    (client, subscription)
}

// =============================================================================
// Virtual Machine Workflow
// =============================================================================

#[tokio::test]
async fn test_virtual_machine_lifecycle() {
    let (client, subscription) = session();

    // Define and provision into a new group
    let mut vm = subscription
        .virtual_machines()
        .define("vm1")
        .unwrap()
        .with_region(Region::UsWest)
        .with_new_resource_group_named("group1")
        .with_admin_username("shortcuts")
        .with_admin_password("Abcd.1234")
        .with_latest_image("MicrosoftWindowsServer", "WindowsServer", "2008-R2-SP1")
        .with_size(VmSize::BasicA1)
        .with_new_data_disk(100)
        .provision()
        .await
        .unwrap();

    assert_eq!(vm.lifecycle(), Lifecycle::Bound);
    assert_eq!(vm.resource_group(), Some("group1"));
    assert!(vm.id().unwrap().starts_with("/subscriptions/11111111-"));

    // Add a second machine to the same group
    subscription
        .virtual_machines()
        .define("lx1")
        .unwrap()
        .with_region(Region::UsWest)
        .with_existing_resource_group("group1")
        .with_admin_username("shortcuts")
        .with_latest_image("Canonical", "UbuntuServer", "14.04.3-LTS")
        .with_size("Basic_A1")
        .provision()
        .await
        .unwrap();

    // List across the subscription and within the group
    let all = subscription.virtual_machines().as_map().await.unwrap();
    let in_group = subscription.virtual_machines().as_map_in("group1").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.keys().collect::<Vec<_>>(), in_group.keys().collect::<Vec<_>>());

    // Read by id and by group and name
    let by_id = subscription.virtual_machines().get(vm.id().unwrap()).await.unwrap();
    let by_name = subscription
        .virtual_machines()
        .get_in("group1", by_id.computer_name().unwrap())
        .await
        .unwrap();
    assert_eq!(by_id.id(), by_name.id());
    assert_eq!(by_name.data_disks().len(), 1);

    // Power operations
    vm.restart().await.unwrap();
    vm.deallocate().await.unwrap();
    vm.refresh().await.unwrap();
    assert_eq!(vm.power_state(), Some("deallocated"));

    // Tear down
    vm.delete().await.unwrap();
    subscription.resource_groups().delete("group1").await.unwrap();
    assert!(subscription.virtual_machines().as_map().await.unwrap().is_empty());
    assert_eq!(client.call_count(Operation::Action), 2);
}

// =============================================================================
// Public IP Address Workflow
// =============================================================================

#[tokio::test]
async fn test_public_ip_address_updates() {
    let (client, subscription) = session();

    let pip = subscription
        .public_ip_addresses()
        .define("pip1")
        .unwrap()
        .with_region(Region::UsWest)
        .with_new_resource_group()
        .with_dynamic_ip()
        .with_leaf_domain_label("pip1label")
        .provision()
        .await
        .unwrap();
    assert_eq!(pip.ip_address(), None);
    assert_eq!(pip.fqdn(), Some("pip1label.westus.cloudapp.azure.com"));

    // Update through a fresh wrapper without reading first
    let pip = subscription
        .public_ip_addresses()
        .update(pip.id().unwrap())
        .unwrap()
        .with_static_ip()
        .without_leaf_domain_label()
        .with_tag("stage", "2")
        .apply()
        .await
        .unwrap();

    assert_eq!(pip.ip_allocation_method(), IpAllocationMethod::Static);
    assert!(pip.ip_address().is_some());
    assert_eq!(pip.fqdn(), None);
    assert_eq!(pip.region(), Some("westus"));

    let stored = client
        .peek(ResourceKind::PublicIpAddress, Some("pip1group"), "pip1")
        .unwrap();
    assert_eq!(stored.properties["publicIPAllocationMethod"], "Static");
    assert_eq!(stored.properties.get("dnsSettings"), None);
}

// =============================================================================
// Network Security Group Workflow
// =============================================================================

#[tokio::test]
async fn test_network_security_group_rules() {
    let (_client, subscription) = session();
    let groups = subscription.resource_groups();
    groups
        .define("netgroup")
        .unwrap()
        .with_region(Region::EuropeNorth)
        .provision()
        .await
        .unwrap();

    let nsg = subscription
        .network_security_groups()
        .define("frontend")
        .unwrap()
        .with_region(Region::EuropeNorth)
        .with_existing_resource_group("netgroup")
        .with_allow_inbound(
            SecurityRuleSpec::new("https", 100)
                .with_protocol(Protocol::Tcp)
                .with_destination_port(443),
        )
        .with_deny_inbound(SecurityRuleSpec::new("deny-all", 4096))
        .provision()
        .await
        .unwrap();

    assert_eq!(nsg.security_rules().len(), 2);

    let nsg = nsg
        .with_allow_outbound(SecurityRuleSpec::new("dns", 150).with_destination_port(53))
        .apply()
        .await
        .unwrap();
    assert_eq!(nsg.security_rules().len(), 3);

    let err = nsg
        .with_allow_inbound(SecurityRuleSpec::new("http", 90))
        .apply()
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

// =============================================================================
// Availability Set Workflow
// =============================================================================

#[tokio::test]
async fn test_availability_set_members() {
    let (_client, subscription) = session();

    let set = subscription
        .availability_sets()
        .define("as1")
        .unwrap()
        .with_region(Region::UsEast)
        .with_new_resource_group()
        .provision()
        .await
        .unwrap();

    for name in ["web1", "web2"] {
        subscription
            .virtual_machines()
            .define(name)
            .unwrap()
            .with_region(Region::UsEast)
            .with_existing_resource_group("as1group")
            .with_availability_set(set.id().unwrap())
            .with_size(VmSize::StandardB1s)
            .with_admin_username("ops")
            .with_latest_image("Canonical", "UbuntuServer", "16.04-LTS")
            .provision()
            .await
            .unwrap();
    }

    let set = subscription.availability_sets().get_in("as1group", "as1").await.unwrap();
    assert_eq!(set.virtual_machine_ids().len(), 2);

    subscription.virtual_machines().delete_in("as1group", "web1").await.unwrap();
    let mut set = set;
    set.refresh().await.unwrap();
    assert_eq!(set.virtual_machine_ids().len(), 1);
}

// =============================================================================
// Provider Workflow
// =============================================================================

#[tokio::test]
async fn test_provider_api_versions() {
    let (client, subscription) = session();
    client.register_provider(
        "Microsoft.Storage",
        &[("storageAccounts", &["2015-05-01-preview", "2015-06-15", "2016-01-01"])],
    );

    let providers = subscription.providers().as_map().await.unwrap();
    let storage = &providers["Microsoft.Storage"];
    assert_eq!(storage.registration_state(), Some("Registered"));

    let accounts = storage.resource_type("storageAccounts").unwrap();
    assert_eq!(accounts.latest_api_version().as_deref(), Some("2016-01-01"));
}

// =============================================================================
// Resource Group Workflow
// =============================================================================

#[tokio::test]
async fn test_resource_group_tags_and_delete() {
    let (_client, subscription) = session();
    let groups = subscription.resource_groups();

    let group = groups
        .define("tagged")
        .unwrap()
        .with_region(Region::AsiaEast)
        .with_tag("a", "1")
        .with_tag("b", "2")
        .provision()
        .await
        .unwrap();

    let mut group = group.without_tag("a").apply().await.unwrap();
    assert_eq!(group.tags().len(), 1);
    assert_eq!(groups.get("tagged").await.unwrap().tags().len(), 1);

    group.delete().await.unwrap();
    assert!(groups.get("tagged").await.unwrap_err().is_not_found());
}

// =============================================================================
// Custom Client
// =============================================================================

/// Counts writes and delegates to the in-memory client.
struct CountingClient {
    inner: MemoryManagementClient,
    writes: AtomicUsize,
}

#[async_trait]
impl ManagementClient for CountingClient {
    async fn list_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
    ) -> Result<Vec<NativeRecord>> {
        self.inner.list_native(kind, group).await
    }

    async fn get_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
    ) -> Result<NativeRecord> {
        self.inner.get_native(kind, group, name).await
    }

    async fn create_or_update_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
        record: NativeRecord,
    ) -> Result<Option<NativeRecord>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create_or_update_native(kind, group, name, record).await
    }

    async fn delete_native(&self, kind: ResourceKind, group: Option<&str>, name: &str) -> Result<()> {
        self.inner.delete_native(kind, group, name).await
    }
}

#[tokio::test]
async fn test_custom_client_sees_one_write_per_resource() {
    let client = Arc::new(CountingClient {
        inner: MemoryManagementClient::new(),
        writes: AtomicUsize::new(0),
    });
    let subscription = Subscription::new(client.clone(), ShortcutsConfig::default());

    subscription
        .public_ip_addresses()
        .define("pip1")
        .unwrap()
        .with_region(Region::UsWest)
        .with_new_resource_group()
        .provision()
        .await
        .unwrap();

    // One write for the new group, one for the address.
    assert_eq!(client.writes.load(Ordering::SeqCst), 2);

    // Setters never talk to the service.
    let _staged = subscription
        .public_ip_addresses()
        .define("pip2")
        .unwrap()
        .with_static_ip()
        .with_tag("k", "v");
    assert_eq!(client.writes.load(Ordering::SeqCst), 2);
}
