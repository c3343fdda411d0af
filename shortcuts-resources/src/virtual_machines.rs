//! Virtual machines.
//!
//! A machine needs a size, an admin user name and an image before it can be
//! provisioned. The admin password is write-only: it is sent on provision,
//! never returned by the service, and redacted from `Debug` output.
//!
//! Power actions (`start`, `restart`, `power_off`, `deallocate`) are sent
//! immediately and leave the local snapshot alone; call
//! [`Resource::refresh`] to observe the new power state.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use shortcuts_core::{ResourceKind, Result, ShortcutsError};

use crate::collection::Collection;
use crate::model::{GroupScopedModel, ResourceModel, SubResource};
use crate::resource::{Lifecycle, Resource};

const MAX_DATA_DISK_GB: u32 = 1023;

/// Machine size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VmSize {
    /// `Basic_A0`
    BasicA0,
    /// `Basic_A1`
    BasicA1,
    /// `Basic_A2`
    BasicA2,
    /// `Standard_A1`
    StandardA1,
    /// `Standard_A2`
    StandardA2,
    /// `Standard_B1s`
    StandardB1s,
    /// `Standard_B2s`
    StandardB2s,
    /// `Standard_D1_v2`
    StandardD1V2,
    /// `Standard_D2_v2`
    StandardD2V2,
    /// `Standard_DS1_v2`
    StandardDs1V2,
    /// Any size without a named variant, by its service name.
    Other(String),
}

impl VmSize {
    /// Service name, such as `Standard_D1_v2`.
    pub fn as_str(&self) -> &str {
        match self {
            VmSize::BasicA0 => "Basic_A0",
            VmSize::BasicA1 => "Basic_A1",
            VmSize::BasicA2 => "Basic_A2",
            VmSize::StandardA1 => "Standard_A1",
            VmSize::StandardA2 => "Standard_A2",
            VmSize::StandardB1s => "Standard_B1s",
            VmSize::StandardB2s => "Standard_B2s",
            VmSize::StandardD1V2 => "Standard_D1_v2",
            VmSize::StandardD2V2 => "Standard_D2_v2",
            VmSize::StandardDs1V2 => "Standard_DS1_v2",
            VmSize::Other(name) => name,
        }
    }
}

impl From<String> for VmSize {
    fn from(name: String) -> Self {
        const KNOWN: [VmSize; 10] = [
            VmSize::BasicA0,
            VmSize::BasicA1,
            VmSize::BasicA2,
            VmSize::StandardA1,
            VmSize::StandardA2,
            VmSize::StandardB1s,
            VmSize::StandardB2s,
            VmSize::StandardD1V2,
            VmSize::StandardD2V2,
            VmSize::StandardDs1V2,
        ];

        KNOWN
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(&name))
            .unwrap_or(VmSize::Other(name))
    }
}

impl From<&str> for VmSize {
    fn from(name: &str) -> Self {
        VmSize::from(name.to_string())
    }
}

impl From<VmSize> for String {
    fn from(size: VmSize) -> Self {
        size.as_str().to_string()
    }
}

impl fmt::Display for VmSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marketplace image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Publisher, such as `Canonical`.
    pub publisher: String,
    /// Offer, such as `UbuntuServer`.
    pub offer: String,
    /// SKU, such as `16.04-LTS`.
    pub sku: String,
    /// Image version or `latest`.
    pub version: String,
}

impl ImageReference {
    /// A specific image version.
    pub fn new(
        publisher: impl Into<String>,
        offer: impl Into<String>,
        sku: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            offer: offer.into(),
            sku: sku.into(),
            version: version.into(),
        }
    }

    /// The newest published version of an image.
    pub fn latest(
        publisher: impl Into<String>,
        offer: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        Self::new(publisher, offer, sku, "latest")
    }
}

/// How a data disk comes into being.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiskCreateOption {
    /// A new, empty disk.
    #[default]
    Empty,
    /// An existing VHD blob.
    Attach,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Vhd {
    uri: String,
}

/// A data disk attached to a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    lun: u32,
    create_option: DiskCreateOption,
    #[serde(rename = "diskSizeGB", default, skip_serializing_if = "Option::is_none")]
    disk_size_gb: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vhd: Option<Vhd>,
}

impl DataDisk {
    /// Logical unit number, unique per machine.
    pub fn lun(&self) -> u32 {
        self.lun
    }

    /// Whether the disk was created empty or attached.
    pub fn create_option(&self) -> DiskCreateOption {
        self.create_option
    }

    /// Size of a new disk.
    pub fn size_gb(&self) -> Option<u32> {
        self.disk_size_gb
    }

    /// Blob URI of an attached disk.
    pub fn vhd_uri(&self) -> Option<&str> {
        self.vhd.as_ref().map(|vhd| vhd.uri.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HardwareProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    vm_size: Option<VmSize>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OsProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    computer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_password: Option<String>,
}

impl fmt::Debug for OsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsProfile")
            .field("computer_name", &self.computer_name)
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StorageProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_reference: Option<ImageReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data_disks: Vec<DataDisk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NetworkProfile {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    network_interfaces: Vec<SubResource>,
}

/// Virtual machine properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualMachineModel {
    hardware_profile: HardwareProfile,
    os_profile: OsProfile,
    storage_profile: StorageProfile,
    network_profile: NetworkProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability_set: Option<SubResource>,
    #[serde(skip_serializing)]
    power_state: Option<String>,
}

impl ResourceModel for VirtualMachineModel {
    const KIND: ResourceKind = ResourceKind::VirtualMachine;

    fn blank(name: &str) -> Self {
        Self {
            os_profile: OsProfile {
                computer_name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(user) = &self.os_profile.admin_username
            && user.trim().is_empty()
        {
            return Err(ShortcutsError::validation("admin user name must not be empty"));
        }

        for disk in &self.storage_profile.data_disks {
            if let Some(size) = disk.disk_size_gb
                && !(1..=MAX_DATA_DISK_GB).contains(&size)
            {
                return Err(ShortcutsError::validation(format!(
                    "data disk size must be between 1 and {MAX_DATA_DISK_GB} GB, got {size}"
                )));
            }
        }

        Ok(())
    }

    fn validate_definition(&self) -> Result<()> {
        let missing = [
            (self.hardware_profile.vm_size.is_none(), "size"),
            (self.os_profile.admin_username.is_none(), "admin user name"),
            (self.storage_profile.image_reference.is_none(), "image"),
        ];

        match missing.iter().find(|(is_missing, _)| *is_missing) {
            Some((_, what)) => Err(ShortcutsError::validation(format!(
                "a virtual machine needs a {what} before it can be provisioned"
            ))),
            None => Ok(()),
        }
    }
}

impl VirtualMachineModel {
    /// Append a disk on the next free LUN.
    fn add_data_disk(&mut self, create_option: DiskCreateOption, size_gb: Option<u32>, vhd: Option<Vhd>) {
        let disks = &mut self.storage_profile.data_disks;
        let lun = disks.iter().map(|disk| disk.lun + 1).max().unwrap_or(0);
        disks.push(DataDisk {
            lun,
            create_option,
            disk_size_gb: size_gb,
            vhd,
        });
    }
}

impl GroupScopedModel for VirtualMachineModel {}

/// A virtual machine.
pub type VirtualMachine = Resource<VirtualMachineModel>;

/// Virtual machines of a subscription, keyed by resource id.
pub type VirtualMachines = Collection<VirtualMachineModel>;

impl Resource<VirtualMachineModel> {
    /// Machine size.
    pub fn size(&self) -> Option<&VmSize> {
        self.inner.properties.hardware_profile.vm_size.as_ref()
    }

    /// Admin user name.
    pub fn admin_username(&self) -> Option<&str> {
        self.inner.properties.os_profile.admin_username.as_deref()
    }

    /// Host name inside the guest. Defaults to the resource name.
    pub fn computer_name(&self) -> Option<&str> {
        self.inner.properties.os_profile.computer_name.as_deref()
    }

    /// Marketplace image the machine was built from.
    pub fn image(&self) -> Option<&ImageReference> {
        self.inner.properties.storage_profile.image_reference.as_ref()
    }

    /// Data disks ordered as stored.
    pub fn data_disks(&self) -> &[DataDisk] {
        &self.inner.properties.storage_profile.data_disks
    }

    /// Id of the availability set the machine belongs to.
    pub fn availability_set(&self) -> Option<&str> {
        self.inner
            .properties
            .availability_set
            .as_ref()
            .map(|set| set.id.as_str())
    }

    /// Ids of the attached network interfaces.
    pub fn network_interface_ids(&self) -> Vec<&str> {
        self.inner
            .properties
            .network_profile
            .network_interfaces
            .iter()
            .map(|nic| nic.id.as_str())
            .collect()
    }

    /// Power state as of the last read, such as `running` or `deallocated`.
    pub fn power_state(&self) -> Option<&str> {
        self.inner.properties.power_state.as_deref()
    }

    /// Set the machine size.
    pub fn with_size(self, size: impl Into<VmSize>) -> Self {
        let size = size.into();
        self.stage(move |inner| inner.properties.hardware_profile.vm_size = Some(size.clone()))
    }

    /// Set the admin user name.
    pub fn with_admin_username(self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.stage(move |inner| inner.properties.os_profile.admin_username = Some(username.clone()))
    }

    /// Set the admin password. It is sent on the next write only.
    pub fn with_admin_password(self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.stage(move |inner| inner.properties.os_profile.admin_password = Some(password.clone()))
    }

    /// Override the host name inside the guest.
    pub fn with_computer_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.stage(move |inner| inner.properties.os_profile.computer_name = Some(name.clone()))
    }

    /// Build the machine from a marketplace image.
    pub fn with_image(self, image: ImageReference) -> Self {
        self.stage(move |inner| {
            inner.properties.storage_profile.image_reference = Some(image.clone())
        })
    }

    /// Use the newest version of a marketplace image.
    pub fn with_latest_image(
        self,
        publisher: impl Into<String>,
        offer: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        self.with_image(ImageReference::latest(publisher, offer, sku))
    }

    /// Add an empty data disk on the next free LUN.
    pub fn with_new_data_disk(self, size_gb: u32) -> Self {
        self.stage(move |inner| {
            inner.properties.add_data_disk(DiskCreateOption::Empty, Some(size_gb), None)
        })
    }

    /// Attach an existing VHD blob on the next free LUN.
    pub fn with_existing_data_disk(self, vhd_uri: impl Into<String>) -> Self {
        let vhd = Vhd { uri: vhd_uri.into() };
        self.stage(move |inner| {
            inner
                .properties
                .add_data_disk(DiskCreateOption::Attach, None, Some(vhd.clone()))
        })
    }

    /// Place the machine in an availability set, by id.
    pub fn with_availability_set(self, id: impl Into<String>) -> Self {
        let set = SubResource::new(id);
        self.stage(move |inner| inner.properties.availability_set = Some(set.clone()))
    }

    /// Attach a network interface, by id.
    pub fn with_network_interface(self, id: impl Into<String>) -> Self {
        let nic = SubResource::new(id);
        self.stage(move |inner| {
            inner
                .properties
                .network_profile
                .network_interfaces
                .push(nic.clone())
        })
    }

    /// Start a stopped or deallocated machine.
    pub async fn start(&mut self) -> Result<()> {
        self.invoke("start", "start").await
    }

    /// Restart a running machine.
    pub async fn restart(&mut self) -> Result<()> {
        self.invoke("restart", "restart").await
    }

    /// Stop the machine. Compute stays allocated and billed.
    pub async fn power_off(&mut self) -> Result<()> {
        self.invoke("power off", "powerOff").await
    }

    /// Stop the machine and release its compute.
    pub async fn deallocate(&mut self) -> Result<()> {
        self.invoke("deallocate", "deallocate").await
    }

    async fn invoke(&mut self, operation: &'static str, action: &str) -> Result<()> {
        self.require_state(operation, Lifecycle::Bound)?;

        self.subscription()
            .client()
            .invoke_action(
                ResourceKind::VirtualMachine,
                self.group_name(),
                &self.inner.name,
                action,
            )
            .await?;

        info!(name = %self.inner.name, action = %action, "Virtual machine action accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Subscription;
    use shortcuts_core::{MemoryManagementClient, NativeRecord, Operation, ShortcutsConfig};
    use std::sync::Arc;

    fn session() -> (MemoryManagementClient, Subscription) {
        let client = MemoryManagementClient::new();
        client.insert(
            ResourceKind::ResourceGroup,
            None,
            NativeRecord::named("rg1").with_location("westus"),
        );
        let subscription = Subscription::new(Arc::new(client.clone()), ShortcutsConfig::default());
        (client, subscription)
    }

    fn complete(subscription: &Subscription, name: &str) -> VirtualMachine {
        subscription
            .virtual_machines()
            .define(name)
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_size(VmSize::BasicA1)
            .with_admin_username("shortcuts")
            .with_admin_password("Abcd.1234")
            .with_latest_image("Canonical", "UbuntuServer", "14.04.3-LTS")
    }

    #[test]
    fn test_vm_size_names() {
        assert_eq!(VmSize::from("standard_d1_v2"), VmSize::StandardD1V2);
        assert_eq!(VmSize::from("Standard_F2"), VmSize::Other("Standard_F2".into()));
        assert_eq!(serde_json::to_value(VmSize::BasicA1).unwrap(), "Basic_A1");
    }

    #[tokio::test]
    async fn test_password_hidden_from_debug() {
        let (_client, subscription) = session();
        let vm = complete(&subscription, "vm1");

        let debug = format!("{vm:?}");
        assert!(!debug.contains("Abcd.1234"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_definition_requires_size_user_and_image() {
        let (client, subscription) = session();
        let vms = subscription.virtual_machines();

        let no_size = vms
            .define("vm1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_admin_username("shortcuts")
            .with_latest_image("Canonical", "UbuntuServer", "14.04.3-LTS");
        let err = no_size.provision().await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("size"));

        let no_image = vms
            .define("vm1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_size("Standard_B1s")
            .with_admin_username("shortcuts");
        assert!(no_image.provision().await.unwrap_err().is_validation());

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provision_and_read_back() {
        let (client, subscription) = session();

        let vm = complete(&subscription, "vm1")
            .with_new_data_disk(100)
            .with_existing_data_disk("https://store.blob.core.windows.net/vhds/disk1.vhd")
            .provision()
            .await
            .unwrap();

        assert_eq!(vm.size(), Some(&VmSize::BasicA1));
        assert_eq!(vm.computer_name(), Some("vm1"));
        assert_eq!(vm.admin_username(), Some("shortcuts"));
        assert_eq!(vm.image().unwrap().version, "latest");
        assert_eq!(vm.power_state(), Some("running"));

        let disks = vm.data_disks();
        assert_eq!(disks.len(), 2);
        assert_eq!((disks[0].lun(), disks[0].size_gb()), (0, Some(100)));
        assert_eq!(disks[1].create_option(), DiskCreateOption::Attach);
        assert_eq!(disks[1].lun(), 1);

        let stored = client
            .peek(ResourceKind::VirtualMachine, Some("rg1"), "vm1")
            .unwrap();
        assert!(stored.properties.pointer("/osProfile/adminPassword").is_none());
    }

    #[tokio::test]
    async fn test_power_actions() {
        let (client, subscription) = session();
        let mut vm = complete(&subscription, "vm1").provision().await.unwrap();

        vm.deallocate().await.unwrap();
        assert_eq!(vm.power_state(), Some("running"));
        vm.refresh().await.unwrap();
        assert_eq!(vm.power_state(), Some("deallocated"));

        vm.start().await.unwrap();
        vm.power_off().await.unwrap();
        vm.refresh().await.unwrap();
        assert_eq!(vm.power_state(), Some("stopped"));

        vm.restart().await.unwrap();
        assert_eq!(client.call_count(Operation::Action), 4);
    }

    #[tokio::test]
    async fn test_actions_need_a_bound_machine() {
        let (client, subscription) = session();

        let mut defined = complete(&subscription, "vm1");
        let err = defined.restart().await.unwrap_err();
        assert!(matches!(
            err,
            ShortcutsError::InvalidState { operation: "restart", state: "defined" }
        ));

        let mut vm = defined.provision().await.unwrap();
        vm.delete().await.unwrap();
        assert!(vm.deallocate().await.is_err());
        assert_eq!(client.call_count(Operation::Action), 0);
    }

    #[tokio::test]
    async fn test_availability_set_membership() {
        let (_client, subscription) = session();

        let set = subscription
            .availability_sets()
            .define("as1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .provision()
            .await
            .unwrap();

        let vm = complete(&subscription, "vm1")
            .with_availability_set(set.id().unwrap())
            .provision()
            .await
            .unwrap();
        assert_eq!(vm.availability_set(), set.id());

        let mut set = set;
        set.refresh().await.unwrap();
        assert_eq!(set.virtual_machine_ids(), vec![vm.id().unwrap()]);
    }
}
