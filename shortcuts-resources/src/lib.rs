//! # Shortcuts Resources
//!
//! Fluent wrappers over Azure Resource Manager resources.
//!
//! Every resource type has a collection reached from a [`Subscription`] and a
//! wrapper that is both the draft of a change and the last known state of
//! the remote resource.
//!
//! ## Quick Start
//!
//! ```rust
//! use shortcuts_core::{MemoryManagementClient, Region};
//! use shortcuts_resources::Subscription;
//!
//! # async fn example() -> shortcuts_core::Result<()> {
//! let subscription = Subscription::with_client(MemoryManagementClient::new());
//!
//! // Nothing is sent until provision.
//! let pip = subscription
//!     .public_ip_addresses()
//!     .define("pip1")?
//!     .with_region(Region::UsWest)
//!     .with_new_resource_group()
//!     .with_static_ip()
//!     .with_leaf_domain_label("myapp")
//!     .provision()
//!     .await?;
//!
//! assert!(pip.ip_address().is_some());
//!
//! // Stage a change on the bound wrapper and send it.
//! let pip = pip.with_tag("env", "dev").apply().await?;
//! assert_eq!(pip.tags().get("env").map(String::as_str), Some("dev"));
//!
//! subscription.resource_groups().delete("pip1group").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! Wrappers returned by `define` are [`Lifecycle::Defined`] and only accept
//! `provision`. Wrappers returned by `get`, `as_map` and `provision` are
//! [`Lifecycle::Bound`] and accept `apply`, `refresh` and `delete`. A deleted
//! wrapper rejects every verb with [`shortcuts_core::ShortcutsError::InvalidState`].

mod availability_sets;
mod collection;
mod model;
mod network_security_groups;
mod providers;
mod public_ip_addresses;
mod resource;
mod resource_groups;
mod subscription;
mod virtual_machines;

pub use availability_sets::{AvailabilitySet, AvailabilitySetModel, AvailabilitySets};
pub use collection::Collection;
pub use model::{GroupScopedModel, ResourceModel, SubResource};
pub use network_security_groups::{
    Access, Direction, MAX_RULE_PRIORITY, MIN_RULE_PRIORITY, NetworkSecurityGroup,
    NetworkSecurityGroupModel, NetworkSecurityGroups, Protocol, SecurityRule, SecurityRuleSpec,
};
pub use providers::{Provider, Providers, ResourceType};
pub use public_ip_addresses::{
    IpAllocationMethod, PublicIpAddress, PublicIpAddressModel, PublicIpAddresses,
};
pub use resource::{Lifecycle, Resource};
pub use resource_groups::{ResourceGroup, ResourceGroupModel, ResourceGroups};
pub use subscription::Subscription;
pub use virtual_machines::{
    DataDisk, DiskCreateOption, ImageReference, VirtualMachine, VirtualMachineModel,
    VirtualMachines, VmSize,
};
