//! # Shortcuts Core
//!
//! Core building blocks for the Azure Shortcuts fluent facade.
//!
//! ## Contents
//!
//! - [`ManagementClient`]: the seam every remote call goes through. The
//!   facade is handed an already authenticated implementation.
//! - [`NativeRecord`]: the record shape exchanged with the client.
//! - [`ShortcutsError`]: the error taxonomy shared by every crate.
//! - [`ShortcutsConfig`]: session configuration, with a builder and
//!   environment loading.
//! - Resource id helpers, [`Region`], and [`latest_version`].
//! - [`MemoryManagementClient`]: an in-memory client for tests and local
//!   development.
//!
//! ## Quick Start
//!
//! ```rust
//! use shortcuts_core::{ManagementClient, MemoryManagementClient, NativeRecord, ResourceKind};
//!
//! # async fn example() -> shortcuts_core::Result<()> {
//! let client = MemoryManagementClient::new();
//!
//! client
//!     .create_or_update_native(
//!         ResourceKind::ResourceGroup,
//!         None,
//!         "rg1",
//!         NativeRecord::named("rg1").with_location("westus"),
//!     )
//!     .await?;
//!
//! let groups = client.list_native(ResourceKind::ResourceGroup, None).await?;
//! assert_eq!(groups.len(), 1);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod id;
mod memory;
mod region;
mod version;

pub use client::{ManagementClient, NativeRecord, ResourceKind};
pub use config::{
    DEFAULT_NEW_GROUP_SUFFIX, DEFAULT_RESOURCE_MANAGER_ENDPOINT, ShortcutsConfig,
    ShortcutsConfigBuilder,
};
pub use error::{ErrorKind, Result, ShortcutsError};
pub use id::{ResourceId, group_from_resource_id, name_from_resource_id};
pub use memory::{
    CreateResponse, DEFAULT_MEMORY_SUBSCRIPTION, MemoryManagementClient, Operation, RecordedCall,
};
pub use region::Region;
pub use version::latest_version;
