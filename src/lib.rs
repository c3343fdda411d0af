// Azure Shortcuts - a fluent facade over Azure Resource Manager
//
// This library wraps management operations in builder-style resource
// wrappers: define a resource, stage settings, provision it, then keep
// working with the bound wrapper.

// Re-export core functionality
pub use shortcuts_core::*;

// Re-export resource wrappers
pub use shortcuts_resources::*;

pub use shortcuts_core;
pub use shortcuts_resources;

// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        // Session and configuration
        ManagementClient,
        MemoryManagementClient,
        Region,
        Result,
        ShortcutsConfig,
        ShortcutsError,
        Subscription,
        // Wrappers
        AvailabilitySet,
        Lifecycle,
        NetworkSecurityGroup,
        Provider,
        PublicIpAddress,
        ResourceGroup,
        VirtualMachine,
        // Settings
        ImageReference,
        IpAllocationMethod,
        Protocol,
        SecurityRuleSpec,
        VmSize,
    };
}
