//! Network security groups and their rules.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use shortcuts_core::{ResourceKind, Result, ShortcutsError};

use crate::collection::Collection;
use crate::model::{GroupScopedModel, ResourceModel};
use crate::resource::Resource;

/// Lowest priority value a rule may use. Lower values are evaluated first.
pub const MIN_RULE_PRIORITY: u32 = 100;
/// Highest priority value a rule may use.
pub const MAX_RULE_PRIORITY: u32 = 4096;

const ANY: &str = "*";

/// Traffic protocol matched by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Protocol {
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
    /// Any protocol, `*` on the wire.
    #[default]
    #[serde(rename = "*")]
    Any,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("Tcp"),
            Protocol::Udp => f.write_str("Udp"),
            Protocol::Any => f.write_str(ANY),
        }
    }
}

/// Direction of traffic a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Traffic entering the group.
    #[default]
    Inbound,
    /// Traffic leaving the group.
    Outbound,
}

/// Whether matching traffic is let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Access {
    /// Let matching traffic through.
    #[default]
    Allow,
    /// Drop matching traffic.
    Deny,
}

/// A security rule as stored on the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityRule {
    /// Rule name, unique within the group ignoring case.
    pub name: String,
    /// Evaluation order, lowest first.
    pub priority: u32,
    /// Traffic direction.
    pub direction: Direction,
    /// Allow or deny.
    pub access: Access,
    /// Matched protocol.
    pub protocol: Protocol,
    /// Source address prefix or `*`.
    pub source_address_prefix: String,
    /// Source port, range or `*`.
    pub source_port_range: String,
    /// Destination address prefix or `*`.
    pub destination_address_prefix: String,
    /// Destination port, range or `*`.
    pub destination_port_range: String,
}

/// Description of a rule to add.
///
/// Everything except the name and priority matches any traffic until
/// narrowed.
///
/// ```rust
/// use shortcuts_resources::{Protocol, SecurityRuleSpec};
///
/// let ssh = SecurityRuleSpec::new("ssh", 100)
///     .with_protocol(Protocol::Tcp)
///     .with_destination_port(22);
/// assert_eq!(ssh.destination_port_range, "22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRuleSpec {
    /// Rule name.
    pub name: String,
    /// Evaluation order, between [`MIN_RULE_PRIORITY`] and [`MAX_RULE_PRIORITY`].
    pub priority: u32,
    /// Matched protocol.
    pub protocol: Protocol,
    /// Source address prefix.
    pub source_address_prefix: String,
    /// Source port or range.
    pub source_port_range: String,
    /// Destination address prefix.
    pub destination_address_prefix: String,
    /// Destination port or range.
    pub destination_port_range: String,
}

impl SecurityRuleSpec {
    /// A rule matching any traffic.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            protocol: Protocol::Any,
            source_address_prefix: ANY.to_string(),
            source_port_range: ANY.to_string(),
            destination_address_prefix: ANY.to_string(),
            destination_port_range: ANY.to_string(),
        }
    }

    /// Match one protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Match traffic from an address prefix such as `10.0.0.0/24`.
    pub fn with_source_address(mut self, prefix: impl Into<String>) -> Self {
        self.source_address_prefix = prefix.into();
        self
    }

    /// Match one source port.
    pub fn with_source_port(mut self, port: u16) -> Self {
        self.source_port_range = port.to_string();
        self
    }

    /// Match traffic to an address prefix.
    pub fn with_destination_address(mut self, prefix: impl Into<String>) -> Self {
        self.destination_address_prefix = prefix.into();
        self
    }

    /// Match one destination port.
    pub fn with_destination_port(mut self, port: u16) -> Self {
        self.destination_port_range = port.to_string();
        self
    }

    /// Match an inclusive destination port range.
    pub fn with_destination_port_range(mut self, from: u16, to: u16) -> Self {
        self.destination_port_range = format!("{from}-{to}");
        self
    }

    fn into_rule(self, direction: Direction, access: Access) -> SecurityRule {
        SecurityRule {
            name: self.name,
            priority: self.priority,
            direction,
            access,
            protocol: self.protocol,
            source_address_prefix: self.source_address_prefix,
            source_port_range: self.source_port_range,
            destination_address_prefix: self.destination_address_prefix,
            destination_port_range: self.destination_port_range,
        }
    }
}

/// Network security group properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkSecurityGroupModel {
    security_rules: Vec<SecurityRule>,
}

impl ResourceModel for NetworkSecurityGroupModel {
    const KIND: ResourceKind = ResourceKind::NetworkSecurityGroup;

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();

        for rule in &self.security_rules {
            if rule.name.trim().is_empty() {
                return Err(ShortcutsError::validation("security rule name must not be empty"));
            }
            if !(MIN_RULE_PRIORITY..=MAX_RULE_PRIORITY).contains(&rule.priority) {
                return Err(ShortcutsError::validation(format!(
                    "security rule '{}' has priority {}, expected {MIN_RULE_PRIORITY}..={MAX_RULE_PRIORITY}",
                    rule.name, rule.priority
                )));
            }
            if !names.insert(rule.name.to_ascii_lowercase()) {
                return Err(ShortcutsError::validation(format!(
                    "security rule name '{}' is used more than once",
                    rule.name
                )));
            }
        }

        Ok(())
    }
}

impl GroupScopedModel for NetworkSecurityGroupModel {}

/// A network security group.
pub type NetworkSecurityGroup = Resource<NetworkSecurityGroupModel>;

/// Network security groups of a subscription, keyed by resource id.
pub type NetworkSecurityGroups = Collection<NetworkSecurityGroupModel>;

impl Resource<NetworkSecurityGroupModel> {
    /// Rules in the order they were added or returned.
    pub fn security_rules(&self) -> &[SecurityRule] {
        &self.inner.properties.security_rules
    }

    /// Look up a rule by name.
    pub fn security_rule(&self, name: &str) -> Option<&SecurityRule> {
        self.security_rules()
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Add a rule allowing inbound traffic.
    pub fn with_allow_inbound(self, spec: SecurityRuleSpec) -> Self {
        self.with_rule(spec.into_rule(Direction::Inbound, Access::Allow))
    }

    /// Add a rule allowing outbound traffic.
    pub fn with_allow_outbound(self, spec: SecurityRuleSpec) -> Self {
        self.with_rule(spec.into_rule(Direction::Outbound, Access::Allow))
    }

    /// Add a rule denying inbound traffic.
    pub fn with_deny_inbound(self, spec: SecurityRuleSpec) -> Self {
        self.with_rule(spec.into_rule(Direction::Inbound, Access::Deny))
    }

    /// Add a rule denying outbound traffic.
    pub fn with_deny_outbound(self, spec: SecurityRuleSpec) -> Self {
        self.with_rule(spec.into_rule(Direction::Outbound, Access::Deny))
    }

    /// Drop a rule by name. Unknown names are ignored.
    pub fn without_security_rule(self, name: &str) -> Self {
        debug!(rule = %name, "Removing security rule");
        let name = name.to_string();
        self.stage(move |inner| {
            inner
                .properties
                .security_rules
                .retain(|r| !r.name.eq_ignore_ascii_case(&name));
        })
    }

    fn with_rule(self, rule: SecurityRule) -> Self {
        debug!(
            rule = %rule.name,
            priority = rule.priority,
            direction = ?rule.direction,
            access = ?rule.access,
            "Staged security rule"
        );
        self.stage(move |inner| inner.properties.security_rules.push(rule.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Subscription;
    use shortcuts_core::{MemoryManagementClient, NativeRecord, ShortcutsConfig};
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

    #[test]
    fn test_protocol_wire_names() {
        assert_eq!(serde_json::to_value(Protocol::Any).unwrap(), "*");
        assert_eq!(serde_json::to_value(Protocol::Tcp).unwrap(), "Tcp");
        assert_eq!(Protocol::Any.to_string(), "*");
    }

    #[tokio::test]
    async fn test_rules_survive_round_trip() {
        let (_client, subscription) = session();

        let nsg = subscription
            .network_security_groups()
            .define("nsg1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_allow_inbound(SecurityRuleSpec::new("ssh", 100).with_protocol(Protocol::Tcp).with_destination_port(22))
            .with_deny_outbound(SecurityRuleSpec::new("no-smtp", 200).with_destination_port(25))
            .provision()
            .await
            .unwrap();

        assert_eq!(nsg.security_rules().len(), 2);
        let ssh = nsg.security_rule("SSH").unwrap();
        assert_eq!(ssh.direction, Direction::Inbound);
        assert_eq!(ssh.access, Access::Allow);
        assert_eq!(ssh.destination_port_range, "22");
        assert_eq!(nsg.security_rule("no-smtp").unwrap().access, Access::Deny);
    }

    #[tokio::test]
    async fn test_priority_out_of_range() {
        let (client, subscription) = session();

        for priority in [99, 4097] {
            let err = subscription
                .network_security_groups()
                .define("nsg1")
                .unwrap()
                .with_region("westus")
                .with_existing_resource_group("rg1")
                .with_allow_inbound(SecurityRuleSpec::new("web", priority))
                .provision()
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rule_names() {
        let (_client, subscription) = session();

        let err = subscription
            .network_security_groups()
            .define("nsg1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_allow_inbound(SecurityRuleSpec::new("web", 100).with_destination_port(80))
            .with_allow_inbound(SecurityRuleSpec::new("Web", 110).with_destination_port(443))
            .provision()
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_remove_rule_and_apply() {
        let (_client, subscription) = session();
        let nsgs = subscription.network_security_groups();

        nsgs.define("nsg1")
            .unwrap()
            .with_region("westus")
            .with_existing_resource_group("rg1")
            .with_allow_inbound(SecurityRuleSpec::new("web", 100).with_destination_port_range(80, 81))
            .provision()
            .await
            .unwrap();

        let nsg = nsgs
            .get_in("rg1", "nsg1")
            .await
            .unwrap()
            .without_security_rule("web")
            .apply()
            .await
            .unwrap();
        assert!(nsg.security_rules().is_empty());
    }
}
