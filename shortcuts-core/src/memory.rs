//! In-memory management client.
//!
//! Behaves like a small, single-subscription Resource Manager: it assigns
//! ids and provisioning states, enforces that group scoped resources live
//! in an existing group, rejects location changes, and cascades group
//! deletion. Faults, partial responses and delayed delete visibility can
//! be injected to exercise error paths.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::{ManagementClient, NativeRecord, ResourceId, ResourceKind, Result, ShortcutsError};

/// Subscription id used when none is given.
pub const DEFAULT_MEMORY_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

const SUCCEEDED: &str = "Succeeded";

/// Client operations, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_native`
    List,
    /// `get_native`
    Get,
    /// `create_or_update_native`
    CreateOrUpdate,
    /// `delete_native`
    Delete,
    /// `invoke_action`
    Action,
}

/// What `create_or_update_native` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateResponse {
    /// The stored record.
    #[default]
    Full,
    /// Only the name and id of the stored record.
    Partial,
    /// Nothing.
    Empty,
}

/// A call made against the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation invoked.
    pub operation: Operation,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource group argument.
    pub group: Option<String>,
    /// Resource name argument, empty for listings.
    pub name: String,
}

struct Fault {
    kind: Option<ResourceKind>,
    operation: Operation,
    error: ShortcutsError,
}

struct Ghost {
    kind: ResourceKind,
    group: Option<String>,
    record: NativeRecord,
    remaining_lists: usize,
}

type RecordKey = (ResourceKind, String, String);

#[derive(Default)]
struct State {
    records: BTreeMap<RecordKey, NativeRecord>,
    ghosts: Vec<Ghost>,
    faults: Vec<Fault>,
    calls: Vec<RecordedCall>,
    next_ip: u32,
}

/// Thread-safe in-memory [`ManagementClient`].
#[derive(Clone)]
pub struct MemoryManagementClient {
    subscription_id: String,
    delete_visibility_lag: usize,
    create_response: CreateResponse,
    state: Arc<Mutex<State>>,
}

impl Default for MemoryManagementClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryManagementClient {
    /// Create an empty client for the default subscription.
    pub fn new() -> Self {
        Self::with_subscription(DEFAULT_MEMORY_SUBSCRIPTION)
    }

    /// Create an empty client for a subscription.
    pub fn with_subscription(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            delete_visibility_lag: 0,
            create_response: CreateResponse::Full,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Keep deleted resources visible in the next `lists` listings.
    ///
    /// Reads of a deleted resource fail immediately; only listings lag.
    pub fn with_delete_visibility_lag(mut self, lists: usize) -> Self {
        self.delete_visibility_lag = lists;
        self
    }

    /// Choose what create calls return.
    pub fn with_create_response(mut self, response: CreateResponse) -> Self {
        self.create_response = response;
        self
    }

    /// The subscription this client stands in for.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Fail the next matching call with `error`.
    ///
    /// With `kind` set, only calls for that resource kind match.
    pub fn fail_next(&self, kind: Option<ResourceKind>, operation: Operation, error: ShortcutsError) {
        self.state.lock().faults.push(Fault {
            kind,
            operation,
            error,
        });
    }

    /// Store a record directly, bypassing validation. Simulates a change
    /// made by another caller.
    pub fn insert(&self, kind: ResourceKind, group: Option<&str>, mut record: NativeRecord) {
        if record.id.is_none() {
            record.id = Some(self.resource_id(kind, group, &record.name));
        }
        if record.provisioning_state.is_none() {
            record.provisioning_state = Some(SUCCEEDED.to_string());
        }
        let key = key(kind, group, &record.name);
        self.state.lock().records.insert(key, record);
    }

    /// Remove a record directly. Simulates an out-of-band deletion.
    pub fn remove(&self, kind: ResourceKind, group: Option<&str>, name: &str) -> Option<NativeRecord> {
        self.state.lock().records.remove(&key(kind, group, name))
    }

    /// Read a stored record without recording a call.
    pub fn peek(&self, kind: ResourceKind, group: Option<&str>, name: &str) -> Option<NativeRecord> {
        self.state.lock().records.get(&key(kind, group, name)).cloned()
    }

    /// Register a resource provider with its resource types.
    ///
    /// Each entry is `(resource type, api versions)`.
    pub fn register_provider(&self, namespace: &str, resource_types: &[(&str, &[&str])]) {
        let types: Vec<Value> = resource_types
            .iter()
            .map(|(name, versions)| {
                json!({
                    "resourceType": name,
                    "apiVersions": versions,
                    "locations": [],
                })
            })
            .collect();

        let record = NativeRecord {
            id: Some(format!("/subscriptions/{}/providers/{namespace}", self.subscription_id)),
            name: namespace.to_string(),
            properties: json!({
                "namespace": namespace,
                "registrationState": "Registered",
                "resourceTypes": types,
            }),
            ..Default::default()
        };
        self.insert(ResourceKind::Provider, None, record);
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls of one operation.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn resource_id(&self, kind: ResourceKind, group: Option<&str>, name: &str) -> String {
        match (kind, group) {
            (ResourceKind::ResourceGroup, _) => ResourceId::arm_group(&self.subscription_id, name),
            (ResourceKind::Provider, _) => {
                format!("/subscriptions/{}/providers/{name}", self.subscription_id)
            }
            (_, Some(group)) => ResourceId::arm(&self.subscription_id, group, kind.resource_type(), name),
            (_, None) => format!("/subscriptions/{}/providers/{}/{name}", self.subscription_id, kind.resource_type()),
        }
    }

    /// Record the call and pop a matching fault, if any.
    fn enter(
        &self,
        state: &mut State,
        operation: Operation,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
    ) -> Result<()> {
        state.calls.push(RecordedCall {
            operation,
            kind,
            group: group.map(str::to_string),
            name: name.to_string(),
        });

        let position = state
            .faults
            .iter()
            .position(|f| f.operation == operation && f.kind.is_none_or(|k| k == kind));

        match position {
            Some(index) => Err(state.faults.remove(index).error),
            None => Ok(()),
        }
    }

    fn fill_computed(&self, state: &mut State, kind: ResourceKind, record: &mut NativeRecord) {
        let location = record.location.clone().unwrap_or_default();
        let Some(properties) = record.properties.as_object_mut() else {
            return;
        };

        match kind {
            ResourceKind::PublicIpAddress => {
                let is_static = properties
                    .get("publicIPAllocationMethod")
                    .and_then(Value::as_str)
                    == Some("Static");
                if is_static && properties.get("ipAddress").is_none_or(Value::is_null) {
                    state.next_ip += 1;
                    let n = state.next_ip;
                    properties.insert(
                        "ipAddress".to_string(),
                        json!(format!("40.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff)),
                    );
                }

                if let Some(dns) = properties.get_mut("dnsSettings").and_then(Value::as_object_mut) {
                    let label = dns
                        .get("domainNameLabel")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    match label {
                        Some(label) => {
                            let fqdn = format!("{label}.{location}.cloudapp.azure.com");
                            dns.insert("fqdn".to_string(), json!(fqdn));
                        }
                        None => {
                            dns.remove("fqdn");
                        }
                    }
                }
            }
            ResourceKind::VirtualMachine => {
                // The service never echoes secrets back.
                if let Some(os) = properties.get_mut("osProfile").and_then(Value::as_object_mut) {
                    os.remove("adminPassword");
                }
                if properties.get("powerState").is_none_or(Value::is_null) {
                    properties.insert("powerState".to_string(), json!("running"));
                }
            }
            _ => {}
        }
    }

    fn link_availability_set(&self, state: &mut State, vm_id: &str, record: &NativeRecord, attach: bool) {
        let Some(set_id) = record
            .properties
            .pointer("/availabilitySet/id")
            .and_then(Value::as_str)
        else {
            return;
        };
        let Ok(parsed) = ResourceId::parse(set_id) else {
            return;
        };

        let set_key = key(ResourceKind::AvailabilitySet, Some(&parsed.group), &parsed.name);
        let Some(set) = state.records.get_mut(&set_key) else {
            return;
        };

        if !set.properties.is_object() {
            set.properties = json!({});
        }
        let Some(properties) = set.properties.as_object_mut() else {
            return;
        };
        let members = properties
            .entry("virtualMachines")
            .or_insert_with(|| json!([]));
        if let Some(members) = members.as_array_mut() {
            members.retain(|m| m.get("id").and_then(Value::as_str) != Some(vm_id));
            if attach {
                members.push(json!({ "id": vm_id }));
            }
        }
    }
}

fn key(kind: ResourceKind, group: Option<&str>, name: &str) -> RecordKey {
    let group = if kind.is_group_scoped() {
        group.unwrap_or_default().to_string()
    } else {
        String::new()
    };
    (kind, group, name.to_string())
}

#[async_trait]
impl ManagementClient for MemoryManagementClient {
    async fn list_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
    ) -> Result<Vec<NativeRecord>> {
        let mut state = self.state.lock();
        self.enter(&mut state, Operation::List, kind, group, "")?;

        let matches_group = |record_group: &str| match group {
            Some(g) if kind.is_group_scoped() => record_group == g,
            _ => true,
        };

        let mut records: Vec<NativeRecord> = state
            .records
            .iter()
            .filter(|((k, g, _), _)| *k == kind && matches_group(g.as_str()))
            .map(|(_, record)| record.clone())
            .collect();

        for ghost in state.ghosts.iter_mut() {
            if ghost.kind == kind && matches_group(ghost.group.as_deref().unwrap_or_default()) {
                records.push(ghost.record.clone());
                ghost.remaining_lists = ghost.remaining_lists.saturating_sub(1);
            }
        }
        state.ghosts.retain(|g| g.remaining_lists > 0);

        debug!(kind = %kind, group = ?group, count = records.len(), "Listed resources");
        Ok(records)
    }

    async fn get_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
    ) -> Result<NativeRecord> {
        let mut state = self.state.lock();
        self.enter(&mut state, Operation::Get, kind, group, name)?;

        state
            .records
            .get(&key(kind, group, name))
            .cloned()
            .ok_or_else(|| ShortcutsError::not_found(format!("{kind} '{name}'")))
    }

    async fn create_or_update_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
        mut record: NativeRecord,
    ) -> Result<Option<NativeRecord>> {
        let mut state = self.state.lock();
        self.enter(&mut state, Operation::CreateOrUpdate, kind, group, name)?;

        if kind == ResourceKind::Provider {
            return Err(ShortcutsError::validation("providers cannot be written"));
        }

        if kind.is_group_scoped() {
            let group_name = group.ok_or_else(|| {
                ShortcutsError::validation(format!("a resource group is required for a {kind}"))
            })?;
            if !state
                .records
                .contains_key(&key(ResourceKind::ResourceGroup, None, group_name))
            {
                return Err(ShortcutsError::not_found(format!("resource group '{group_name}'")));
            }
        }

        let record_key = key(kind, group, name);
        let existing_location = state
            .records
            .get(&record_key)
            .map(|existing| existing.location.clone());

        match (&existing_location, &record.location) {
            (_, None) => {
                return Err(ShortcutsError::validation(format!(
                    "location is required for {kind} '{name}'"
                )));
            }
            (Some(Some(current)), Some(requested)) if !current.eq_ignore_ascii_case(requested) => {
                return Err(ShortcutsError::conflict(format!(
                    "{kind} '{name}' exists in '{current}' and cannot be moved to '{requested}'"
                )));
            }
            _ => {}
        }

        let id = self.resource_id(kind, group, name);
        record.id = Some(id.clone());
        record.name = name.to_string();
        record.provisioning_state = Some(SUCCEEDED.to_string());
        if record.properties.is_null() {
            record.properties = json!({});
        }
        // Power state is runtime state, not configuration; writes keep it.
        if kind == ResourceKind::VirtualMachine
            && let Some(previous) = state
                .records
                .get(&record_key)
                .and_then(|r| r.properties.get("powerState"))
                .cloned()
            && let Some(properties) = record.properties.as_object_mut()
        {
            properties.insert("powerState".to_string(), previous);
        }
        self.fill_computed(&mut state, kind, &mut record);

        if kind == ResourceKind::VirtualMachine {
            if let Some(previous) = state.records.get(&record_key).cloned() {
                self.link_availability_set(&mut state, &id, &previous, false);
            }
            self.link_availability_set(&mut state, &id, &record, true);
        }

        state.records.insert(record_key, record.clone());
        debug!(kind = %kind, group = ?group, name = %name, "Stored resource");

        Ok(match self.create_response {
            CreateResponse::Full => Some(record),
            CreateResponse::Partial => Some(NativeRecord {
                id: record.id,
                name: record.name,
                ..Default::default()
            }),
            CreateResponse::Empty => None,
        })
    }

    async fn delete_native(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
    ) -> Result<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, Operation::Delete, kind, group, name)?;

        if kind == ResourceKind::Provider {
            return Err(ShortcutsError::validation("providers cannot be deleted"));
        }

        let record = state
            .records
            .remove(&key(kind, group, name))
            .ok_or_else(|| ShortcutsError::not_found(format!("{kind} '{name}'")))?;

        let mut removed = vec![(kind, group.map(str::to_string), record)];

        if kind == ResourceKind::ResourceGroup {
            let contained: Vec<RecordKey> = state
                .records
                .keys()
                .filter(|(k, g, _)| k.is_group_scoped() && g == name)
                .cloned()
                .collect();
            for contained_key in contained {
                if let Some(record) = state.records.remove(&contained_key) {
                    removed.push((contained_key.0, Some(contained_key.1), record));
                }
            }
        }

        for (removed_kind, removed_group, record) in removed {
            if removed_kind == ResourceKind::VirtualMachine
                && let Some(id) = record.id.clone()
            {
                self.link_availability_set(&mut state, &id, &record, false);
            }

            if self.delete_visibility_lag > 0 {
                state.ghosts.push(Ghost {
                    kind: removed_kind,
                    group: removed_group,
                    record,
                    remaining_lists: self.delete_visibility_lag,
                });
            }
        }

        debug!(kind = %kind, group = ?group, name = %name, "Deleted resource");
        Ok(())
    }

    async fn invoke_action(
        &self,
        kind: ResourceKind,
        group: Option<&str>,
        name: &str,
        action: &str,
    ) -> Result<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, Operation::Action, kind, group, name)?;

        let power_state = match (kind, action) {
            (ResourceKind::VirtualMachine, "start" | "restart") => "running",
            (ResourceKind::VirtualMachine, "powerOff") => "stopped",
            (ResourceKind::VirtualMachine, "deallocate") => "deallocated",
            _ => {
                return Err(ShortcutsError::validation(format!(
                    "action '{action}' is not supported on a {kind}"
                )));
            }
        };

        let record = state
            .records
            .get_mut(&key(kind, group, name))
            .ok_or_else(|| ShortcutsError::not_found(format!("{kind} '{name}'")))?;

        if let Some(properties) = record.properties.as_object_mut() {
            properties.insert("powerState".to_string(), json!(power_state));
        }

        debug!(name = %name, action = %action, "Invoked virtual machine action");
        Ok(())
    }
}
