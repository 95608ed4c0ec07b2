//! Holder registry: which processes hold which verified capabilities.
//!
//! Populated by `verify_caps`. Revocation notices use it to name the
//! processes that must drop access.

use authz_proto::{Capability, ContainerId, OperationMask, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A calling process, as identified by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId {
    pub node: u32,
    pub pid: u32,
}

impl ProcessId {
    pub const fn new(node: u32, pid: u32) -> Self {
        Self { node, pid }
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.pid)
    }
}

/// Registry entry for one capability.
#[derive(Debug, Clone)]
pub struct Registration {
    pub container_id: ContainerId,
    pub operation_mask: OperationMask,
    pub user_id: UserId,
    pub holders: BTreeSet<ProcessId>,
    /// First registration time.
    pub registered_at: DateTime<Utc>,
}

/// Capability fingerprint -> registration.
#[derive(Default)]
pub struct HolderRegistry {
    entries: DashMap<String, Registration>,
}

impl HolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `holder` as holding `cap`. Registering twice is a no-op.
    pub fn register(&self, cap: &Capability, holder: ProcessId) {
        self.entries
            .entry(cap.fingerprint())
            .or_insert_with(|| Registration {
                container_id: cap.data.container_id,
                operation_mask: cap.data.operation_mask,
                user_id: cap.data.credential.user_id,
                holders: BTreeSet::new(),
                registered_at: Utc::now(),
            })
            .holders
            .insert(holder);
        crate::metrics::set_registered_capabilities(self.entries.len());
    }

    /// Processes registered against `cap`.
    pub fn holders_of(&self, cap: &Capability) -> BTreeSet<ProcessId> {
        self.entries
            .get(&cap.fingerprint())
            .map(|r| r.holders.clone())
            .unwrap_or_default()
    }

    /// Processes holding a capability on `container` that grants any bit of `mask`.
    pub fn holders_for(&self, container: ContainerId, mask: OperationMask) -> BTreeSet<ProcessId> {
        self.collect(|r| r.container_id == container && r.operation_mask.intersects(mask))
    }

    /// Holders of `users`' capabilities on `container` that grant any bit
    /// of `revoked`.
    ///
    /// Capabilities whose rights other than `CREATE` all fall within
    /// `revoked` are forgotten; a holder regaining access must verify again.
    /// Capabilities still carrying other rights stay registered.
    pub fn revoke_users(
        &self,
        container: ContainerId,
        revoked: OperationMask,
        users: &[UserId],
    ) -> BTreeSet<ProcessId> {
        let mut affected = BTreeSet::new();
        self.entries.retain(|_, r| {
            let hit = r.container_id == container
                && r.operation_mask.intersects(revoked)
                && users.contains(&r.user_id);
            if !hit {
                return true;
            }
            affected.extend(r.holders.iter().copied());
            !r.operation_mask
                .difference(OperationMask::CREATE)
                .difference(revoked)
                .is_empty()
        });
        crate::metrics::set_registered_capabilities(self.entries.len());
        affected
    }

    /// Forget every capability on `container`, returning their holders.
    pub fn drop_container(&self, container: ContainerId) -> BTreeSet<ProcessId> {
        let mut dropped = BTreeSet::new();
        self.entries.retain(|_, r| {
            if r.container_id == container {
                dropped.extend(r.holders.iter().copied());
                false
            } else {
                true
            }
        });
        crate::metrics::set_registered_capabilities(self.entries.len());
        dropped
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn collect(&self, keep: impl Fn(&Registration) -> bool) -> BTreeSet<ProcessId> {
        let mut holders = BTreeSet::new();
        for entry in self.entries.iter() {
            if keep(entry.value()) {
                holders.extend(entry.value().holders.iter().copied());
            }
        }
        holders
    }
}
