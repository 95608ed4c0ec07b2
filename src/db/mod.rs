//! ACL store: persistent container and ACL state.
//!
//! A thin façade over a [`KvStore`], keyed by `(container, operation)`:
//!
//! ```text
//! acl\0{container:020}\0-1      -> ContainerRecord (serde_json)   existence marker
//! acl\0{container:020}\0{op}    -> Acl (serde_json)               one per operation
//! meta\0next_container_id       -> u64 counter                    id allocation
//! ```
//!
//! All keys of one container share the `acl\0{container:020}\0` prefix, so
//! removing a container is a single prefix delete.
//!
//! Access goes through repository handles, mirroring the table split:
//! [`AclStore::containers`] and [`AclStore::acls`].

mod acls;
mod containers;

pub use acls::AclRepository;
pub use containers::ContainerRepository;

use crate::store::{KvStore, StoreError};
use authz_proto::{Acl, ContainerId, ContainerOp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Operation slot reserved for the container existence marker.
pub const EXISTENCE_SLOT: i32 = -1;

/// Counter used for server-side container id allocation.
pub const CONTAINER_COUNTER_KEY: &str = "meta\0next_container_id";

/// Value stored under a container's existence marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Creation time (Unix epoch seconds).
    pub created_at: i64,
}

/// Handle to the persistent ACL state.
#[derive(Clone)]
pub struct AclStore {
    kv: Arc<dyn KvStore>,
}

impl AclStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Get container repository.
    pub fn containers(&self) -> ContainerRepository<'_> {
        ContainerRepository::new(self.kv.as_ref())
    }

    /// Get ACL repository.
    pub fn acls(&self) -> AclRepository<'_> {
        AclRepository::new(self.kv.as_ref())
    }

    /// Underlying key/value engine.
    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }
}

/// Key prefix shared by every entry of `id`.
pub(crate) fn container_prefix(id: ContainerId) -> String {
    format!("acl\0{:020}\0", id.get())
}

/// Key for an operation slot of `id`; `slot` is an op index or [`EXISTENCE_SLOT`].
pub(crate) fn slot_key(id: ContainerId, slot: i32) -> String {
    format!("{}{}", container_prefix(id), slot)
}

pub(crate) fn acl_key(id: ContainerId, op: ContainerOp) -> String {
    slot_key(id, op.index())
}

pub(crate) fn marker_key(id: ContainerId) -> String {
    slot_key(id, EXISTENCE_SLOT)
}

pub(crate) fn encode_acl(acl: &Acl) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(acl).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub(crate) fn decode_acl(bytes: &[u8]) -> Result<Acl, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_container_prefix() {
        let id = ContainerId::new(7);
        let prefix = container_prefix(id);
        assert!(marker_key(id).starts_with(&prefix));
        for op in ContainerOp::ALL {
            assert!(acl_key(id, op).starts_with(&prefix));
        }
        assert_eq!(marker_key(id), "acl\u{0}00000000000000000007\u{0}-1");
        assert_eq!(acl_key(id, ContainerOp::Write), "acl\u{0}00000000000000000007\u{0}2");
    }

    #[test]
    fn prefixes_do_not_overlap_between_containers() {
        let a = container_prefix(ContainerId::new(1));
        let b = container_prefix(ContainerId::new(10));
        assert!(!b.starts_with(&a));
        assert!(!a.starts_with(&b));
    }
}
