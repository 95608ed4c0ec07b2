//! Shared authorization state.
//!
//! One `AuthorizationState` lives behind an `Arc` for the lifetime of the
//! daemon and is shared by every concurrent service call.

use crate::db::AclStore;
use crate::registry::{HolderRegistry, ProcessId};
use crate::security::CredentialVerifier;
use crate::store::KvStore;
use authz_proto::{ContainerId, OperationMask, ServerKey, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Buffered notices per subscriber before the slowest one starts lagging.
const REVOCATION_CHANNEL_CAPACITY: usize = 256;

/// Published when rights on a container are withdrawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationNotice {
    pub container_id: ContainerId,
    /// Operations affected.
    pub operations: OperationMask,
    /// Users whose rights were withdrawn; empty means every user.
    pub users: Vec<UserId>,
    /// Registered holders of affected capabilities.
    pub holders: BTreeSet<ProcessId>,
}

/// Construction parameters for [`AuthorizationState`].
pub struct StateParams {
    pub server_key: ServerKey,
    /// Whether live ACL membership is checked on every authorization.
    pub acl_enabled: bool,
    pub kv: Arc<dyn KvStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

pub struct AuthorizationState {
    pub server_key: ServerKey,
    pub acl_enabled: bool,
    pub store: AclStore,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub holders: HolderRegistry,
    revocations: broadcast::Sender<RevocationNotice>,
}

impl AuthorizationState {
    pub fn new(params: StateParams) -> Self {
        let (revocations, _) = broadcast::channel(REVOCATION_CHANNEL_CAPACITY);
        Self {
            server_key: params.server_key,
            acl_enabled: params.acl_enabled,
            store: AclStore::new(params.kv),
            verifier: params.verifier,
            holders: HolderRegistry::new(),
            revocations,
        }
    }

    pub fn subscribe_revocations(&self) -> broadcast::Receiver<RevocationNotice> {
        self.revocations.subscribe()
    }

    /// Send `notice` to current subscribers. Having none is not an error.
    pub(crate) fn publish_revocation(&self, notice: RevocationNotice) {
        let receivers = self.revocations.send(notice).unwrap_or(0);
        tracing::debug!(receivers, "Revocation notice published");
    }
}
