//! Test service fixture.

#![allow(dead_code)]

use authz_proto::{Capability, ContainerId, Credential, OperationMask, ServerKey, UserId};
use authzd::security::SharedKeyAuthority;
use authzd::store::{KvStore, MemoryStore};
use authzd::{AuthorizationService, AuthorizationState, StateParams};
use std::sync::Arc;

/// A service wired to a [`SharedKeyAuthority`] so tests can mint and revoke
/// credentials.
pub struct TestService {
    pub service: AuthorizationService,
    pub authority: Arc<SharedKeyAuthority>,
}

impl TestService {
    /// In-memory store with ACL checking enabled.
    pub fn spawn() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), true)
    }

    /// In-memory store with ACL checking disabled.
    pub fn without_acls() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), false)
    }

    pub fn with_store(kv: Arc<dyn KvStore>, acl_enabled: bool) -> Self {
        Self::with_key(kv, acl_enabled, ServerKey::generate())
    }

    pub fn with_key(kv: Arc<dyn KvStore>, acl_enabled: bool, server_key: ServerKey) -> Self {
        let authority = Arc::new(SharedKeyAuthority::new(b"integration-test-secret"));
        let state = AuthorizationState::new(StateParams {
            server_key,
            acl_enabled,
            kv,
            verifier: authority.clone(),
        });
        Self {
            service: AuthorizationService::new(Arc::new(state)),
            authority,
        }
    }

    /// A fresh user and a valid credential for it.
    pub fn user(&self) -> (UserId, Credential) {
        let user = UserId::new_v4();
        (user, self.authority.issue(user))
    }

    /// A `CREATE` capability for the holder of `credential`.
    pub async fn create_cap(&self, credential: Credential) -> Capability {
        self.service
            .get_cap(ContainerId::ANY, OperationMask::CREATE, credential)
            .await
            .expect("CREATE capability should always be issued")
    }

    /// Create a container with a server-assigned id and return the creator cap.
    pub async fn new_container(&self, credential: Credential) -> Capability {
        let create = self.create_cap(credential).await;
        self.service
            .create_container(ContainerId::ANY, &create)
            .await
            .expect("container creation failed")
    }
}
