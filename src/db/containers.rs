//! Container lifecycle: existence, id allocation and removal.
//!
//! A container is claimed by writing its existence marker together with one
//! ACL per operation in a single no-overwrite batch. The claim is the uniqueness check:
//! two callers can never both succeed for the same id. For `ANY` requests
//! the candidate comes from an atomic increment-and-fetch counter, so
//! concurrent allocations get distinct candidates; a claim collision (an
//! explicit id created earlier) just moves on to the next candidate.

use super::{
    CONTAINER_COUNTER_KEY, ContainerRecord, acl_key, container_prefix, encode_acl, marker_key,
};
use crate::error::{AuthzError, AuthzResult};
use crate::store::{KvStore, StoreError};
use authz_proto::{Acl, ContainerId, ContainerOp};
use tracing::{debug, info};

/// Repository for container operations.
pub struct ContainerRepository<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> ContainerRepository<'a> {
    /// Create a new container repository.
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// Whether `id` has an existence marker.
    pub async fn exists(&self, id: ContainerId) -> AuthzResult<bool> {
        Ok(self.kv.exists(&marker_key(id)).await?)
    }

    /// Create a container whose ACLs are all empty.
    pub async fn create(&self, requested: ContainerId) -> AuthzResult<ContainerId> {
        self.create_seeded(requested, &[]).await
    }

    /// Create a container and all of its ACLs atomically.
    ///
    /// Operations listed in `seeds` start with the given ACL, every other
    /// operation with an empty one. `requested = ANY` allocates a fresh id.
    /// A concrete id fails with `AlreadyExists` if taken.
    pub async fn create_seeded(
        &self,
        requested: ContainerId,
        seeds: &[(ContainerOp, Acl)],
    ) -> AuthzResult<ContainerId> {
        if !requested.is_any() {
            return match self.claim(requested, seeds).await {
                Ok(()) => {
                    info!(container = %requested, "Container created");
                    Ok(requested)
                }
                Err(StoreError::KeyExists(_)) => {
                    Err(AuthzError::AlreadyExists(format!("container {requested}")))
                }
                Err(e) => Err(e.into()),
            };
        }

        loop {
            let candidate = ContainerId::new(self.kv.fetch_add(CONTAINER_COUNTER_KEY, 1).await?);
            if candidate.is_any() {
                return Err(AuthzError::OutOfSpace("container id space exhausted".into()));
            }
            match self.claim(candidate, seeds).await {
                Ok(()) => {
                    info!(container = %candidate, "Container allocated");
                    return Ok(candidate);
                }
                Err(StoreError::KeyExists(_)) => {
                    debug!(container = %candidate, "Allocated id already in use, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove the existence marker and every ACL of `id`.
    ///
    /// Storage objects belonging to the container are not touched.
    pub async fn remove(&self, id: ContainerId) -> AuthzResult<()> {
        if !self.exists(id).await? {
            return Err(AuthzError::NotFound(format!("container {id}")));
        }
        let removed = self.kv.delete_prefix(&container_prefix(id)).await?;
        if removed == 0 {
            // Lost a race with a concurrent remove.
            return Err(AuthzError::NotFound(format!("container {id}")));
        }
        info!(container = %id, entries = removed, "Container removed");
        Ok(())
    }

    async fn claim(&self, id: ContainerId, seeds: &[(ContainerOp, Acl)]) -> Result<(), StoreError> {
        let record = ContainerRecord {
            created_at: chrono::Utc::now().timestamp(),
        };
        let record =
            serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let empty = Acl::empty();
        let mut batch = Vec::with_capacity(ContainerOp::ALL.len() + 1);
        batch.push((marker_key(id), record));
        for op in ContainerOp::ALL {
            let acl = seeds
                .iter()
                .find(|(seeded, _)| *seeded == op)
                .map_or(&empty, |(_, acl)| acl);
            batch.push((acl_key(id, op), encode_acl(acl)?));
        }
        self.kv.put_batch(&batch, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AclRepository;
    use crate::store::MemoryStore;
    use authz_proto::UserId;

    #[tokio::test]
    async fn any_allocates_sequential_ids() {
        let kv = MemoryStore::new();
        let repo = ContainerRepository::new(&kv);
        assert_eq!(repo.create(ContainerId::ANY).await.unwrap(), ContainerId::new(1));
        assert_eq!(repo.create(ContainerId::ANY).await.unwrap(), ContainerId::new(2));
    }

    #[tokio::test]
    async fn allocation_skips_explicitly_taken_ids() {
        let kv = MemoryStore::new();
        let repo = ContainerRepository::new(&kv);
        repo.create(ContainerId::new(1)).await.unwrap();
        repo.create(ContainerId::new(2)).await.unwrap();
        assert_eq!(repo.create(ContainerId::ANY).await.unwrap(), ContainerId::new(3));
    }

    #[tokio::test]
    async fn explicit_id_collision_is_already_exists() {
        let kv = MemoryStore::new();
        let repo = ContainerRepository::new(&kv);
        repo.create(ContainerId::new(9)).await.unwrap();
        assert!(matches!(
            repo.create(ContainerId::new(9)).await,
            Err(AuthzError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn every_operation_gets_an_acl() {
        let kv = MemoryStore::new();
        let repo = ContainerRepository::new(&kv);
        let user = UserId::new_v4();
        let id = repo
            .create_seeded(ContainerId::ANY, &[(ContainerOp::Read, Acl::from_users([user]))])
            .await
            .unwrap();

        let acls = AclRepository::new(&kv);
        for op in ContainerOp::ALL {
            let acl = acls.get(id, op).await.unwrap();
            assert_eq!(acl.contains(&user), op == ContainerOp::Read);
        }

        let plain = repo.create(ContainerId::ANY).await.unwrap();
        for op in ContainerOp::ALL {
            assert!(acls.get(plain, op).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn remove_deletes_marker_and_acls() {
        let kv = MemoryStore::new();
        let repo = ContainerRepository::new(&kv);
        let seeds = vec![
            (ContainerOp::Read, Acl::from_users([UserId::new_v4()])),
            (ContainerOp::Write, Acl::empty()),
        ];
        let id = repo.create_seeded(ContainerId::ANY, &seeds).await.unwrap();
        assert_eq!(kv.len(), 1 + ContainerOp::ALL.len());

        repo.remove(id).await.unwrap();
        assert!(!repo.exists(id).await.unwrap());
        assert!(kv.is_empty());
        assert!(matches!(repo.remove(id).await, Err(AuthzError::NotFound(_))));
    }
}
