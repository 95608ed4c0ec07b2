//! Per-operation ACL entries.

use super::{acl_key, decode_acl, encode_acl};
use crate::error::{AuthzError, AuthzResult};
use crate::store::{KvStore, StoreError};
use authz_proto::{Acl, ContainerId, ContainerOp};
use tracing::debug;

/// Repository for ACL operations.
pub struct AclRepository<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> AclRepository<'a> {
    /// Create a new ACL repository.
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// Fetch the ACL for `(id, op)`.
    pub async fn get(&self, id: ContainerId, op: ContainerOp) -> AuthzResult<Acl> {
        match self.kv.get(&acl_key(id, op)).await? {
            Some(bytes) => Ok(decode_acl(&bytes)?),
            None => Err(not_found(id, op)),
        }
    }

    /// Store the ACL for `(id, op)`.
    pub async fn put(
        &self,
        id: ContainerId,
        op: ContainerOp,
        acl: &Acl,
        overwrite: bool,
    ) -> AuthzResult<()> {
        match self.kv.put(&acl_key(id, op), &encode_acl(acl)?, overwrite).await {
            Ok(()) => Ok(()),
            Err(StoreError::KeyExists(_)) => Err(AuthzError::AlreadyExists(format!(
                "acl {id}/{op}"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the ACL for `(id, op)`.
    pub async fn delete(&self, id: ContainerId, op: ContainerOp) -> AuthzResult<()> {
        match self.kv.delete(&acl_key(id, op)).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(not_found(id, op)),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write the ACL for `(id, op)`.
    ///
    /// The write is a compare-and-swap against the value read, retried until
    /// no concurrent writer intervened. Readers never observe the entry as
    /// missing. `modify` may run more than once.
    pub async fn update<F>(&self, id: ContainerId, op: ContainerOp, mut modify: F) -> AuthzResult<Acl>
    where
        F: FnMut(&Acl) -> AuthzResult<Acl> + Send,
    {
        let key = acl_key(id, op);
        let mut attempt = 0u32;
        loop {
            let current = self.kv.get(&key).await?.ok_or_else(|| not_found(id, op))?;
            let updated = modify(&decode_acl(&current)?)?;
            let encoded = encode_acl(&updated)?;

            if self
                .kv
                .compare_and_swap(&key, Some(current.as_slice()), Some(encoded.as_slice()))
                .await?
            {
                return Ok(updated);
            }
            attempt += 1;
            debug!(container = %id, op = %op, attempt, "ACL changed concurrently, retrying update");
        }
    }
}

fn not_found(id: ContainerId, op: ContainerOp) -> AuthzError {
    AuthzError::NotFound(format!("acl {id}/{op}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use authz_proto::UserId;

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let kv = MemoryStore::new();
        let repo = AclRepository::new(&kv);
        assert!(matches!(
            repo.get(ContainerId::new(1), ContainerOp::Read).await,
            Err(AuthzError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn put_respects_overwrite_flag() {
        let kv = MemoryStore::new();
        let repo = AclRepository::new(&kv);
        let id = ContainerId::new(1);
        let acl = Acl::from_users([UserId::new_v4()]);

        repo.put(id, ContainerOp::Read, &acl, false).await.unwrap();
        assert!(matches!(
            repo.put(id, ContainerOp::Read, &Acl::empty(), false).await,
            Err(AuthzError::AlreadyExists(_))
        ));
        repo.put(id, ContainerOp::Read, &Acl::empty(), true).await.unwrap();
        assert!(repo.get(id, ContainerOp::Read).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let kv = MemoryStore::new();
        let repo = AclRepository::new(&kv);
        assert!(matches!(
            repo.delete(ContainerId::new(1), ContainerOp::Write).await,
            Err(AuthzError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_value_in_place() {
        let kv = MemoryStore::new();
        let repo = AclRepository::new(&kv);
        let id = ContainerId::new(4);
        let (a, b) = (UserId::new_v4(), UserId::new_v4());
        repo.put(id, ContainerOp::Write, &Acl::from_users([a]), false)
            .await
            .unwrap();

        let updated = repo
            .update(id, ContainerOp::Write, |acl| Ok(acl.modify(&[b], &[a])?))
            .await
            .unwrap();
        assert_eq!(updated.as_slice(), &[b]);
        assert_eq!(repo.get(id, ContainerOp::Write).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let kv = std::sync::Arc::new(MemoryStore::new());
        let id = ContainerId::new(1);
        AclRepository::new(kv.as_ref())
            .put(id, ContainerOp::Read, &Acl::empty(), false)
            .await
            .unwrap();

        let users: Vec<UserId> = (0..16).map(|_| UserId::new_v4()).collect();
        let mut tasks = Vec::new();
        for user in users.clone() {
            let kv = kv.clone();
            tasks.push(tokio::spawn(async move {
                AclRepository::new(kv.as_ref())
                    .update(id, ContainerOp::Read, |acl| Ok(acl.union(&[user])?))
                    .await
                    .map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let acl = AclRepository::new(kv.as_ref())
            .get(id, ContainerOp::Read)
            .await
            .unwrap();
        assert_eq!(acl.len(), users.len());
    }
}
