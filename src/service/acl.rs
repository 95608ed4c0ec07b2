//! ACL inspection and administration.

use super::AuthorizationService;
use crate::decision::check_authorization;
use crate::error::AuthzResult;
use crate::state::RevocationNotice;
use authz_proto::{Acl, Capability, ContainerId, ContainerOp, OperationMask, UserId, dedupe_sort};
use tracing::info;

impl AuthorizationService {
    /// Read the ACL of one operation. Requires `READ`.
    pub async fn get_acl(
        &self,
        id: ContainerId,
        op: ContainerOp,
        cap: &Capability,
    ) -> AuthzResult<Acl> {
        self.run("get_acl", id, async {
            let state = self.state();
            check_authorization(state, id, OperationMask::READ, cap).await?;
            state.store.acls().get(id, op).await
        })
        .await
    }

    /// Add `set` to and then remove `unset` from the ACL of every operation
    /// in `ops`. Requires `MODACL`.
    ///
    /// A user in both lists ends up absent. Each ACL is updated atomically
    /// with respect to concurrent modifications; distinct operations are
    /// updated independently.
    pub async fn mod_acl(
        &self,
        id: ContainerId,
        ops: OperationMask,
        set: &[UserId],
        unset: &[UserId],
        cap: &Capability,
    ) -> AuthzResult<()> {
        self.run("mod_acl", id, async {
            let state = self.state();
            check_authorization(state, id, OperationMask::MODACL, cap).await?;

            let acls = state.store.acls();
            for op in ops.ops() {
                let updated = acls
                    .update(id, op, |acl| Ok(acl.modify(set, unset)?))
                    .await?;
                info!(
                    container = %id,
                    op = %op,
                    added = set.len(),
                    removed = unset.len(),
                    size = updated.len(),
                    "ACL modified"
                );
            }

            if !unset.is_empty() {
                let holders = state.holders.revoke_users(id, ops, unset);
                state.publish_revocation(RevocationNotice {
                    container_id: id,
                    operations: ops,
                    users: dedupe_sort(unset.to_vec()),
                    holders,
                });
            }
            Ok(())
        })
        .await
    }
}
