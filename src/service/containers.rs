//! Container creation and removal.

use super::AuthorizationService;
use crate::decision::{check_authorization, check_capability};
use crate::error::{AuthzError, AuthzResult};
use crate::metrics;
use crate::state::RevocationNotice;
use authz_proto::{
    Acl, Capability, CapabilityData, ContainerId, ContainerOp, OperationMask, generate_cap,
};
use tracing::{debug, info};

/// Rights granted to a container's creator.
const CREATOR_MASK: OperationMask = OperationMask::MODACL
    .union(OperationMask::REMOVE)
    .union(OperationMask::READ);

impl AuthorizationService {
    /// Create a container and return the creator's capability for it.
    ///
    /// `requested = ContainerId::ANY` lets the server pick the id. The
    /// requesting capability must grant `CREATE`; the container it names is
    /// not checked. One ACL per operation is written in the same atomic
    /// write as the container itself. With ACL checking enabled the creator
    /// is seeded onto the ACL of every operation in the returned capability;
    /// all other ACLs start empty.
    pub async fn create_container(
        &self,
        requested: ContainerId,
        requesting_cap: &Capability,
    ) -> AuthzResult<Capability> {
        self.run("create_container", requested, async {
            let state = self.state();
            check_capability(state, OperationMask::CREATE, requesting_cap).await?;

            let credential = requesting_cap.data.credential;
            // Every operation gets an ACL either way; the creator is only
            // seeded when membership is enforced.
            let seeds: Vec<(ContainerOp, Acl)> = if state.acl_enabled {
                CREATOR_MASK
                    .ops()
                    .map(|op| (op, Acl::from_users([credential.user_id])))
                    .collect()
            } else {
                Vec::new()
            };

            let id = state.store.containers().create_seeded(requested, &seeds).await?;
            metrics::record_container_created();
            debug!(container = %id, user = %credential.user_id, "Issued creator capability");

            let data = CapabilityData {
                container_id: id,
                operation_mask: CREATOR_MASK,
                credential,
            };
            Ok(generate_cap(&state.server_key, data))
        })
        .await
    }

    /// Remove a container and all of its ACLs. Requires `REMOVE`.
    ///
    /// Every registered holder of a capability on the container is named in
    /// the published revocation notice.
    pub async fn remove_container(&self, id: ContainerId, cap: &Capability) -> AuthzResult<()> {
        self.run("remove_container", id, async {
            let state = self.state();
            check_authorization(state, id, OperationMask::REMOVE, cap).await?;

            let acls = state.store.acls();
            for op in ContainerOp::ALL {
                match acls.delete(id, op).await {
                    Ok(()) | Err(AuthzError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
            state.store.containers().remove(id).await?;

            let holders = state.holders.drop_container(id);
            info!(container = %id, holders = holders.len(), "Container access revoked");
            state.publish_revocation(RevocationNotice {
                container_id: id,
                operations: OperationMask::all(),
                users: Vec::new(),
                holders,
            });
            Ok(())
        })
        .await
    }

    /// Whether `id` currently exists.
    pub async fn container_exists(&self, id: ContainerId) -> AuthzResult<bool> {
        self.state().store.containers().exists(id).await
    }
}
