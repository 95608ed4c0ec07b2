//! Capability issuance and holder verification.

use super::AuthorizationService;
use crate::decision::{check_authorization, check_membership};
use crate::error::{AuthzError, AuthzResult};
use crate::registry::ProcessId;
use authz_proto::{Capability, CapabilityData, ContainerId, Credential, OperationMask, generate_cap};
use tracing::debug;

impl AuthorizationService {
    /// Issue a capability for `ops` on `id` to the holder of `credential`.
    ///
    /// All or nothing: if the user lacks any requested operation the call
    /// fails and no narrower capability is issued. `CREATE` needs no ACL
    /// membership. A mask of exactly `CREATE` does not require `id` to exist
    /// (pass `ContainerId::ANY`); any other mask, including an empty one,
    /// does.
    pub async fn get_cap(
        &self,
        id: ContainerId,
        ops: OperationMask,
        credential: Credential,
    ) -> AuthzResult<Capability> {
        self.run("get_cap", id, async {
            let state = self.state();
            state.verifier.verify(&credential).await?;

            if ops != OperationMask::CREATE {
                if !state.store.containers().exists(id).await? {
                    return Err(AuthzError::NotFound(format!("container {id}")));
                }
                if state.acl_enabled {
                    check_membership(state, id, ops, credential.user_id).await?;
                }
            }

            debug!(container = %id, ops = ?ops, user = %credential.user_id, "Capability issued");
            let data = CapabilityData {
                container_id: id,
                operation_mask: ops,
                credential,
            };
            Ok(generate_cap(&state.server_key, data))
        })
        .await
    }

    /// Verify every capability in `caps`, then register `caller` as a holder
    /// of each.
    ///
    /// Each capability is checked for exactly the container and operations
    /// it names. The first failure aborts the call and nothing is
    /// registered.
    pub async fn verify_caps(&self, caller: ProcessId, caps: &[Capability]) -> AuthzResult<()> {
        let container = caps
            .first()
            .map_or(ContainerId::ANY, |cap| cap.data.container_id);
        self.run("verify_caps", container, async {
            let state = self.state();
            for cap in caps {
                check_authorization(state, cap.data.container_id, cap.data.operation_mask, cap)
                    .await?;
            }
            for cap in caps {
                state.holders.register(cap, caller);
            }
            debug!(caller = %caller, count = caps.len(), "Capabilities verified and registered");
            Ok(())
        })
        .await
    }
}
