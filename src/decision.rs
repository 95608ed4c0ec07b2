//! Authorization decision procedure.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the capability names the requested container
//! 2. the capability grants every requested operation
//! 3. the embedded credential is accepted by the verifier
//! 4. the capability MAC is valid under the server key
//! 5. if ACL checking is enabled, the credential's user is on the ACL of
//!    every requested operation except `CREATE`
//!
//! Capabilities carry no expiry; step 5 is what makes ACL edits revoke
//! outstanding capabilities.

use crate::error::{AuthzError, AuthzResult};
use crate::metrics;
use crate::state::AuthorizationState;
use authz_proto::{
    Capability, ContainerId, ContainerOp, OperationMask, UserId, VerifyCapError, verify_cap,
};
use tracing::debug;

/// Decide whether `cap` authorizes `requested` on `container`.
pub async fn check_authorization(
    state: &AuthorizationState,
    container: ContainerId,
    requested: OperationMask,
    cap: &Capability,
) -> AuthzResult<()> {
    let data = &cap.data;

    if data.container_id != container {
        return Err(deny(
            "container",
            VerifyCapError::ContainerMismatch {
                expected: container.get(),
                actual: data.container_id.get(),
            }
            .into(),
        ));
    }

    check_capability(state, requested, cap).await?;

    if state.acl_enabled {
        check_membership(state, container, requested, cap.data.credential.user_id).await?;
    }

    Ok(())
}

/// Steps 2 to 4: operation coverage, credential and MAC, without regard to
/// which container the capability names.
pub(crate) async fn check_capability(
    state: &AuthorizationState,
    requested: OperationMask,
    cap: &Capability,
) -> AuthzResult<()> {
    let data = &cap.data;

    let missing = requested.missing_from(data.operation_mask);
    if !missing.is_empty() {
        return Err(deny(
            "operations",
            VerifyCapError::MissingOperations {
                missing: missing.bits(),
            }
            .into(),
        ));
    }

    if let Err(e) = state.verifier.verify(&data.credential).await {
        return Err(deny("credential", e.into()));
    }

    if let Err(e) = verify_cap(&state.server_key, cap) {
        return Err(deny("mac", e.into()));
    }

    Ok(())
}

/// Step 5: `user` must be on the ACL of every requested operation but `CREATE`.
pub(crate) async fn check_membership(
    state: &AuthorizationState,
    container: ContainerId,
    requested: OperationMask,
    user: UserId,
) -> AuthzResult<()> {
    let acls = state.store.acls();
    for op in requested.ops().filter(|op| *op != ContainerOp::Create) {
        let acl = acls.get(container, op).await?;
        if !acl.contains(&user) {
            return Err(deny(
                "acl",
                AuthzError::AccessDenied {
                    user: user.to_string(),
                    container: container.get(),
                    operation: op.name(),
                },
            ));
        }
    }
    Ok(())
}

fn deny(step: &'static str, err: AuthzError) -> AuthzError {
    debug!(step, error = %err, "Authorization denied");
    metrics::record_denial(step);
    err
}
