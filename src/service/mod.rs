//! Authorization service operations.
//!
//! Each operation orchestrates the decision engine, the ACL store and the
//! holder registry. None of them retry on failure; the store layer handles
//! concurrent writers itself.
//!
//! - [`containers`]: `create_container`, `remove_container`, `container_exists`
//! - [`acl`]: `get_acl`, `mod_acl`
//! - [`caps`]: `get_cap`, `verify_caps`

mod acl;
mod caps;
mod containers;

use crate::error::AuthzResult;
use crate::metrics;
use crate::state::{AuthorizationState, RevocationNotice};
use crate::telemetry::{OpTimer, spans};
use authz_proto::ContainerId;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{Instrument, debug};

/// Cloneable handle to the authorization service.
#[derive(Clone)]
pub struct AuthorizationService {
    state: Arc<AuthorizationState>,
}

impl AuthorizationService {
    pub fn new(state: Arc<AuthorizationState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AuthorizationState {
        &self.state
    }

    /// Receive a [`RevocationNotice`] for every withdrawal of rights from now on.
    pub fn subscribe_revocations(&self) -> broadcast::Receiver<RevocationNotice> {
        self.state.subscribe_revocations()
    }

    /// Run `fut` as operation `name`: timed, traced and counted on failure.
    async fn run<T, F>(&self, name: &'static str, container: ContainerId, fut: F) -> AuthzResult<T>
    where
        F: Future<Output = AuthzResult<T>>,
    {
        let _timer = OpTimer::new(name);
        let result = fut.instrument(spans::operation(name, container)).await;
        if let Err(e) = &result {
            metrics::record_operation_error(name, e.error_code());
            debug!(operation = name, container = %container, error = %e, "Operation failed");
        }
        result
    }
}
