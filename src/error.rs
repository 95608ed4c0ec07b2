//! Unified error handling for authzd.
//!
//! Every service operation returns [`AuthzResult`]. Lower layers keep their
//! own error enums ([`StoreError`], [`AclError`], [`VerifyCapError`],
//! [`CredentialError`]) and convert into [`AuthzError`] at the service
//! boundary.

use crate::store::StoreError;
use authz_proto::{AclError, CredentialError, VerifyCapError};
use thiserror::Error;

/// Errors surfaced by the authorization service operations.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Referenced container or ACL entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Creation collided with an existing key.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The capability failed integrity, container or operation checks.
    #[error("capability rejected: {0}")]
    VerifyCap(#[from] VerifyCapError),

    /// Passed through from the credential verifier.
    #[error("credential rejected: {0}")]
    Credential(#[from] CredentialError),

    /// Capability and credential are valid but the user is not on the ACL.
    #[error("access denied for user {user} on container {container} ({operation})")]
    AccessDenied {
        user: String,
        container: u64,
        operation: &'static str,
    },

    /// Allocation failure in the ACL algebra or store.
    #[error("out of space: {0}")]
    OutOfSpace(String),

    /// The key/value engine failed.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl AuthzError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::VerifyCap(_) => "verify_cap",
            Self::Credential(_) => "credential",
            Self::AccessDenied { .. } => "access_denied",
            Self::OutOfSpace(_) => "out_of_space",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<AclError> for AuthzError {
    fn from(err: AclError) -> Self {
        AuthzError::OutOfSpace(err.to_string())
    }
}

impl From<StoreError> for AuthzError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => AuthzError::NotFound(key),
            StoreError::KeyExists(key) => AuthzError::AlreadyExists(key),
            other => AuthzError::Storage(other),
        }
    }
}

/// Result type for service operations.
pub type AuthzResult<T> = Result<T, AuthzError>;
