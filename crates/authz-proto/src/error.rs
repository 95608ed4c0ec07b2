//! Error types for the authorization core.
//!
//! Each layer has its own small error enum so callers can match on the
//! exact failure without string inspection.

use thiserror::Error;

/// Failure to interpret a raw operation mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MaskError {
    /// The raw value carries bits outside the closed operation set.
    #[error("operation mask {0:#x} contains unknown bits")]
    UnknownBits(u32),

    /// An operation index outside `0..NUM_CONTAINER_OPS`.
    #[error("unknown operation index {0}")]
    UnknownIndex(i32),
}

/// Errors raised by the ACL set algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AclError {
    /// Growing the ACL array failed.
    #[error("out of space while growing ACL to {requested} entries")]
    OutOfSpace {
        /// Number of entries the algebra tried to hold.
        requested: usize,
    },
}

/// A capability was rejected.
///
/// The variants distinguish the failing check for logging; callers that
/// surface the error to clients should treat them uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyCapError {
    /// The MAC does not match the capability data under the server key.
    #[error("capability MAC mismatch")]
    BadMac,

    /// The capability names a different container.
    #[error("capability is for container {actual}, not {expected}")]
    ContainerMismatch {
        /// Container the request targets.
        expected: u64,
        /// Container the capability was issued for.
        actual: u64,
    },

    /// The capability does not cover every requested operation.
    #[error("capability does not cover requested operations {missing:#x}")]
    MissingOperations {
        /// Requested bits absent from the capability.
        missing: u32,
    },

    /// The encoded capability could not be parsed.
    #[error("malformed capability encoding")]
    Malformed,
}

/// A credential was rejected by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The credential MAC is not valid for its user id.
    #[error("credential MAC mismatch")]
    InvalidMac,

    /// The user is not known to the authentication service.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The user's credentials have been revoked.
    #[error("credential revoked for user: {0}")]
    Revoked(String),

    /// The authentication service could not be reached.
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}
