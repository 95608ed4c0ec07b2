//! Credentials issued by the authentication service.
//!
//! A credential binds a [`UserId`] to a MAC computed by the authentication
//! service. This crate only carries the value; checking the MAC is the job
//! of a credential verifier in the service layer.

use crate::capability::Mac;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// Domain separator for credential MAC input.
pub const CREDENTIAL_TAG: &[u8] = b"authz-cred-v1";

/// Proof of a user's identity, produced by the authentication service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    /// The authenticated user.
    pub user_id: UserId,
    /// Authentication-service MAC over [`Credential::signed_bytes`].
    pub mac: Mac,
}

impl Credential {
    /// Assemble a credential from its parts.
    pub fn new(user_id: UserId, mac: impl Into<Mac>) -> Self {
        Self {
            user_id,
            mac: mac.into(),
        }
    }

    /// Bytes the authentication service MACs for `user_id`.
    pub fn signed_bytes(user_id: &UserId) -> Vec<u8> {
        let mut buf = Vec::with_capacity(CREDENTIAL_TAG.len() + UserId::LEN);
        buf.extend_from_slice(CREDENTIAL_TAG);
        buf.extend_from_slice(user_id.as_bytes());
        buf
    }
}
