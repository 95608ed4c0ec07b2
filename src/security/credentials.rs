//! Credential verification.
//!
//! Credentials are produced by the authentication service, which this daemon
//! treats as a black box. [`CredentialVerifier`] is the seam: the service
//! operations call it and propagate its error verbatim.
//!
//! [`SharedKeyAuthority`] is the verifier used when the authentication
//! service signs credentials with HMAC-SHA256 under a secret shared with
//! this daemon. It can also issue credentials, which tests and local tooling
//! use in place of the real authentication service.

use async_trait::async_trait;
use authz_proto::{Credential, CredentialError, MAC_LEN, UserId};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use sha2::Sha256;
use std::collections::HashSet;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Checks credentials presented inside capabilities and requests.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Accept or reject `credential`.
    async fn verify(&self, credential: &Credential) -> Result<(), CredentialError>;
}

/// HMAC-SHA256 credential issuer and verifier keyed by a shared secret.
pub struct SharedKeyAuthority {
    secret: Zeroizing<Vec<u8>>,
    revoked: RwLock<HashSet<UserId>>,
}

impl SharedKeyAuthority {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_ref().to_vec()),
            revoked: RwLock::new(HashSet::new()),
        }
    }

    /// Issue a credential for `user_id`.
    pub fn issue(&self, user_id: UserId) -> Credential {
        let mut tag = [0u8; MAC_LEN];
        tag.copy_from_slice(&self.mac_for(&user_id).finalize().into_bytes());
        Credential::new(user_id, tag)
    }

    /// Refuse every credential for `user_id` from now on.
    pub fn revoke(&self, user_id: UserId) {
        self.revoked.write().insert(user_id);
    }

    /// Undo [`SharedKeyAuthority::revoke`].
    pub fn reinstate(&self, user_id: &UserId) -> bool {
        self.revoked.write().remove(user_id)
    }

    fn mac_for(&self, user_id: &UserId) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(&Credential::signed_bytes(user_id));
        mac
    }
}

#[async_trait]
impl CredentialVerifier for SharedKeyAuthority {
    async fn verify(&self, credential: &Credential) -> Result<(), CredentialError> {
        let expected = self.mac_for(&credential.user_id).finalize().into_bytes();
        let valid: bool = expected.as_slice().ct_eq(credential.mac.as_bytes()).into();
        if !valid {
            return Err(CredentialError::InvalidMac);
        }
        if self.revoked.read().contains(&credential.user_id) {
            return Err(CredentialError::Revoked(credential.user_id.to_string()));
        }
        Ok(())
    }
}
