//! Capability codec: HMAC-SHA256 signed container capabilities.
//!
//! A [`Capability`] is a bearer token: its [`CapabilityData`] plus a MAC
//! computed with the server's secret [`ServerKey`]. Verification recomputes
//! the MAC and compares in constant time.
//!
//! # Canonical form
//!
//! The MAC input is fixed-width and big-endian:
//!
//! ```text
//! "authz-cap-v1" | container_id:u64 | operation_mask:u32 | user_id:[u8;16] | credential_mac:[u8;32]
//! ```
//!
//! [`Capability::encode`] appends the 32-byte capability MAC to that form.
//!
//! A valid MAC only proves the server issued the token unchanged. Whether
//! the rights it encodes are still granted is decided against the ACLs.

use crate::credential::Credential;
use crate::error::VerifyCapError;
use crate::ids::{ContainerId, UserId};
use crate::ops::OperationMask;
use hmac::{Hmac, Mac as _};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::hash::{Hash, Hasher};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Length of a MAC tag in bytes.
pub const MAC_LEN: usize = 32;

/// Length of a server key in bytes.
pub const KEY_LEN: usize = 32;

/// Domain separator for capability MAC input.
const CAPABILITY_TAG: &[u8] = b"authz-cap-v1";

/// Length of [`CapabilityData::canonical_bytes`].
pub const DATA_LEN: usize = CAPABILITY_TAG.len() + 8 + 4 + UserId::LEN + MAC_LEN;

/// Length of an encoded [`Capability`].
pub const ENCODED_LEN: usize = DATA_LEN + MAC_LEN;

/// A 32-byte HMAC-SHA256 tag.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mac([u8; MAC_LEN]);

impl Mac {
    /// Raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(MAC_LEN * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
    }
}

impl From<[u8; MAC_LEN]> for Mac {
    fn from(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Mac {}

impl Hash for Mac {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mac({}..)", &self.to_hex()[..8])
    }
}

/// Symmetric secret used to sign capabilities.
///
/// Never leaves the authorization server. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ServerKey([u8; KEY_LEN]);

impl ServerKey {
    /// Fresh key from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Rebuild a key from persisted bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key material, for persisting the key.
    pub fn expose_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn hmac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }
}

impl fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerKey(<redacted>)")
    }
}

/// The rights a capability grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityData {
    /// Container the rights apply to.
    pub container_id: ContainerId,
    /// Operations granted.
    pub operation_mask: OperationMask,
    /// Credential of the user the capability was issued to.
    pub credential: Credential,
}

impl CapabilityData {
    /// Fixed-width MAC input for this data.
    pub fn canonical_bytes(&self) -> [u8; DATA_LEN] {
        let mut buf = [0u8; DATA_LEN];
        let mut at = 0;
        let parts: [&[u8]; 5] = [
            CAPABILITY_TAG,
            &self.container_id.get().to_be_bytes(),
            &self.operation_mask.bits().to_be_bytes(),
            self.credential.user_id.as_bytes(),
            self.credential.mac.as_bytes(),
        ];
        for part in parts {
            buf[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        }
        buf
    }

    /// Parse [`CapabilityData::canonical_bytes`] output.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, VerifyCapError> {
        if bytes.len() != DATA_LEN || !bytes.starts_with(CAPABILITY_TAG) {
            return Err(VerifyCapError::Malformed);
        }
        let body = &bytes[CAPABILITY_TAG.len()..];
        let (cid, body) = body.split_at(8);
        let (mask, body) = body.split_at(4);
        let (user, cred_mac) = body.split_at(UserId::LEN);

        let cid = u64::from_be_bytes(cid.try_into().map_err(|_| VerifyCapError::Malformed)?);
        let mask = u32::from_be_bytes(mask.try_into().map_err(|_| VerifyCapError::Malformed)?);
        let user: [u8; UserId::LEN] = user.try_into().map_err(|_| VerifyCapError::Malformed)?;
        let cred_mac: [u8; MAC_LEN] = cred_mac.try_into().map_err(|_| VerifyCapError::Malformed)?;

        Ok(Self {
            container_id: ContainerId::new(cid),
            operation_mask: OperationMask::try_from(mask).map_err(|_| VerifyCapError::Malformed)?,
            credential: Credential::new(UserId::from_bytes(user), cred_mac),
        })
    }
}

/// A signed capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    /// Rights granted.
    pub data: CapabilityData,
    /// Server MAC over `data`.
    pub mac: Mac,
}

impl Capability {
    /// Stable identifier for this token, derived from its MAC.
    pub fn fingerprint(&self) -> String {
        self.mac.to_hex()
    }

    /// Binary form: canonical data followed by the MAC.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN);
        out.extend_from_slice(&self.data.canonical_bytes());
        out.extend_from_slice(self.mac.as_bytes());
        out
    }

    /// Parse [`Capability::encode`] output. Does not verify the MAC.
    pub fn decode(bytes: &[u8]) -> Result<Self, VerifyCapError> {
        if bytes.len() != ENCODED_LEN {
            return Err(VerifyCapError::Malformed);
        }
        let (data, mac) = bytes.split_at(DATA_LEN);
        let mac: [u8; MAC_LEN] = mac.try_into().map_err(|_| VerifyCapError::Malformed)?;
        Ok(Self {
            data: CapabilityData::from_canonical_bytes(data)?,
            mac: Mac::from(mac),
        })
    }
}

/// Produce a fresh server key.
pub fn generate_key() -> ServerKey {
    ServerKey::generate()
}

/// Sign `data` with `key`.
pub fn generate_cap(key: &ServerKey, data: CapabilityData) -> Capability {
    let mut mac = key.hmac();
    mac.update(&data.canonical_bytes());
    let mut tag = [0u8; MAC_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Capability {
        data,
        mac: Mac::from(tag),
    }
}

/// Check that `cap` was signed by `key` and has not been altered.
pub fn verify_cap(key: &ServerKey, cap: &Capability) -> Result<(), VerifyCapError> {
    let mut mac = key.hmac();
    mac.update(&cap.data.canonical_bytes());
    mac.verify_slice(cap.mac.as_bytes())
        .map_err(|_| VerifyCapError::BadMac)
}
