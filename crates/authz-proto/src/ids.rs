//! Identifier types: users and containers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque 128-bit user identifier.
///
/// Ordering is the byte-wise order of the 16 identifier bytes. The ACL set
/// algebra relies on this being a strict total order, so it is spelled out
/// here rather than inherited.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Number of bytes in the identifier.
    pub const LEN: usize = 16;

    /// Wrap raw identifier bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Generate a random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Ord for UserId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for UserId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0.hyphenated())
    }
}

/// Identifier of a logical container of storage objects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Sentinel asking the server to allocate a fresh id.
    pub const ANY: ContainerId = ContainerId(u64::MAX);

    /// First id handed out by server-side allocation.
    pub const FIRST: ContainerId = ContainerId(1);

    /// Wrap a raw container id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the allocation sentinel.
    pub const fn is_any(self) -> bool {
        self.0 == u64::MAX
    }
}

impl From<u64> for ContainerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            f.write_str("ANY")
        } else {
            self.0.fmt(f)
        }
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self)
    }
}
