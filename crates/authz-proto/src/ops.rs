//! Container operations and operation masks.
//!
//! The operation set is closed: five named kinds, each a single bit in an
//! [`OperationMask`]. Raw masks coming off the wire are validated with
//! [`OperationMask::try_from`] so unknown bits never reach the ACL store.

use crate::error::MaskError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of distinct container operations.
pub const NUM_CONTAINER_OPS: usize = 5;

bitflags::bitflags! {
    /// Set of container operations a capability grants or a request needs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct OperationMask: u32 {
        /// Create a container.
        const CREATE = 1 << 0;
        /// Read container contents and ACLs.
        const READ = 1 << 1;
        /// Write container contents.
        const WRITE = 1 << 2;
        /// Modify container ACLs.
        const MODACL = 1 << 3;
        /// Remove the container.
        const REMOVE = 1 << 4;
    }
}

/// A single container operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum ContainerOp {
    Create,
    Read,
    Write,
    ModAcl,
    Remove,
}

impl ContainerOp {
    /// Every operation, in index order.
    pub const ALL: [ContainerOp; NUM_CONTAINER_OPS] = [
        ContainerOp::Create,
        ContainerOp::Read,
        ContainerOp::Write,
        ContainerOp::ModAcl,
        ContainerOp::Remove,
    ];

    /// Stable index used in storage keys.
    pub const fn index(self) -> i32 {
        match self {
            ContainerOp::Create => 0,
            ContainerOp::Read => 1,
            ContainerOp::Write => 2,
            ContainerOp::ModAcl => 3,
            ContainerOp::Remove => 4,
        }
    }

    /// Inverse of [`ContainerOp::index`].
    pub fn from_index(index: i32) -> Result<Self, MaskError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(MaskError::UnknownIndex(index))
    }

    /// The mask bit for this operation.
    pub const fn bit(self) -> OperationMask {
        match self {
            ContainerOp::Create => OperationMask::CREATE,
            ContainerOp::Read => OperationMask::READ,
            ContainerOp::Write => OperationMask::WRITE,
            ContainerOp::ModAcl => OperationMask::MODACL,
            ContainerOp::Remove => OperationMask::REMOVE,
        }
    }

    /// Lowercase name for logs and metric labels.
    pub const fn name(self) -> &'static str {
        match self {
            ContainerOp::Create => "create",
            ContainerOp::Read => "read",
            ContainerOp::Write => "write",
            ContainerOp::ModAcl => "modacl",
            ContainerOp::Remove => "remove",
        }
    }
}

impl fmt::Display for ContainerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ContainerOp> for OperationMask {
    fn from(op: ContainerOp) -> Self {
        op.bit()
    }
}

impl OperationMask {
    /// Operations contained in this mask, in index order.
    pub fn ops(self) -> impl Iterator<Item = ContainerOp> {
        ContainerOp::ALL
            .into_iter()
            .filter(move |op| self.contains(op.bit()))
    }

    /// Requested bits that `self` does not cover.
    pub fn missing_from(self, granted: OperationMask) -> OperationMask {
        self.difference(granted)
    }
}

impl TryFrom<u32> for OperationMask {
    type Error = MaskError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        OperationMask::from_bits(raw).ok_or(MaskError::UnknownBits(raw))
    }
}

impl Serialize for OperationMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for OperationMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        OperationMask::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_op_is_a_distinct_single_bit() {
        let mut seen = OperationMask::empty();
        for op in ContainerOp::ALL {
            assert_eq!(op.bit().bits().count_ones(), 1);
            assert!(!seen.intersects(op.bit()));
            seen |= op.bit();
        }
        assert_eq!(seen, OperationMask::all());
    }

    #[test]
    fn index_round_trips() {
        for op in ContainerOp::ALL {
            assert_eq!(ContainerOp::from_index(op.index()), Ok(op));
        }
        assert_eq!(ContainerOp::from_index(-1), Err(MaskError::UnknownIndex(-1)));
        assert_eq!(ContainerOp::from_index(5), Err(MaskError::UnknownIndex(5)));
    }

    #[test]
    fn ops_iterates_in_index_order() {
        let mask = OperationMask::REMOVE | OperationMask::READ | OperationMask::MODACL;
        let ops: Vec<_> = mask.ops().collect();
        assert_eq!(ops, vec![ContainerOp::Read, ContainerOp::ModAcl, ContainerOp::Remove]);
    }

    #[test]
    fn unknown_bits_are_rejected() {
        assert_eq!(OperationMask::try_from(0b1_0000_0000), Err(MaskError::UnknownBits(0x100)));
        assert_eq!(OperationMask::try_from(0b110), Ok(OperationMask::READ | OperationMask::WRITE));

        let err = serde_json::from_str::<OperationMask>("64").unwrap_err();
        assert!(err.to_string().contains("unknown bits"));
        let mask: OperationMask = serde_json::from_str("3").unwrap();
        assert_eq!(mask, OperationMask::CREATE | OperationMask::READ);
    }

    #[test]
    fn missing_from_reports_uncovered_bits() {
        let requested = OperationMask::READ | OperationMask::WRITE;
        assert_eq!(requested.missing_from(OperationMask::READ), OperationMask::WRITE);
        assert!(requested.missing_from(OperationMask::all()).is_empty());
    }
}
