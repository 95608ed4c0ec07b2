//! ACL set algebra.
//!
//! An ACL is a sorted, duplicate-free array of [`UserId`]s. All operations
//! here preserve that normal form and use the single ordering defined by
//! `UserId`'s `Ord` impl (ascending byte order).
//!
//! - [`dedupe_sort`]: normalize an arbitrary array, `O(n log n)`
//! - [`union`]: concatenate then normalize
//! - [`difference`]: normalize both sides, then a linear merge-walk, `O(n + m)`
//! - [`contains`]: binary search over a normalized array, `O(log n)`

use crate::error::AclError;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort `set` and drop every element equal to its predecessor.
pub fn dedupe_sort(mut set: Vec<UserId>) -> Vec<UserId> {
    set.sort_unstable();
    set.dedup();
    set
}

/// Every distinct element of `orig` and `toadd`, exactly once, in order.
///
/// Fails with [`AclError::OutOfSpace`] if the combined array cannot be
/// allocated.
pub fn union(orig: &[UserId], toadd: &[UserId]) -> Result<Vec<UserId>, AclError> {
    let requested = orig
        .len()
        .checked_add(toadd.len())
        .ok_or(AclError::OutOfSpace { requested: usize::MAX })?;

    let mut merged = Vec::new();
    merged
        .try_reserve_exact(requested)
        .map_err(|_| AclError::OutOfSpace { requested })?;
    merged.extend_from_slice(orig);
    merged.extend_from_slice(toadd);
    Ok(dedupe_sort(merged))
}

/// Elements of `orig` that are not in `toremove`, normalized.
pub fn difference(orig: &[UserId], toremove: &[UserId]) -> Vec<UserId> {
    let orig = dedupe_sort(orig.to_vec());
    let toremove = dedupe_sort(toremove.to_vec());

    let mut kept = Vec::with_capacity(orig.len());
    let mut j = 0;
    for id in orig {
        while j < toremove.len() && toremove[j] < id {
            j += 1;
        }
        match toremove.get(j).map(|r| r.cmp(&id)) {
            Some(Ordering::Equal) => j += 1,
            _ => kept.push(id),
        }
    }
    kept
}

/// Membership test over a normalized array.
pub fn contains(set: &[UserId], needle: &UserId) -> bool {
    set.binary_search(needle).is_ok()
}

/// Normalized access-control list for one `(container, operation)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct Acl(Vec<UserId>);

impl Acl {
    /// An ACL with no members.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build an ACL from arbitrary ids, normalizing them.
    pub fn from_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self(dedupe_sort(users.into_iter().collect()))
    }

    /// Members in ACL order.
    pub fn as_slice(&self) -> &[UserId] {
        &self.0
    }

    /// Iterate members in ACL order.
    pub fn iter(&self) -> std::slice::Iter<'_, UserId> {
        self.0.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ACL has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `user` is a member.
    pub fn contains(&self, user: &UserId) -> bool {
        contains(&self.0, user)
    }

    /// This ACL with `users` added.
    pub fn union(&self, users: &[UserId]) -> Result<Acl, AclError> {
        union(&self.0, users).map(Acl)
    }

    /// This ACL with `users` removed.
    pub fn difference(&self, users: &[UserId]) -> Acl {
        Acl(difference(&self.0, users))
    }

    /// Apply a set/unset modification: union with `set`, then difference
    /// with `unset`. An id present in both ends up absent.
    pub fn modify(&self, set: &[UserId], unset: &[UserId]) -> Result<Acl, AclError> {
        let added = self.union(set)?;
        Ok(added.difference(unset))
    }

    /// The normalized member array.
    pub fn into_vec(self) -> Vec<UserId> {
        self.0
    }
}

impl From<Vec<UserId>> for Acl {
    fn from(users: Vec<UserId>) -> Self {
        Acl(dedupe_sort(users))
    }
}

impl From<Acl> for Vec<UserId> {
    fn from(acl: Acl) -> Self {
        acl.0
    }
}

impl FromIterator<UserId> for Acl {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Acl::from_users(iter)
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a UserId;
    type IntoIter = std::slice::Iter<'a, UserId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
