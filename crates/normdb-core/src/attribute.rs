use derive_more::{Deref, Display, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// AttributeId
///
/// Stable handle into the append-only attribute catalog.
/// Ids are assigned on insertion and never reused or renumbered.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct AttributeId(u32);

impl AttributeId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

///
/// AttributeSet
///
/// Membership-only set of attribute handles.
/// Iteration follows handle order, which keeps decomposition output deterministic.
///

#[derive(
    Clone,
    Debug,
    Default,
    Deref,
    Deserialize,
    Eq,
    Hash,
    IntoIterator,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct AttributeSet(#[into_iterator(owned, ref)] BTreeSet<AttributeId>);

impl AttributeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Insert an attribute, returning `true` if it was not already present.
    pub fn insert(&mut self, id: AttributeId) -> bool {
        self.0.insert(id)
    }

    /// Remove an attribute, returning `true` if it was present.
    pub fn remove(&mut self, id: AttributeId) -> bool {
        self.0.remove(&id)
    }

    #[must_use]
    pub fn contains_id(&self, id: AttributeId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Non-empty proper subset test used for partial-key detection.
    #[must_use]
    pub fn is_partial_of(&self, other: &Self) -> bool {
        !self.0.is_empty() && self.0.len() < other.0.len() && self.0.is_subset(&other.0)
    }

    /// Extend this set with every attribute in `other`.
    /// Returns `true` if the set grew.
    pub fn absorb(&mut self, other: &Self) -> bool {
        let before = self.0.len();
        self.0.extend(other.0.iter().copied());

        self.0.len() > before
    }

    /// Remove every attribute in `other` from this set.
    pub fn subtract(&mut self, other: &Self) {
        for id in &other.0 {
            self.0.remove(id);
        }
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.0.intersection(&other.0).copied().collect()
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.0.union(&other.0).copied().collect()
    }
}

impl FromIterator<AttributeId> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[AttributeId; N]> for AttributeSet {
    fn from(ids: [AttributeId; N]) -> Self {
        ids.into_iter().collect()
    }
}

impl Extend<AttributeId> for AttributeSet {
    fn extend<I: IntoIterator<Item = AttributeId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u32]) -> AttributeSet {
        ids.iter().copied().map(AttributeId::new).collect()
    }

    #[test]
    fn partial_requires_non_empty_proper_subset() {
        let key = set(&[0, 1]);

        assert!(set(&[0]).is_partial_of(&key));
        assert!(!set(&[0, 1]).is_partial_of(&key), "equal set is not partial");
        assert!(!set(&[]).is_partial_of(&key), "empty set is not partial");
        assert!(!set(&[2]).is_partial_of(&key));
    }

    #[test]
    fn absorb_reports_growth() {
        let mut acc = set(&[0]);

        assert!(acc.absorb(&set(&[0, 1])));
        assert!(!acc.absorb(&set(&[1])));
        assert_eq!(acc, set(&[0, 1]));
    }

    #[test]
    fn subtract_and_intersection() {
        let mut parent = set(&[0, 1, 2, 3]);
        parent.subtract(&set(&[2, 9]));

        assert_eq!(parent, set(&[0, 1, 3]));
        assert_eq!(parent.intersection(&set(&[1, 2, 3])), set(&[1, 3]));
    }

    #[test]
    fn serializes_as_plain_sequence() {
        let json = serde_json::to_string(&set(&[2, 0])).expect("serialize set");

        assert_eq!(json, "[0,2]");
    }
}
