use crate::{attribute::AttributeSet, closure::AttributeSetClosure};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};

/// Name given to the relation spanning the whole catalog.
pub const GLOBAL_RELATION_NAME: &str = "global_relation";

///
/// RelationStage
///
/// Per-relation lifecycle inside one normalization level.
/// Ordered so that `stage >= ClosureComputed` means the closure table is cached.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationStage {
    #[default]
    Pending,
    ClosureComputed,
    KeyAssigned,
    Decomposed,
    Final,
}

///
/// Relation
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Relation {
    pub name: String,
    pub attributes: AttributeSet,
    pub primary_key: AttributeSet,
    pub candidate_keys: Vec<AttributeSet>,
    pub closure: Vec<AttributeSetClosure>,

    #[serde(default)]
    pub stage: RelationStage,
}

impl Relation {
    /// Build a pending relation with no derived state.
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            name: name.into(),
            attributes,
            primary_key: AttributeSet::new(),
            candidate_keys: Vec::new(),
            closure: Vec::new(),
            stage: RelationStage::Pending,
        }
    }

    /// Replace the attribute set and drop every piece of derived state.
    pub fn reset_attributes(&mut self, attributes: AttributeSet) {
        self.attributes = attributes;
        self.primary_key = AttributeSet::new();
        self.candidate_keys.clear();
        self.closure.clear();
        self.stage = RelationStage::Pending;
    }

    /// Returns `true` once the closure table has been computed for the current attributes.
    #[must_use]
    pub fn has_closure(&self) -> bool {
        self.stage >= RelationStage::ClosureComputed
    }

    /// Returns `true` once a primary key has been assigned for the current attributes.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.stage >= RelationStage::KeyAssigned
    }
}

///
/// RelationTable
///
/// Ordered output of normalization. Order is discovery order in
/// single-worker mode and unspecified otherwise.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RelationTable(#[into_iterator(owned, ref)] Vec<Relation>);

impl RelationTable {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, relation: Relation) {
        self.0.push(relation);
    }

    /// Look up a relation by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Relation> {
        self.0.iter().find(|relation| relation.name == name)
    }

    /// Take ownership of the relations, leaving the table empty.
    pub fn drain(&mut self) -> Vec<Relation> {
        std::mem::take(&mut self.0)
    }
}

impl From<Vec<Relation>> for RelationTable {
    fn from(relations: Vec<Relation>) -> Self {
        Self(relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeId;

    #[test]
    fn stage_ordering_tracks_cached_state() {
        let mut relation = Relation::new("r1", AttributeSet::from([AttributeId::new(0)]));
        assert!(!relation.has_closure());

        relation.stage = RelationStage::KeyAssigned;
        assert!(relation.has_closure());
        assert!(relation.has_key());

        relation.reset_attributes(AttributeSet::new());
        assert_eq!(relation.stage, RelationStage::Pending);
        assert!(relation.candidate_keys.is_empty());
    }

    #[test]
    fn table_find_by_name() {
        let table = RelationTable::from(vec![
            Relation::new("global_relation", AttributeSet::new()),
            Relation::new("r1", AttributeSet::new()),
        ]);

        assert!(table.find("r1").is_some());
        assert!(table.find("r2").is_none());
        assert_eq!(table.len(), 2);
    }
}
