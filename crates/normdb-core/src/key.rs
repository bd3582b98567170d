use crate::{
    catalog::AttributeCatalog,
    error::InternalError,
    relation::{Relation, RelationStage},
};

///
/// KeyDeriver
///
/// Chooses a primary key from the cached candidate keys.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyDeriver;

impl KeyDeriver {
    /// Pick the smallest candidate key, first one wins on ties.
    /// With no candidates every attribute is part of the key.
    pub fn assign_primary_key(relation: &mut Relation) -> Result<(), InternalError> {
        let key = relation
            .candidate_keys
            .iter()
            .enumerate()
            .min_by_key(|(position, key)| (key.len(), *position))
            .map_or_else(|| relation.attributes.clone(), |(_, key)| key.clone());

        if !key.is_subset_of(&relation.attributes) {
            return Err(InternalError::key_invariant(format!(
                "primary key of relation '{}' is not contained in its attributes",
                relation.name
            )));
        }

        relation.primary_key = key;
        if relation.stage < RelationStage::KeyAssigned {
            relation.stage = RelationStage::KeyAssigned;
        }

        Ok(())
    }

    /// Mark every attribute of the global relation's primary key as prime.
    /// One-time, whole-database classification.
    pub fn mark_prime_attributes(
        catalog: &mut AttributeCatalog,
        global: &Relation,
    ) -> Result<(), InternalError> {
        if !global.has_key() {
            return Err(InternalError::key_invariant(format!(
                "relation '{}' has no primary key to derive prime attributes from",
                global.name
            )));
        }

        catalog.mark_prime(&global.primary_key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeId, AttributeSet};

    fn set(ids: &[u32]) -> AttributeSet {
        ids.iter().copied().map(AttributeId::new).collect()
    }

    #[test]
    fn empty_candidates_fall_back_to_all_attributes() {
        let mut relation = Relation::new("r1", set(&[0, 2, 3]));

        KeyDeriver::assign_primary_key(&mut relation).unwrap();

        assert_eq!(relation.primary_key, set(&[0, 2, 3]));
        assert_eq!(relation.stage, RelationStage::KeyAssigned);
    }

    #[test]
    fn smallest_candidate_wins_and_ties_keep_first() {
        let mut relation = Relation::new("r1", set(&[0, 1, 2, 3]));
        relation.candidate_keys = vec![set(&[0, 1]), set(&[2]), set(&[3])];

        KeyDeriver::assign_primary_key(&mut relation).unwrap();

        assert_eq!(relation.primary_key, set(&[2]));
    }

    #[test]
    fn key_outside_attributes_is_rejected() {
        let mut relation = Relation::new("r1", set(&[0]));
        relation.candidate_keys = vec![set(&[5])];

        assert!(KeyDeriver::assign_primary_key(&mut relation).is_err());
    }

    #[test]
    fn prime_marking_requires_assigned_key() {
        let mut catalog = AttributeCatalog::new();
        catalog.insert("A").unwrap();
        catalog.insert("B").unwrap();
        let mut global = Relation::new("global_relation", catalog.all());

        assert!(KeyDeriver::mark_prime_attributes(&mut catalog, &global).is_err());

        global.candidate_keys = vec![set(&[1])];
        KeyDeriver::assign_primary_key(&mut global).unwrap();
        KeyDeriver::mark_prime_attributes(&mut catalog, &global).unwrap();

        assert!(!catalog.is_prime(AttributeId::new(0)));
        assert!(catalog.is_prime(AttributeId::new(1)));
    }
}
