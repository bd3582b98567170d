//! One normalization step over a single relation.
//!
//! Every rule has the same shape: find a determinant that violates the
//! target form, cut its dependents into a child keyed by the determinant,
//! shrink the parent, and hand everything back for resubmission.

use crate::{
    attribute::{AttributeId, AttributeSet},
    catalog::AttributeCatalog,
    closure::ClosureEngine,
    dependency::FdId,
    error::InternalError,
    key::KeyDeriver,
    normal_form::NormalForm,
    relation::{Relation, RelationStage},
    scheduler::RelationNamer,
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;
use tracing::trace;

///
/// DecomposeError
///

#[derive(Debug, ThisError)]
pub enum DecomposeError {
    #[error("decomposition of relation '{relation}' reported a split with no relations")]
    EmptyDecomposition { relation: String },
}

///
/// Decomposition
///
/// `Compliant` hands the untouched relation back; `Split` carries the shrunk
/// parent followed by every child.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decomposition {
    Compliant(Relation),
    Split(Vec<Relation>),
}

impl Decomposition {
    #[must_use]
    pub const fn is_split(&self) -> bool {
        matches!(self, Self::Split(_))
    }
}

///
/// Violation
///
/// Which dependencies a normal form forbids.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Violation {
    /// Non-prime attribute depends on a proper subset of the primary key.
    PartialKey,

    /// Non-prime attribute depends on a non-superkey.
    Transitive,

    /// Any attribute depends on a non-superkey.
    NonSuperkey,
}

impl Violation {
    // Whether `lhs` may act as a violating determinant inside `parent`.
    fn determinant_violates(
        self,
        lhs: &AttributeSet,
        relation: &Relation,
        parent: &AttributeSet,
        derived: &AttributeSet,
    ) -> bool {
        match self {
            Self::PartialKey => lhs.is_partial_of(&relation.primary_key),
            Self::Transitive | Self::NonSuperkey => !parent.is_subset_of(derived),
        }
    }

    // Whether `id` leaves the parent when `lhs` is the determinant.
    fn can_move(
        self,
        id: AttributeId,
        lhs: &AttributeSet,
        relation: &Relation,
        catalog: &AttributeCatalog,
    ) -> bool {
        if lhs.contains_id(id) {
            return false;
        }

        match self {
            Self::PartialKey | Self::Transitive => {
                !catalog.is_prime(id) && !relation.primary_key.contains_id(id)
            }
            Self::NonSuperkey => true,
        }
    }
}

///
/// Decomposer
///

#[derive(Clone, Copy, Debug)]
pub struct Decomposer<'a> {
    catalog: &'a AttributeCatalog,
    engine: ClosureEngine<'a>,
    namer: &'a RelationNamer,
}

impl<'a> Decomposer<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a AttributeCatalog,
        engine: ClosureEngine<'a>,
        namer: &'a RelationNamer,
    ) -> Self {
        Self {
            catalog,
            engine,
            namer,
        }
    }

    /// Run the step for `form`. 1NF never splits.
    pub fn decompose(
        &self,
        form: NormalForm,
        relation: Relation,
    ) -> Result<Decomposition, InternalError> {
        match form {
            NormalForm::First => Ok(Decomposition::Compliant(relation)),
            NormalForm::Second => self.to_second_normal_form(relation),
            NormalForm::Third => self.to_third_normal_form(relation),
            NormalForm::Bcnf => self.to_bcnf(relation),
        }
    }

    /// Remove partial dependencies on the primary key.
    pub fn to_second_normal_form(
        &self,
        relation: Relation,
    ) -> Result<Decomposition, InternalError> {
        // a single-attribute key has no proper non-empty subset
        if relation.primary_key.len() == 1 {
            return Ok(Decomposition::Compliant(relation));
        }

        self.split_by(relation, Violation::PartialKey)
    }

    /// Remove transitive dependencies of non-prime attributes.
    pub fn to_third_normal_form(
        &self,
        relation: Relation,
    ) -> Result<Decomposition, InternalError> {
        self.split_by(relation, Violation::Transitive)
    }

    /// Remove every dependency whose determinant is not a superkey.
    pub fn to_bcnf(&self, relation: Relation) -> Result<Decomposition, InternalError> {
        self.split_by(relation, Violation::NonSuperkey)
    }

    fn split_by(
        &self,
        mut relation: Relation,
        rule: Violation,
    ) -> Result<Decomposition, InternalError> {
        let mut parent = relation.attributes.clone();
        let mut shrunk = false;
        let mut seen = BTreeSet::<FdId>::new();
        let mut children = Vec::new();

        for entry in &relation.closure {
            if !seen.insert(entry.source) {
                continue;
            }
            let Some(fd) = self.engine.dependencies().get(entry.source) else {
                return Err(InternalError::decompose_invariant(format!(
                    "closure entry of relation '{}' points at unknown dependency {}",
                    relation.name, entry.source
                )));
            };
            let lhs = &fd.lhs;

            // an earlier cut may have taken part of the determinant
            if !lhs.is_subset_of(&parent) {
                continue;
            }

            // cached entries describe the unshrunk relation only
            let derived = if shrunk {
                self.engine.project(lhs, &parent)
            } else {
                entry.closure.clone()
            };

            if !rule.determinant_violates(lhs, &relation, &parent, &derived) {
                continue;
            }

            let moved: AttributeSet = derived
                .iter()
                .copied()
                .filter(|id| parent.contains_id(*id))
                .filter(|id| rule.can_move(*id, lhs, &relation, self.catalog))
                .collect();
            if moved.is_empty() {
                continue;
            }

            let mut child = Relation::new(self.namer.next_name(), lhs.union(&moved));
            child.candidate_keys.push(lhs.clone());
            KeyDeriver::assign_primary_key(&mut child)?;
            child.stage = RelationStage::Pending;

            trace!(
                relation = %relation.name,
                child = %child.name,
                fd = %entry.source,
                moved = moved.len(),
                "cut dependents into child relation"
            );

            parent.subtract(&moved);
            shrunk = true;
            children.push(child);
        }

        if children.is_empty() {
            return Ok(Decomposition::Compliant(relation));
        }

        relation.reset_attributes(parent);
        let mut produced = Vec::with_capacity(children.len() + 1);
        produced.push(relation);
        produced.extend(children);

        Ok(Decomposition::Split(produced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::FunctionalDependencySet;

    struct Fixture {
        catalog: AttributeCatalog,
        fds: FunctionalDependencySet,
        namer: RelationNamer,
    }

    impl Fixture {
        fn new(attrs: &[&str], fds: &[(&[&str], &[&str])]) -> Self {
            let mut catalog = AttributeCatalog::new();
            for name in attrs {
                catalog.insert(*name).unwrap();
            }
            let mut table = FunctionalDependencySet::new();
            for &(lhs, rhs) in fds {
                table.insert(&catalog, lhs, rhs).unwrap();
            }

            Self {
                catalog,
                fds: table,
                namer: RelationNamer::new(),
            }
        }

        fn set(&self, names: &[&str]) -> AttributeSet {
            self.catalog.resolve(names).unwrap()
        }

        // Global relation with closure, key and prime flags in place.
        fn global(&mut self) -> Relation {
            let mut relation = Relation::new("global_relation", self.catalog.all());
            ClosureEngine::new(&self.catalog, &self.fds)
                .compute(&mut relation)
                .unwrap();
            KeyDeriver::assign_primary_key(&mut relation).unwrap();
            KeyDeriver::mark_prime_attributes(&mut self.catalog, &relation).unwrap();

            relation
        }

        fn prepare(&self, relation: &mut Relation) {
            ClosureEngine::new(&self.catalog, &self.fds)
                .compute(relation)
                .unwrap();
            KeyDeriver::assign_primary_key(relation).unwrap();
        }

        fn decomposer(&self) -> Decomposer<'_> {
            Decomposer::new(
                &self.catalog,
                ClosureEngine::new(&self.catalog, &self.fds),
                &self.namer,
            )
        }
    }

    fn split(decomposition: Decomposition) -> Vec<Relation> {
        match decomposition {
            Decomposition::Split(relations) => relations,
            Decomposition::Compliant(relation) => panic!("expected split of {}", relation.name),
        }
    }

    #[test]
    fn scenario_a_is_already_second_normal_form() {
        let mut fx = Fixture::new(
            &["A", "B", "C", "D"],
            &[(&["A", "B"], &["C"]), (&["C"], &["D"])],
        );
        let global = fx.global();
        assert_eq!(global.primary_key, fx.set(&["A", "B"]));

        let outcome = fx.decomposer().to_second_normal_form(global.clone()).unwrap();

        assert_eq!(outcome, Decomposition::Compliant(global));
    }

    #[test]
    fn scenario_b_splits_partial_dependency() {
        let mut fx = Fixture::new(
            &["A", "B", "C", "D"],
            &[(&["A"], &["C"]), (&["A", "B"], &["D"])],
        );
        let global = fx.global();
        assert_eq!(global.primary_key, fx.set(&["A", "B"]));
        assert_eq!(global.candidate_keys, vec![fx.set(&["A", "B"])]);

        let produced = split(fx.decomposer().to_second_normal_form(global).unwrap());

        assert_eq!(produced.len(), 2);
        assert_eq!(produced[0].name, "global_relation");
        assert_eq!(produced[0].attributes, fx.set(&["A", "B", "D"]));
        assert_eq!(produced[0].stage, RelationStage::Pending);
        assert_eq!(produced[1].name, "r1");
        assert_eq!(produced[1].attributes, fx.set(&["A", "C"]));
        assert_eq!(produced[1].primary_key, fx.set(&["A"]));
    }

    #[test]
    fn scenario_b_children_are_compliant_on_resubmission() {
        let mut fx = Fixture::new(
            &["A", "B", "C", "D"],
            &[(&["A"], &["C"]), (&["A", "B"], &["D"])],
        );
        let global = fx.global();
        let produced = split(fx.decomposer().to_second_normal_form(global).unwrap());

        for mut relation in produced {
            fx.prepare(&mut relation);
            let outcome = fx.decomposer().to_second_normal_form(relation).unwrap();
            assert!(!outcome.is_split());
        }
    }

    #[test]
    fn single_attribute_key_skips_closure_inspection() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let mut relation = Relation::new("r9", fx.set(&["A", "B"]));
        relation.primary_key = fx.set(&["A"]);
        // a bogus closure entry would fail if it were inspected
        relation.closure.push(crate::closure::AttributeSetClosure {
            source: FdId::new(42),
            closure: fx.set(&["A", "B"]),
        });

        let outcome = fx.decomposer().to_second_normal_form(relation).unwrap();

        assert!(!outcome.is_split());
    }

    #[test]
    fn overlapping_partial_dependencies_move_each_attribute_once() {
        // A -> C and B -> C both violate; C must land in exactly one child.
        let mut fx = Fixture::new(
            &["A", "B", "C", "D"],
            &[(&["A"], &["C"]), (&["B"], &["C"]), (&["A", "B"], &["D"])],
        );
        let global = fx.global();
        let produced = split(fx.decomposer().to_second_normal_form(global.clone()).unwrap());

        let c = fx.catalog.look_up("C").unwrap();
        let holders = produced
            .iter()
            .filter(|relation| relation.attributes.contains_id(c))
            .count();
        assert_eq!(holders, 1);

        let union = produced
            .iter()
            .fold(AttributeSet::new(), |acc, relation| acc.union(&relation.attributes));
        assert_eq!(union, global.attributes);
    }

    #[test]
    fn third_normal_form_cuts_transitive_dependency() {
        let mut fx = Fixture::new(&["A", "B", "C"], &[(&["A"], &["B"]), (&["B"], &["C"])]);
        let global = fx.global();
        assert_eq!(global.primary_key, fx.set(&["A"]));

        let produced = split(fx.decomposer().to_third_normal_form(global).unwrap());

        assert_eq!(produced[0].attributes, fx.set(&["A", "B"]));
        assert_eq!(produced[1].attributes, fx.set(&["B", "C"]));
        assert_eq!(produced[1].primary_key, fx.set(&["B"]));
    }

    #[test]
    fn third_normal_form_keeps_prime_dependents() {
        // C -> B where B is prime: allowed in 3NF, forbidden in BCNF.
        let mut fx = Fixture::new(&["A", "B", "C"], &[(&["A", "B"], &["C"]), (&["C"], &["B"])]);
        let global = fx.global();

        let outcome = fx.decomposer().to_third_normal_form(global.clone()).unwrap();
        assert!(!outcome.is_split());

        let produced = split(fx.decomposer().to_bcnf(global).unwrap());
        assert_eq!(produced[0].attributes, fx.set(&["A", "C"]));
        assert_eq!(produced[1].attributes, fx.set(&["B", "C"]));
    }

    #[test]
    fn first_normal_form_never_splits() {
        let mut fx = Fixture::new(&["A", "B", "C"], &[(&["A"], &["C"])]);
        let global = fx.global();

        let outcome = fx.decomposer().decompose(NormalForm::First, global).unwrap();

        assert!(!outcome.is_split());
    }
}
