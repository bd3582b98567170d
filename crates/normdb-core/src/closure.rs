//! Attribute-set and per-relation closure computation.
//!
//! The per-relation table is built by growing each relevant FD's left side,
//! scanning the FD table forward from the FD just after it and wrapping
//! around. Each FD is folded in at most once per growth. Candidate keys are
//! only ever literal FD left sides; key combinations that never appear
//! verbatim as a left side are not discovered.

use crate::{
    attribute::AttributeSet,
    catalog::AttributeCatalog,
    dependency::{FdId, FunctionalDependency, FunctionalDependencySet},
    error::InternalError,
    relation::{Relation, RelationStage},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

///
/// AttributeSetClosure
///
/// Outcome of growing `source`'s left side inside one relation.
/// `closure` is already projected onto the relation's attributes.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AttributeSetClosure {
    pub source: FdId,
    pub closure: AttributeSet,
}

/// Fixpoint closure of `start` under `dependencies`.
///
/// Repeatedly folds in the right side of every FD whose left side is already
/// covered until a full pass adds nothing.
#[must_use]
pub fn attribute_set_closure(
    start: &AttributeSet,
    dependencies: &[FunctionalDependency],
) -> AttributeSet {
    let mut closure = start.clone();

    loop {
        let mut grew = false;
        for fd in dependencies {
            if fd.lhs.is_subset_of(&closure) && closure.absorb(&fd.rhs) {
                grew = true;
            }
        }

        if !grew {
            return closure;
        }
    }
}

///
/// Growth
///
/// Result of growing a single FD's left side.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Growth {
    /// Full derived set, not yet projected.
    pub derived: AttributeSet,

    /// Number of FDs folded in, including the source.
    pub folded: usize,

    /// Whether the derived set covers the target attribute set.
    pub covers: bool,
}

///
/// ClosureSummary
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClosureSummary {
    pub entries: u64,
    pub candidate_keys: u64,
}

///
/// ClosureEngine
///
/// Read-only view over the catalog and FD table.
/// Safe to share between workers once loading has finished.
///

#[derive(Clone, Copy, Debug)]
pub struct ClosureEngine<'a> {
    catalog: &'a AttributeCatalog,
    dependencies: &'a FunctionalDependencySet,
}

impl<'a> ClosureEngine<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a AttributeCatalog,
        dependencies: &'a FunctionalDependencySet,
    ) -> Self {
        Self {
            catalog,
            dependencies,
        }
    }

    #[must_use]
    pub const fn dependencies(&self) -> &'a FunctionalDependencySet {
        self.dependencies
    }

    /// Grow `source`'s left side until `target` is covered or nothing new is added.
    ///
    /// Scans forward from `source + 1`, wrapping, skipping FDs already folded in.
    #[must_use]
    pub fn grow(&self, source: FdId, target: &AttributeSet) -> Option<Growth> {
        let table = self.dependencies.as_slice();
        let start = source.as_usize();
        let seed = table.get(start)?;
        let len = table.len();

        let mut derived = seed.lhs.union(&seed.rhs);
        let mut included = vec![false; len];
        included[start] = true;
        let mut folded = 1;
        let mut covers = target.is_subset_of(&derived);

        while !covers {
            let mut inserted = false;
            let mut j = (start + 1) % len;

            while j != start {
                if !included[j] && table[j].lhs.is_subset_of(&derived) {
                    derived.absorb(&table[j].rhs);
                    included[j] = true;
                    folded += 1;
                    inserted = true;

                    if target.is_subset_of(&derived) {
                        covers = true;
                        break;
                    }
                }
                j = (j + 1) % len;
            }

            if !inserted {
                break;
            }
        }

        Some(Growth {
            derived,
            folded,
            covers,
        })
    }

    /// Closure of an arbitrary set, projected onto `within`.
    #[must_use]
    pub fn project(&self, start: &AttributeSet, within: &AttributeSet) -> AttributeSet {
        attribute_set_closure(start, self.dependencies.as_slice()).intersection(within)
    }

    /// Build and cache the closure table and candidate keys for `relation`.
    pub fn compute(&self, relation: &mut Relation) -> Result<ClosureSummary, InternalError> {
        if let Some(missing) = relation
            .attributes
            .iter()
            .find(|id| !self.catalog.contains(**id))
        {
            return Err(InternalError::closure_invariant(format!(
                "relation '{}' references attribute {missing} absent from the catalog",
                relation.name
            )));
        }

        relation.closure.clear();
        relation.candidate_keys.clear();

        for (id, fd) in self.dependencies.relevant_to(&relation.attributes) {
            let Some(growth) = self.grow(id, &relation.attributes) else {
                continue;
            };

            trace!(
                relation = %relation.name,
                fd = %id,
                folded = growth.folded,
                covers = growth.covers,
                "closure entry"
            );

            if growth.covers && !relation.candidate_keys.contains(&fd.lhs) {
                relation.candidate_keys.push(fd.lhs.clone());
            }

            relation.closure.push(AttributeSetClosure {
                source: id,
                closure: growth.derived.intersection(&relation.attributes),
            });
        }

        relation.stage = RelationStage::ClosureComputed;

        Ok(ClosureSummary {
            entries: relation.closure.len() as u64,
            candidate_keys: relation.candidate_keys.len() as u64,
        })
    }
}
