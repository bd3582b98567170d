use crate::{
    attribute::AttributeSet,
    catalog::{AttributeCatalog, CatalogError},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FdId
///
/// Stable index into the append-only functional-dependency table.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct FdId(u32);

impl FdId {
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
/// FunctionalDependency
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FunctionalDependency {
    pub lhs: AttributeSet,
    pub rhs: AttributeSet,
}

impl FunctionalDependency {
    #[must_use]
    pub const fn new(lhs: AttributeSet, rhs: AttributeSet) -> Self {
        Self { lhs, rhs }
    }
}

///
/// FunctionalDependencySet
///
/// Database-wide FD table, resolved against the catalog at insertion.
///

#[derive(Clone, Debug, Default)]
pub struct FunctionalDependencySet {
    dependencies: Vec<FunctionalDependency>,
}

impl FunctionalDependencySet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dependencies: Vec::new(),
        }
    }

    /// Resolve both sides by name and append the dependency.
    /// Nothing is appended if any name is unknown.
    pub fn insert<L, R>(
        &mut self,
        catalog: &AttributeCatalog,
        lhs: &[L],
        rhs: &[R],
    ) -> Result<FdId, CatalogError>
    where
        L: AsRef<str>,
        R: AsRef<str>,
    {
        let lhs = catalog.resolve(lhs)?;
        let rhs = catalog.resolve(rhs)?;

        self.push(FunctionalDependency::new(lhs, rhs))
    }

    /// Append an already-resolved dependency.
    pub fn push(&mut self, dependency: FunctionalDependency) -> Result<FdId, CatalogError> {
        let id = u32::try_from(self.dependencies.len())
            .map(FdId::new)
            .map_err(|_| CatalogError::CapacityExceeded {
                table: "functional dependency",
            })?;
        self.dependencies.push(dependency);

        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: FdId) -> Option<&FunctionalDependency> {
        self.dependencies.get(id.as_usize())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.dependencies.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Iterate dependencies in table order.
    pub fn iter(&self) -> impl Iterator<Item = (FdId, &FunctionalDependency)> {
        (0..)
            .zip(&self.dependencies)
            .map(|(index, fd)| (FdId::new(index), fd))
    }

    /// Dependencies whose left side lies inside `attributes`.
    pub fn relevant_to<'a>(
        &'a self,
        attributes: &'a AttributeSet,
    ) -> impl Iterator<Item = (FdId, &'a FunctionalDependency)> + 'a {
        self.iter().filter(|(_, fd)| fd.lhs.is_subset_of(attributes))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FunctionalDependency] {
        &self.dependencies
    }
}
