use crate::attribute::{AttributeId, AttributeSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// CatalogError
///

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("attribute '{name}' not found in catalog")]
    AttributeNotFound { name: String },

    #[error("{table} table cannot hold more than {} entries", u32::MAX)]
    CapacityExceeded { table: &'static str },

    #[error("attribute '{name}' already exists in catalog")]
    DuplicateAttribute { name: String },

    #[error("schema is frozen once normalization has started")]
    Frozen,
}

///
/// DuplicatePolicy
///
/// How `AttributeCatalog::insert` treats a name that is already present.
///
/// `Allow` keeps the historical behaviour: the duplicate gets its own id and
/// name lookups resolve to the most recent insertion.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Allow,
    Reject,
}

///
/// Attribute
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub prime: bool,
}

///
/// AttributeCatalog
///
/// Append-only attribute table with a name index.
/// Populated during load and read-only once normalization starts.
///

#[derive(Clone, Debug, Default)]
pub struct AttributeCatalog {
    attributes: Vec<Attribute>,
    index: HashMap<String, AttributeId>,
    policy: DuplicatePolicy,
}

impl AttributeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Append a non-prime attribute and return its stable id.
    pub fn insert(&mut self, name: impl Into<String>) -> Result<AttributeId, CatalogError> {
        let name = name.into();

        if self.policy == DuplicatePolicy::Reject && self.index.contains_key(&name) {
            return Err(CatalogError::DuplicateAttribute { name });
        }

        let id = u32::try_from(self.attributes.len())
            .map(AttributeId::new)
            .map_err(|_| CatalogError::CapacityExceeded { table: "attribute" })?;
        self.attributes.push(Attribute {
            name: name.clone(),
            prime: false,
        });
        self.index.insert(name, id);

        Ok(id)
    }

    /// Resolve an attribute name to its id.
    pub fn look_up(&self, name: &str) -> Result<AttributeId, CatalogError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::AttributeNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a list of names into a set, failing on the first unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<AttributeSet, CatalogError> {
        names.iter().map(|name| self.look_up(name.as_ref())).collect()
    }

    /// Flag every given attribute as prime. Unknown ids are ignored.
    pub fn mark_prime<'a>(&mut self, ids: impl IntoIterator<Item = &'a AttributeId>) {
        for id in ids {
            if let Some(attribute) = self.attributes.get_mut(id.as_usize()) {
                attribute.prime = true;
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(id.as_usize())
    }

    #[must_use]
    pub fn name(&self, id: AttributeId) -> Option<&str> {
        self.get(id).map(|attribute| attribute.name.as_str())
    }

    #[must_use]
    pub fn is_prime(&self, id: AttributeId) -> bool {
        self.get(id).is_some_and(|attribute| attribute.prime)
    }

    #[must_use]
    pub fn contains(&self, id: AttributeId) -> bool {
        id.as_usize() < self.attributes.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate attributes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &Attribute)> {
        (0..)
            .zip(&self.attributes)
            .map(|(index, attribute)| (AttributeId::new(index), attribute))
    }

    /// The universal attribute set.
    #[must_use]
    pub fn all(&self) -> AttributeSet {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Render attribute names for a set, in id order.
    #[must_use]
    pub fn names(&self, set: &AttributeSet) -> Vec<&str> {
        set.iter().filter_map(|id| self.name(*id)).collect()
    }
}
