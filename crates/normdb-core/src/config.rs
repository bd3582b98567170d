use crate::{catalog::DuplicatePolicy, normal_form::NormalForm};
use serde::{Deserialize, Serialize};

///
/// NormalizeConfig
///
/// Load and normalization policy for one database.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub max_workers: usize,
    pub duplicate_attributes: DuplicatePolicy,
    pub target: NormalForm,
}

impl NormalizeConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_workers: 1,
            duplicate_attributes: DuplicatePolicy::Allow,
            target: NormalForm::Second,
        }
    }

    /// Worker count actually used; zero means one.
    #[must_use]
    pub const fn effective_workers(&self) -> usize {
        if self.max_workers == 0 {
            1
        } else {
            self.max_workers
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::new()
    }
}
