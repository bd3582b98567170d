use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// NormalForm
///
/// Ordered normal-form marker: 1NF < 2NF < 3NF < BCNF.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum NormalForm {
    #[default]
    #[display("1NF")]
    #[serde(rename = "1nf")]
    First,

    #[display("2NF")]
    #[serde(rename = "2nf")]
    Second,

    #[display("3NF")]
    #[serde(rename = "3nf")]
    Third,

    #[display("BCNF")]
    #[serde(rename = "bcnf")]
    Bcnf,
}

impl NormalForm {
    /// The next stricter form, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::First => Some(Self::Second),
            Self::Second => Some(Self::Third),
            Self::Third => Some(Self::Bcnf),
            Self::Bcnf => None,
        }
    }

    /// Levels that must run, in order, to move from `self` to `target`.
    #[must_use]
    pub fn levels_to(self, target: Self) -> Vec<Self> {
        let mut levels = Vec::new();
        let mut current = self;

        while current < target {
            let Some(next) = current.next() else {
                break;
            };
            levels.push(next);
            current = next;
        }

        levels
    }
}
