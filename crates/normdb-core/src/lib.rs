//! Schema normalization core: attribute catalog, functional dependencies,
//! closure and key derivation, and 2NF/3NF/BCNF decomposition driven by a
//! single- or multi-worker scheduler.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod attribute;
pub mod catalog;
pub mod closure;
pub mod config;
pub mod database;
pub mod decompose;
pub mod dependency;
pub mod error;
pub mod key;
pub mod normal_form;
pub mod obs;
pub mod relation;
pub mod scheduler;

// re-exports
pub use database::Database;
pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, engines or sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        attribute::{AttributeId, AttributeSet},
        catalog::{AttributeCatalog, DuplicatePolicy},
        config::NormalizeConfig,
        database::Database,
        dependency::{FdId, FunctionalDependency},
        normal_form::NormalForm,
        relation::{Relation, RelationStage, RelationTable},
    };
}
