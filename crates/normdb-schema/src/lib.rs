//! Schema sources: turn a text or JSON schema description into a loaded
//! `normdb_core::Database`.

pub mod json;
pub mod text;

use normdb_core::{Database, config::NormalizeConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tracing::debug;

// re-exports
pub use json::JsonSource;
pub use text::TextSource;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("core error: {0}")]
    Core(#[from] normdb_core::Error),

    #[error("schema ended before the {expected} line")]
    Incomplete { expected: &'static str },

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl SchemaError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

///
/// DependencyDef
/// One FD by attribute name.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DependencyDef {
    pub lhs: Vec<String>,
    pub rhs: Vec<String>,
}

///
/// SchemaDef
///
/// Format-neutral schema: database name, ordered attribute names and FDs.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SchemaDef {
    pub name: String,
    pub attributes: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencyDef>,
}

impl SchemaDef {
    /// Insert every attribute, then every FD, into `db`.
    /// Stops at the first unknown or rejected name.
    pub fn load_into(&self, db: &mut Database) -> Result<(), SchemaError> {
        db.set_name(self.name.as_str());

        for name in &self.attributes {
            db.insert_attribute(name.as_str())?;
        }
        for fd in &self.dependencies {
            db.insert_dependency(fd.lhs.as_slice(), fd.rhs.as_slice())?;
        }

        debug!(
            database = %self.name,
            attributes = self.attributes.len(),
            dependencies = self.dependencies.len(),
            "schema loaded"
        );

        Ok(())
    }

    /// Build a fresh database configured by `config`.
    pub fn into_database(self, config: NormalizeConfig) -> Result<Database, SchemaError> {
        let mut db = Database::with_config(self.name.as_str(), config);
        self.load_into(&mut db)?;

        Ok(db)
    }
}

///
/// SchemaSource
///
/// Anything that can produce a `SchemaDef`.
///

pub trait SchemaSource {
    fn read_schema(&self) -> Result<SchemaDef, SchemaError>;

    /// Read the schema and load it into a new database.
    fn load(&self, config: NormalizeConfig) -> Result<Database, SchemaError> {
        self.read_schema()?.into_database(config)
    }
}

/// Open `path` with the source matching its extension: `.json` is JSON,
/// anything else is the line-oriented text format.
pub fn open(path: impl AsRef<Path>) -> Result<Box<dyn SchemaSource>, SchemaError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(Box::new(JsonSource::from_path(path)?))
    } else {
        Ok(Box::new(TextSource::from_path(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normdb_core::catalog::{CatalogError, DuplicatePolicy};

    fn def() -> SchemaDef {
        SchemaDef {
            name: "emp".to_string(),
            attributes: vec!["A".into(), "B".into(), "C".into()],
            dependencies: vec![DependencyDef {
                lhs: vec!["A".into()],
                rhs: vec!["B".into(), "C".into()],
            }],
        }
    }

    #[test]
    fn into_database_loads_everything() {
        let db = def().into_database(NormalizeConfig::default()).unwrap();

        assert_eq!(db.name(), "emp");
        assert_eq!(db.catalog().len(), 3);
        assert_eq!(db.dependencies().len(), 1);
    }

    #[test]
    fn unknown_name_surfaces_core_error() {
        let mut schema = def();
        schema.dependencies[0].rhs.push("Z".into());

        let err = schema.into_database(NormalizeConfig::default()).unwrap_err();

        assert!(matches!(
            err,
            SchemaError::Core(normdb_core::Error::Catalog(CatalogError::AttributeNotFound { .. }))
        ));
    }

    #[test]
    fn reject_policy_is_applied() {
        let mut schema = def();
        schema.attributes.push("A".into());
        let config = NormalizeConfig {
            duplicate_attributes: DuplicatePolicy::Reject,
            ..NormalizeConfig::default()
        };

        assert!(schema.into_database(config).is_err());
    }
}
