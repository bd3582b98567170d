//! Line-oriented schema format.
//!
//! ```text
//! # comment
//! employees
//! Emp,Dept,Manager
//! Emp->Dept
//! Dept->Manager
//! ```
//!
//! Blank lines and `#` comments are skipped. The first remaining line names
//! the database, the second lists the attributes, every further line is one
//! FD of the form `A,B->C,D`.

use crate::{DependencyDef, SchemaDef, SchemaError, SchemaSource};
use std::{fs, path::Path};
use tracing::trace;

///
/// TextSource
///

#[derive(Clone, Debug)]
pub struct TextSource {
    text: String,
}

impl TextSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| SchemaError::io(path, err))?;

        Ok(Self::new(text))
    }
}

impl SchemaSource for TextSource {
    fn read_schema(&self) -> Result<SchemaDef, SchemaError> {
        let mut lines = self
            .text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (_, name) = lines
            .next()
            .ok_or(SchemaError::Incomplete { expected: "database name" })?;
        let (line, attributes) = lines
            .next()
            .ok_or(SchemaError::Incomplete { expected: "attribute list" })?;
        let attributes = parse_names(attributes, line)?;

        let dependencies = lines
            .map(|(line, text)| parse_dependency(text, line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SchemaDef {
            name: name.to_string(),
            attributes,
            dependencies,
        })
    }
}

// Comma-separated, whitespace-trimmed, non-empty names.
fn parse_names(list: &str, line: usize) -> Result<Vec<String>, SchemaError> {
    list.split(',')
        .map(str::trim)
        .map(|name| {
            if name.is_empty() {
                Err(SchemaError::parse(line, "empty attribute name"))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

fn parse_dependency(text: &str, line: usize) -> Result<DependencyDef, SchemaError> {
    let Some(dash) = text.find('-') else {
        return Err(SchemaError::parse(line, "Expected '->'"));
    };

    let (lhs, rest) = text.split_at(dash);
    let rhs = match rest[1..].chars().next() {
        Some('>') => &rest[2..],
        Some(other) => {
            return Err(SchemaError::parse(
                line,
                format!("Expected '>' but got '{other}'"),
            ));
        }
        None => {
            return Err(SchemaError::parse(
                line,
                "Expected '>' but reached end of line",
            ));
        }
    };
    if rhs.contains('-') {
        return Err(SchemaError::parse(line, "more than one '->'"));
    }

    let dependency = DependencyDef {
        lhs: parse_names(lhs, line)?,
        rhs: parse_names(rhs, line)?,
    };
    trace!(line, lhs = ?dependency.lhs, rhs = ?dependency.rhs, "parsed dependency");

    Ok(dependency)
}
