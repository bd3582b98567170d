//! Human and JSON presentation of a normalized database.

use normdb_core::{
    Database, attribute::AttributeSet, catalog::AttributeCatalog, relation::Relation,
};
use serde::Serialize;
use std::fmt;

const RULE: &str = "========================================";

///
/// Report
///
/// Owned snapshot of everything the presenter prints.
///

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub name: String,
    pub normal_form: String,
    pub attributes: Vec<AttributeRow>,
    pub dependencies: Vec<DependencyRow>,
    pub relations: Vec<RelationRow>,
}

///
/// AttributeRow
///

#[derive(Clone, Debug, Serialize)]
pub struct AttributeRow {
    pub name: String,
    pub prime: bool,
}

///
/// DependencyRow
///

#[derive(Clone, Debug, Serialize)]
pub struct DependencyRow {
    pub lhs: Vec<String>,
    pub rhs: Vec<String>,
}

///
/// RelationRow
///

#[derive(Clone, Debug, Serialize)]
pub struct RelationRow {
    pub name: String,
    pub attributes: Vec<String>,
    pub primary_key: Vec<String>,
    pub candidate_keys: Vec<Vec<String>>,
    pub closure: Vec<DependencyRow>,
}

impl Report {
    #[must_use]
    pub fn from_database(db: &Database) -> Self {
        let catalog = db.catalog();

        Self {
            name: db.name().to_string(),
            normal_form: db.normal_form().to_string(),
            attributes: catalog
                .iter()
                .map(|(_, attribute)| AttributeRow {
                    name: attribute.name.clone(),
                    prime: attribute.prime,
                })
                .collect(),
            dependencies: db
                .dependencies()
                .iter()
                .map(|(_, fd)| DependencyRow {
                    lhs: names(catalog, &fd.lhs),
                    rhs: names(catalog, &fd.rhs),
                })
                .collect(),
            relations: db
                .relations()
                .iter()
                .map(|relation| relation_row(db, relation))
                .collect(),
        }
    }
}

fn names(catalog: &AttributeCatalog, set: &AttributeSet) -> Vec<String> {
    catalog.names(set).into_iter().map(str::to_string).collect()
}

fn relation_row(db: &Database, relation: &Relation) -> RelationRow {
    let catalog = db.catalog();

    RelationRow {
        name: relation.name.clone(),
        attributes: names(catalog, &relation.attributes),
        primary_key: names(catalog, &relation.primary_key),
        candidate_keys: relation
            .candidate_keys
            .iter()
            .map(|key| names(catalog, key))
            .collect(),
        closure: relation
            .closure
            .iter()
            .map(|entry| DependencyRow {
                lhs: db
                    .dependencies()
                    .get(entry.source)
                    .map(|fd| names(catalog, &fd.lhs))
                    .unwrap_or_default(),
                rhs: names(catalog, &entry.closure),
            })
            .collect(),
    }
}

///
/// Braced
/// `{ A, B }` rendering of a name list.
///

struct Braced<'a>(&'a [String]);

impl fmt::Display for Braced<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{}");
        }

        write!(f, "{{ {} }}", self.0.join(", "))
    }
}

impl fmt::Display for DependencyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", Braced(&self.lhs), Braced(&self.rhs))
    }
}

impl fmt::Display for RelationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}\n{}\n{RULE}", self.name)?;
        writeln!(f, "\nAttributes:\n{}", Braced(&self.attributes))?;
        writeln!(f, "\nPrimary Key:\n{}", Braced(&self.primary_key))?;

        writeln!(f, "\nCandidate Keys:")?;
        for key in &self.candidate_keys {
            writeln!(f, "{}", Braced(key))?;
        }

        writeln!(f, "\nClosure:")?;
        for entry in &self.closure {
            writeln!(f, "{entry}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database: {}", self.name)?;
        writeln!(f, "Normal form: {}", self.normal_form)?;

        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|attribute| {
                if attribute.prime {
                    format!("{} : *prime*", attribute.name)
                } else {
                    attribute.name.clone()
                }
            })
            .collect();
        writeln!(f, "\nAttributes:\n{}", Braced(&attributes))?;

        writeln!(f, "\nFunctional Dependencies:")?;
        for fd in &self.dependencies {
            writeln!(f, "{fd}")?;
        }

        writeln!(f, "\nDecomposed Relations:\n")?;
        for relation in &self.relations {
            writeln!(f, "{relation}")?;
        }

        Ok(())
    }
}
