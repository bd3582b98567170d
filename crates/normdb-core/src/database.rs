//! Database aggregate: load-time mutators and the normalization entry point.

use crate::{
    attribute::AttributeId,
    catalog::{AttributeCatalog, CatalogError, DuplicatePolicy},
    closure::ClosureEngine,
    config::NormalizeConfig,
    dependency::{FdId, FunctionalDependencySet},
    error::Error,
    key::KeyDeriver,
    normal_form::NormalForm,
    obs::sink::{GLOBAL_METRICS_SINK, MetricsSink, NormalizeEvent},
    relation::{GLOBAL_RELATION_NAME, Relation, RelationTable},
    scheduler::{NormalizationScheduler, RelationNamer},
};
use std::fmt;
use tracing::{debug, info};

///
/// Database
///
/// Owns the catalog, the FD table and the normalized relation table.
/// The catalog and FD table are frozen once the global relation exists;
/// later load-time calls fail with `CatalogError::Frozen`.
///

pub struct Database {
    name: String,
    catalog: AttributeCatalog,
    dependencies: FunctionalDependencySet,
    normal_form: NormalForm,
    relations: RelationTable,
    namer: RelationNamer,
    config: NormalizeConfig,
    metrics: Option<&'static dyn MetricsSink>,
}

impl Database {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, NormalizeConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: NormalizeConfig) -> Self {
        Self {
            name: name.into(),
            catalog: AttributeCatalog::with_policy(config.duplicate_attributes),
            dependencies: FunctionalDependencySet::new(),
            normal_form: NormalForm::First,
            relations: RelationTable::new(),
            namer: RelationNamer::new(),
            config,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_policy(name: impl Into<String>, policy: DuplicatePolicy) -> Self {
        Self::with_config(
            name,
            NormalizeConfig {
                duplicate_attributes: policy,
                ..NormalizeConfig::default()
            },
        )
    }

    /// Route this database's events to `sink` instead of the global counters.
    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    fn sink(&self) -> &'static dyn MetricsSink {
        self.metrics.unwrap_or(&GLOBAL_METRICS_SINK)
    }

    fn ensure_loading(&self) -> Result<(), CatalogError> {
        if self.relations.is_empty() && self.normal_form == NormalForm::First {
            Ok(())
        } else {
            Err(CatalogError::Frozen)
        }
    }

    // ---------------------------------------------------------------------
    // Load phase
    // ---------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn insert_attribute(&mut self, name: impl Into<String>) -> Result<AttributeId, Error> {
        self.ensure_loading()?;

        Ok(self.catalog.insert(name)?)
    }

    /// Resolve and append an FD. Nothing is stored if any name is unknown.
    pub fn insert_dependency<L, R>(&mut self, lhs: &[L], rhs: &[R]) -> Result<FdId, Error>
    where
        L: AsRef<str>,
        R: AsRef<str>,
    {
        self.ensure_loading()?;

        Ok(self.dependencies.insert(&self.catalog, lhs, rhs)?)
    }

    /// Build the relation spanning the whole catalog, derive its closure and
    /// key, and mark its key attributes prime. Seeds the relation table, so
    /// it runs at most once per database.
    pub fn generate_global_relation(&mut self) -> Result<&Relation, Error> {
        self.ensure_loading()?;

        let mut global = Relation::new(GLOBAL_RELATION_NAME, self.catalog.all());

        let summary = ClosureEngine::new(&self.catalog, &self.dependencies).compute(&mut global)?;
        self.sink().record(NormalizeEvent::ClosureComputed {
            entries: summary.entries,
            candidate_keys: summary.candidate_keys,
        });
        KeyDeriver::assign_primary_key(&mut global)?;
        KeyDeriver::mark_prime_attributes(&mut self.catalog, &global)?;

        debug!(
            database = %self.name,
            attributes = global.attributes.len(),
            key = ?self.catalog.names(&global.primary_key),
            "global relation generated"
        );

        self.relations = RelationTable::from(vec![global]);

        Ok(&self.relations[0])
    }

    // ---------------------------------------------------------------------
    // Normalization
    // ---------------------------------------------------------------------

    /// Normalize using the configured target and worker count.
    pub fn normalize_configured(&mut self) -> Result<(), Error> {
        self.normalize(self.config.target, self.config.max_workers)
    }

    /// Run every level between the current marker and `target`.
    ///
    /// A target at or below the current marker is a no-op. On failure the
    /// relation table and marker stay at the last completed level.
    pub fn normalize(&mut self, target: NormalForm, max_workers: usize) -> Result<(), Error> {
        if target <= self.normal_form {
            debug!(
                database = %self.name,
                current = %self.normal_form,
                target = %target,
                "normal form already reached"
            );
            return Ok(());
        }

        if self.relations.is_empty() {
            self.generate_global_relation()?;
        }

        for level in self.normal_form.levels_to(target) {
            let seed = self.relations.to_vec();
            let table = NormalizationScheduler::new(
                &self.catalog,
                &self.dependencies,
                &self.namer,
                self.sink(),
                max_workers,
            )
            .run(level, seed)?;

            self.relations = table;
            self.normal_form = level;
        }

        info!(
            database = %self.name,
            form = %self.normal_form,
            relations = self.relations.len(),
            "normalization complete"
        );

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn dependencies(&self) -> &FunctionalDependencySet {
        &self.dependencies
    }

    #[must_use]
    pub const fn relations(&self) -> &RelationTable {
        &self.relations
    }

    #[must_use]
    pub const fn normal_form(&self) -> NormalForm {
        self.normal_form
    }

    #[must_use]
    pub const fn config(&self) -> &NormalizeConfig {
        &self.config
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("normal_form", &self.normal_form)
            .field("catalog", &self.catalog)
            .field("dependencies", &self.dependencies)
            .field("relations", &self.relations)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
