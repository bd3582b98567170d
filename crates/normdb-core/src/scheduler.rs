//! Queue-driven normalization to a fixpoint.
//!
//! A relation popped from the queue is owned by exactly one worker until it
//! is finalized or replaced by its children. The queue tracks in-flight
//! relations so that "empty" only means done when no worker can still push.

use crate::{
    attribute::AttributeSet,
    catalog::AttributeCatalog,
    closure::ClosureEngine,
    decompose::{DecomposeError, Decomposer, Decomposition},
    dependency::FunctionalDependencySet,
    error::{Error, InternalError},
    key::KeyDeriver,
    normal_form::NormalForm,
    obs::sink::{MetricsSink, NormalizeEvent},
    relation::{Relation, RelationStage, RelationTable},
};
use std::{
    collections::VecDeque,
    sync::{
        Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread,
};
use tracing::{debug, trace};

///
/// RelationNamer
///
/// Shared counter naming child relations `r1`, `r2`, ...
///

#[derive(Debug)]
pub struct RelationNamer {
    next: AtomicU64,
}

impl RelationNamer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Claim the next relation name.
    pub fn next_name(&self) -> String {
        let number = self.next.fetch_add(1, Ordering::Relaxed);

        format!("r{number}")
    }

    /// Number the next claimed name will carry.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for RelationNamer {
    fn default() -> Self {
        Self::new()
    }
}

///
/// Step
///
/// What happened to one relation.
///

#[derive(Debug)]
enum Step {
    Final(Relation),
    Requeue(Vec<Relation>),
}

///
/// QueueState
///

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Relation>,
    in_flight: usize,
    halted: bool,
}

///
/// NormalizationQueue
///
/// The only mutable state shared between workers.
///

#[derive(Default)]
struct NormalizationQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl NormalizationQueue {
    fn seeded(relations: Vec<Relation>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: relations.into(),
                ..QueueState::default()
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Block until work is available; `None` once quiescent or halted.
    fn pop(&self) -> Option<Relation> {
        let mut state = self.lock();

        loop {
            if state.halted {
                return None;
            }
            if let Some(relation) = state.pending.pop_front() {
                state.in_flight += 1;
                return Some(relation);
            }
            if state.in_flight == 0 {
                return None;
            }

            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // Release one in-flight relation, pushing whatever it produced.
    fn complete(&self, produced: Vec<Relation>) {
        let mut state = self.lock();
        state.pending.extend(produced);
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);

        self.ready.notify_all();
    }

    fn halt(&self) {
        self.lock().halted = true;
        self.ready.notify_all();
    }
}

///
/// HaltOnPanic
///
/// A panicking worker never completes its relation; halt so the others
/// stop waiting on it.
///

struct HaltOnPanic<'q>(&'q NormalizationQueue);

impl Drop for HaltOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.halt();
        }
    }
}

///
/// NormalizationScheduler
///
/// Drives relations through closure, key and decomposition until the queue drains.
///

pub struct NormalizationScheduler<'a> {
    catalog: &'a AttributeCatalog,
    engine: ClosureEngine<'a>,
    decomposer: Decomposer<'a>,
    sink: &'a dyn MetricsSink,
    max_workers: usize,
}

impl<'a> NormalizationScheduler<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a AttributeCatalog,
        dependencies: &'a FunctionalDependencySet,
        namer: &'a RelationNamer,
        sink: &'a dyn MetricsSink,
        max_workers: usize,
    ) -> Self {
        let engine = ClosureEngine::new(catalog, dependencies);

        Self {
            catalog,
            engine,
            decomposer: Decomposer::new(catalog, engine, namer),
            sink,
            max_workers: max_workers.max(1),
        }
    }

    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Normalize `seed` to `form`, returning every terminal relation.
    pub fn run(&self, form: NormalForm, seed: Vec<Relation>) -> Result<RelationTable, Error> {
        debug!(
            form = %form,
            seed = seed.len(),
            workers = self.max_workers,
            "normalization level start"
        );
        self.sink.record(NormalizeEvent::LevelStart);

        let table = if self.max_workers == 1 {
            self.run_inline(form, seed)?
        } else {
            self.run_pool(form, seed)?
        };

        debug!(form = %form, relations = table.len(), "normalization level finished");
        self.sink.record(NormalizeEvent::LevelFinish {
            relations: table.len() as u64,
        });

        Ok(table)
    }

    // Single worker: FIFO order, deterministic output.
    fn run_inline(&self, form: NormalForm, seed: Vec<Relation>) -> Result<RelationTable, Error> {
        let mut queue: VecDeque<Relation> = seed.into();
        let mut table = RelationTable::new();

        while let Some(relation) = queue.pop_front() {
            match self.process(form, relation)? {
                Step::Final(relation) => table.push(relation),
                Step::Requeue(produced) => queue.extend(produced),
            }
        }

        Ok(table)
    }

    // Bounded pool: workers share the queue and the output table.
    fn run_pool(&self, form: NormalForm, seed: Vec<Relation>) -> Result<RelationTable, Error> {
        let queue = NormalizationQueue::seeded(seed);
        let finished = Mutex::new(Vec::new());
        let failure = Mutex::new(None::<Error>);

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.max_workers)
                .map(|worker| {
                    let queue = &queue;
                    let finished = &finished;
                    let failure = &failure;

                    scope.spawn(move || {
                        let _guard = HaltOnPanic(queue);

                        while let Some(relation) = queue.pop() {
                            match self.process(form, relation) {
                                Ok(Step::Final(relation)) => {
                                    finished
                                        .lock()
                                        .unwrap_or_else(PoisonError::into_inner)
                                        .push(relation);
                                    queue.complete(Vec::new());
                                }
                                Ok(Step::Requeue(produced)) => queue.complete(produced),
                                Err(err) => {
                                    trace!(worker, error = %err, "worker halting queue");
                                    let mut slot =
                                        failure.lock().unwrap_or_else(PoisonError::into_inner);
                                    if slot.is_none() {
                                        *slot = Some(err);
                                    }
                                    drop(slot);
                                    queue.halt();
                                }
                            }
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(thread::ScopedJoinHandle::join)
                .filter(Result::is_err)
                .count()
        });

        if let Some(err) = failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(err);
        }
        if panicked > 0 {
            return Err(InternalError::scheduler_internal(format!(
                "{panicked} normalization worker(s) panicked"
            ))
            .into());
        }

        Ok(finished
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into())
    }

    // Closure -> key -> decompose for one relation.
    fn process(&self, form: NormalForm, mut relation: Relation) -> Result<Step, Error> {
        if !relation.has_closure() {
            let summary = self.engine.compute(&mut relation)?;
            self.sink.record(NormalizeEvent::ClosureComputed {
                entries: summary.entries,
                candidate_keys: summary.candidate_keys,
            });
        }
        if !relation.has_key() {
            KeyDeriver::assign_primary_key(&mut relation)?;
        }
        self.sink.record(NormalizeEvent::RelationProcessed);

        let name = relation.name.clone();
        let before = relation.attributes.clone();
        let outcome = self.decomposer.decompose(form, relation)?;

        self.settle(form, name, &before, outcome)
    }

    // Turn a decomposition outcome into a queue step, rejecting malformed splits.
    fn settle(
        &self,
        form: NormalForm,
        name: String,
        before: &AttributeSet,
        outcome: Decomposition,
    ) -> Result<Step, Error> {
        match outcome {
            Decomposition::Compliant(mut relation) => {
                trace!(relation = %relation.name, form = %form, "relation is final");
                relation.stage = RelationStage::Final;
                self.sink.record(NormalizeEvent::RelationFinalized);

                Ok(Step::Final(relation))
            }
            Decomposition::Split(produced) if produced.is_empty() => {
                Err(DecomposeError::EmptyDecomposition { relation: name }.into())
            }
            Decomposition::Split(produced) => {
                self.check_lossless(&name, before, &produced)?;

                let remainder = produced[0].attributes.len();
                debug!(
                    relation = %name,
                    children = produced.len() - 1,
                    moved = before.len() - remainder,
                    "relation split"
                );
                self.sink.record(NormalizeEvent::RelationSplit {
                    children: (produced.len() - 1) as u64,
                    moved: (before.len() - remainder) as u64,
                });

                Ok(Step::Requeue(produced))
            }
        }
    }

    // Union of the produced attribute sets must be the parent, and every split must shrink.
    fn check_lossless(
        &self,
        name: &str,
        before: &AttributeSet,
        produced: &[Relation],
    ) -> Result<(), InternalError> {
        let union = produced
            .iter()
            .fold(AttributeSet::new(), |acc, relation| {
                acc.union(&relation.attributes)
            });

        if &union != before {
            let mut lost = before.clone();
            lost.subtract(&union);
            let mut extra = union;
            extra.subtract(before);

            return Err(InternalError::decompose_invariant(format!(
                "split of relation '{name}' is not lossless (lost: {:?}, extra: {:?})",
                self.catalog.names(&lost),
                self.catalog.names(&extra),
            )));
        }
        if produced
            .iter()
            .any(|relation| relation.attributes.len() >= before.len())
        {
            return Err(InternalError::decompose_invariant(format!(
                "split of relation '{name}' produced a relation that did not shrink"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, ErrorOrigin};
    use crate::obs::sink::NoopMetricsSink;

    static NOOP: NoopMetricsSink = NoopMetricsSink;

    struct Fixture {
        catalog: AttributeCatalog,
        fds: FunctionalDependencySet,
        namer: RelationNamer,
    }

    impl Fixture {
        fn new(attrs: &[&str], fds: &[(&[&str], &[&str])]) -> Self {
            let mut catalog = AttributeCatalog::new();
            for name in attrs {
                catalog.insert(*name).unwrap();
            }
            let mut table = FunctionalDependencySet::new();
            for &(lhs, rhs) in fds {
                table.insert(&catalog, lhs, rhs).unwrap();
            }

            Self {
                catalog,
                fds: table,
                namer: RelationNamer::new(),
            }
        }

        fn set(&self, names: &[&str]) -> AttributeSet {
            self.catalog.resolve(names).unwrap()
        }

        fn global(&mut self) -> Relation {
            let mut relation = Relation::new("global_relation", self.catalog.all());
            ClosureEngine::new(&self.catalog, &self.fds)
                .compute(&mut relation)
                .unwrap();
            KeyDeriver::assign_primary_key(&mut relation).unwrap();
            KeyDeriver::mark_prime_attributes(&mut self.catalog, &relation).unwrap();

            relation
        }

        fn scheduler(&self, max_workers: usize) -> NormalizationScheduler<'_> {
            NormalizationScheduler::new(&self.catalog, &self.fds, &self.namer, &NOOP, max_workers)
        }
    }

    fn attribute_sets(table: &RelationTable) -> Vec<AttributeSet> {
        let mut sets: Vec<_> = table.iter().map(|r| r.attributes.clone()).collect();
        sets.sort();

        sets
    }

    #[test]
    fn namer_counts_from_one() {
        let namer = RelationNamer::new();

        assert_eq!(namer.next_name(), "r1");
        assert_eq!(namer.next_name(), "r2");
        assert_eq!(namer.peek(), 3);
    }

    #[test]
    fn zero_workers_runs_inline() {
        let fx = Fixture::new(&["A"], &[]);

        assert_eq!(fx.scheduler(0).max_workers(), 1);
    }

    #[test]
    fn empty_split_is_an_invariant_violation() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let before = fx.catalog.all();

        let err = fx
            .scheduler(1)
            .settle(
                NormalForm::Second,
                "r7".to_string(),
                &before,
                Decomposition::Split(Vec::new()),
            )
            .unwrap_err();

        let Error::Decompose(DecomposeError::EmptyDecomposition { relation }) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(relation, "r7");
        assert_eq!(err.class(), ErrorClass::InvariantViolation);
        assert!(err.is_fatal());
    }

    #[test]
    fn split_losing_attributes_is_rejected() {
        let fx = Fixture::new(&["A", "B", "C"], &[]);
        let before = fx.catalog.all();
        let produced = vec![
            Relation::new("global_relation", fx.set(&["A", "B"])),
            Relation::new("r1", fx.set(&["A"])),
        ];

        let err = fx
            .scheduler(1)
            .settle(
                NormalForm::Second,
                "global_relation".to_string(),
                &before,
                Decomposition::Split(produced),
            )
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::InvariantViolation);
        assert_eq!(err.origin(), ErrorOrigin::Decompose);
        assert!(err.to_string().contains("not lossless"));
    }

    #[test]
    fn split_that_does_not_shrink_is_rejected() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let before = fx.catalog.all();
        let produced = vec![
            Relation::new("global_relation", before.clone()),
            Relation::new("r1", fx.set(&["A"])),
        ];

        let err = fx
            .scheduler(1)
            .settle(
                NormalForm::Third,
                "global_relation".to_string(),
                &before,
                Decomposition::Split(produced),
            )
            .unwrap_err();

        assert_eq!(err.class(), ErrorClass::InvariantViolation);
        assert!(err.to_string().contains("did not shrink"));
    }

    #[test]
    fn compliant_outcome_is_finalized() {
        let fx = Fixture::new(&["A", "B"], &[]);
        let before = fx.catalog.all();
        let relation = Relation::new("r3", before.clone());

        let step = fx
            .scheduler(1)
            .settle(
                NormalForm::Bcnf,
                "r3".to_string(),
                &before,
                Decomposition::Compliant(relation),
            )
            .unwrap();

        match step {
            Step::Final(relation) => assert_eq!(relation.stage, RelationStage::Final),
            Step::Requeue(_) => panic!("compliant relation was requeued"),
        }
    }

    #[test]
    fn pool_and_inline_produce_the_same_relations() {
        let mut fx = Fixture::new(
            &["A", "B", "C", "D", "E"],
            &[(&["A"], &["B"]), (&["B"], &["C"]), (&["D"], &["E"])],
        );
        let global = fx.global();

        let inline = fx
            .scheduler(1)
            .run(NormalForm::Second, vec![global.clone()])
            .unwrap();
        let pooled = fx
            .scheduler(4)
            .run(NormalForm::Second, vec![global])
            .unwrap();

        assert_eq!(attribute_sets(&inline), attribute_sets(&pooled));
        assert!(inline.iter().all(|r| r.stage == RelationStage::Final));
        assert!(pooled.iter().all(|r| r.stage == RelationStage::Final));
    }
}
