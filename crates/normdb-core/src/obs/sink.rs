//! Metrics sink boundary.
//!
//! All instrumentation flows through NormalizeEvent and MetricsSink.
//! This module is the only bridge between engine logic and the global
//! counter state.

use crate::obs::metrics;

///
/// NormalizeEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum NormalizeEvent {
    ClosureComputed { entries: u64, candidate_keys: u64 },
    LevelFinish { relations: u64 },
    LevelStart,
    RelationFinalized,
    RelationProcessed,
    RelationSplit { children: u64, moved: u64 },
}

///
/// MetricsSink
///
/// Shared by every worker of a normalization level.
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: NormalizeEvent);
}

///
/// GlobalMetricsSink
/// Default process-wide sink writing into the global counter state.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: NormalizeEvent) {
        metrics::with_state_mut(|m| match event {
            NormalizeEvent::ClosureComputed {
                entries,
                candidate_keys,
            } => {
                m.ops.closures_computed = m.ops.closures_computed.saturating_add(1);
                m.ops.closure_entries = m.ops.closure_entries.saturating_add(entries);
                m.ops.candidate_keys = m.ops.candidate_keys.saturating_add(candidate_keys);
            }

            NormalizeEvent::LevelFinish { relations } => {
                m.ops.levels_finished = m.ops.levels_finished.saturating_add(1);
                m.ops.last_level_relations = relations;
            }

            NormalizeEvent::LevelStart => {
                m.ops.levels_started = m.ops.levels_started.saturating_add(1);
            }

            NormalizeEvent::RelationFinalized => {
                m.ops.relations_finalized = m.ops.relations_finalized.saturating_add(1);
            }

            NormalizeEvent::RelationProcessed => {
                m.ops.relations_processed = m.ops.relations_processed.saturating_add(1);
            }

            NormalizeEvent::RelationSplit { children, moved } => {
                m.ops.relations_split = m.ops.relations_split.saturating_add(1);
                m.ops.children_produced = m.ops.children_produced.saturating_add(children);
                m.ops.attributes_moved = m.ops.attributes_moved.saturating_add(moved);
            }
        });
    }
}

///
/// NoopMetricsSink
/// Discards every event.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _event: NormalizeEvent) {}
}

pub(crate) static GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Snapshot the current global counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the global counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}
