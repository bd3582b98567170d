//! Observability: normalization counters and the sink abstraction.
//!
//! Engine code records `NormalizeEvent`s through a `MetricsSink` and never
//! touches the global counter state directly.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{
    GlobalMetricsSink, MetricsSink, NoopMetricsSink, NormalizeEvent, metrics_report,
    metrics_reset_all,
};
