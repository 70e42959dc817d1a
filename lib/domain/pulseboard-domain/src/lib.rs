//! Domain models and invariants for the pulseboard dashboard engine.

pub mod config;
pub mod metric;
pub mod snapshot;
pub mod source;

pub use config::{DashboardConfig, MetricConfig, SourceConfig};
pub use metric::{Metric, MetricBounds};
pub use snapshot::{FieldMap, FieldValue, Snapshot, now_millis};
pub use source::{AggregationResult, SourceError, SourceOutcome, SourceSpec, SourceStatus};
