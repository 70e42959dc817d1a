//! Aggregation-and-smoothing engine behind the pulseboard dashboard.
//!
//! The engine fans fetches out to independent telemetry sources, isolates
//! per-source failures behind configured defaults, merges results into one
//! always-populated snapshot, and animates registered metrics with a bounded
//! random walk between real samples. Two periodic tasks (full refresh and
//! smoothing) run under a single cancellation token owned by the lifecycle.

pub mod aggregator;
pub mod error;
pub mod lifecycle;
pub mod scheduler;
pub mod smoother;
pub mod sources;
pub mod store;

pub use aggregator::Aggregator;
pub use error::EngineError;
pub use lifecycle::EngineRuntime;
pub use sources::{SourceEntry, SourceSet};
pub use store::ViewStore;

#[cfg(test)]
mod testing;
