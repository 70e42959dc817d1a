//! Concurrent fan-out fetch across all sources with per-source isolation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::warn;

use pulseboard_domain::{
    AggregationResult, FieldMap, Snapshot, SourceError, SourceStatus, now_millis,
};

use crate::sources::{SourceEntry, SourceSet};

/// Pure transformation from the source set to one [`AggregationResult`].
/// A run owns no persistent state and never writes the store; the scheduler
/// applies its result.
pub struct Aggregator {
    sources: Arc<SourceSet>,
}

impl Aggregator {
    pub fn new(sources: Arc<SourceSet>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Fetch every source concurrently, each bounded by its own timeout, and
    /// merge the results in declared order (later-declared source wins on
    /// field collisions). A failed source contributes its defaults and a
    /// recorded reason; it never aborts the run.
    pub async fn run(&self, bearer: &str) -> AggregationResult {
        let dispatched = Instant::now();
        let fetches = self
            .sources
            .entries()
            .iter()
            .map(|entry| fetch_one(entry, bearer));
        let outcomes = join_all(fetches).await;

        let mut fields = FieldMap::new();
        let mut measured_fields = BTreeSet::new();
        let mut per_source = BTreeMap::new();
        let mut partial = false;

        for (entry, outcome) in self.sources.entries().iter().zip(outcomes) {
            // A later-declared default knocks out an earlier source's real
            // value, so its name leaves the measured set too.
            for (name, value) in &entry.spec.defaults {
                fields.insert(name.clone(), value.clone());
                measured_fields.remove(name);
            }
            match outcome.fields {
                Some(fetched) => {
                    for name in fetched.keys() {
                        measured_fields.insert(name.clone());
                    }
                    fields.extend(fetched);
                }
                None => partial = true,
            }
            per_source.insert(entry.spec.name.clone(), outcome.status);
        }

        AggregationResult {
            snapshot: Snapshot::new(fields, now_millis(), partial),
            per_source,
            measured_fields,
            total_latency_ms: dispatched.elapsed().as_millis() as u64,
        }
    }
}

struct FetchOutcome {
    fields: Option<FieldMap>,
    status: SourceStatus,
}

async fn fetch_one(entry: &SourceEntry, bearer: &str) -> FetchOutcome {
    let started = Instant::now();
    let result = tokio::time::timeout(entry.spec.timeout, entry.source.fetch(bearer)).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(fetched)) => FetchOutcome {
            fields: Some(fetched),
            status: SourceStatus::ok(latency_ms),
        },
        Ok(Err(error)) => {
            warn!(
                "source {} failed after {}ms: {}",
                entry.spec.name, latency_ms, error
            );
            FetchOutcome {
                fields: None,
                status: SourceStatus::failed(&error, latency_ms),
            }
        }
        Err(_) => {
            warn!(
                "source {} timed out after {}ms",
                entry.spec.name, latency_ms
            );
            FetchOutcome {
                fields: None,
                status: SourceStatus::failed(&SourceError::Timeout, latency_ms),
            }
        }
    }
}
