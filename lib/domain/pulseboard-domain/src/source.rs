//! Source descriptors, per-source statuses, and the failure taxonomy.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::{FieldMap, Snapshot};

/// Static description of one telemetry source: its declared field namespace
/// (the keys of `defaults`), the fallback values substituted when the source
/// fails, and its individual fetch timeout. Created once at startup.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub name: String,
    pub defaults: FieldMap,
    pub timeout: Duration,
}

/// Why a source fetch failed. Normalized at the aggregator boundary into
/// "defaults applied, reason recorded"; never propagated to the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("source timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl SourceError {
    pub fn outcome(&self) -> SourceOutcome {
        match self {
            SourceError::Timeout => SourceOutcome::Timeout,
            SourceError::Transport(_) => SourceOutcome::Error,
            SourceError::Unauthorized => SourceOutcome::Unauthorized,
            SourceError::MalformedPayload(_) => SourceOutcome::Malformed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOutcome {
    Ok,
    Timeout,
    Error,
    Unauthorized,
    Malformed,
}

/// Outcome of one source within one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub outcome: SourceOutcome,
    pub latency_ms: u64,
    pub reason: Option<String>,
}

impl SourceStatus {
    pub fn ok(latency_ms: u64) -> Self {
        Self {
            outcome: SourceOutcome::Ok,
            latency_ms,
            reason: None,
        }
    }

    pub fn failed(error: &SourceError, latency_ms: u64) -> Self {
        Self {
            outcome: error.outcome(),
            latency_ms,
            reason: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == SourceOutcome::Ok
    }
}

/// Result of one full aggregation cycle. `measured_fields` names the fields
/// that came back from a successful fetch rather than from defaults, so the
/// scheduler can re-seed smoothed metrics only from real measurements.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub snapshot: Snapshot,
    pub per_source: BTreeMap<String, SourceStatus>,
    pub measured_fields: BTreeSet<String>,
    pub total_latency_ms: u64,
}

impl AggregationResult {
    /// True when no source produced a real measurement.
    pub fn all_failed(&self) -> bool {
        !self.per_source.is_empty() && self.per_source.values().all(|status| !status.is_ok())
    }
}
