//! Engine configuration, loadable from YAML.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::metric::{Metric, MetricBounds};
use crate::snapshot::FieldMap;
use crate::source::SourceSpec;

const DEFAULT_FULL_REFRESH_PERIOD_MS: u64 = 30_000;
const DEFAULT_SMOOTHING_PERIOD_MS: u64 = 10_000;
const DEFAULT_PER_SOURCE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STALE_AFTER_MS: u64 = 90_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub full_refresh_period_ms: u64,
    pub smoothing_period_ms: u64,
    pub per_source_timeout_ms: u64,
    pub stale_after_ms: u64,
    pub sources: Vec<SourceConfig>,
    pub metrics: BTreeMap<String, MetricConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            full_refresh_period_ms: DEFAULT_FULL_REFRESH_PERIOD_MS,
            smoothing_period_ms: DEFAULT_SMOOTHING_PERIOD_MS,
            per_source_timeout_ms: DEFAULT_PER_SOURCE_TIMEOUT_MS,
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            sources: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub defaults: FieldMap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricConfig {
    pub min: f64,
    pub max: f64,
    pub max_step: f64,
    pub initial: f64,
}

impl MetricConfig {
    pub fn to_metric(&self) -> Metric {
        Metric::new(
            self.initial,
            MetricBounds {
                min: self.min,
                max: self.max,
            },
            self.max_step,
        )
    }
}

impl DashboardConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.full_refresh_period_ms == 0 {
            bail!("full_refresh_period_ms must be positive");
        }
        if self.smoothing_period_ms == 0 {
            bail!("smoothing_period_ms must be positive");
        }
        if self.per_source_timeout_ms == 0 {
            bail!("per_source_timeout_ms must be positive");
        }
        let mut seen = BTreeSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                bail!("source name must not be empty");
            }
            if !seen.insert(source.name.as_str()) {
                bail!("duplicate source name: {}", source.name);
            }
        }
        for (name, metric) in &self.metrics {
            if metric.min > metric.max {
                bail!("metric {name}: min must not exceed max");
            }
            if metric.max_step < 0.0 {
                bail!("metric {name}: max_step must not be negative");
            }
        }
        Ok(())
    }

    pub fn full_refresh_period(&self) -> Duration {
        Duration::from_millis(self.full_refresh_period_ms)
    }

    pub fn smoothing_period(&self) -> Duration {
        Duration::from_millis(self.smoothing_period_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Descriptor for one configured source, applying the global timeout
    /// unless the source overrides it.
    pub fn source_spec(&self, source: &SourceConfig) -> SourceSpec {
        SourceSpec {
            name: source.name.clone(),
            defaults: source.defaults.clone(),
            timeout: Duration::from_millis(
                source.timeout_ms.unwrap_or(self.per_source_timeout_ms),
            ),
        }
    }
}
