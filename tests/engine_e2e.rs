//! End-to-end run of the engine with mixed healthy and failing sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use pulseboard::domain::{
    DashboardConfig, FieldMap, FieldValue, MetricConfig, SourceError, SourceSpec,
};
use pulseboard::ports::{CredentialProvider, TelemetrySource};
use pulseboard::{EngineRuntime, SourceSet};

struct FixedSource {
    name: String,
    result: Result<FieldMap, SourceError>,
}

#[async_trait]
impl TelemetrySource for FixedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _bearer: &str) -> Result<FieldMap, SourceError> {
        self.result.clone()
    }
}

struct FixedCredentials;

#[async_trait]
impl CredentialProvider for FixedCredentials {
    async fn bearer_token(&self) -> anyhow::Result<String> {
        Ok("e2e-token".into())
    }
}

fn number_fields(entries: &[(&str, f64)]) -> FieldMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), FieldValue::Number(*value)))
        .collect()
}

fn register(
    set: &mut SourceSet,
    name: &str,
    default: (&str, f64),
    result: Result<FieldMap, SourceError>,
) {
    set.register(
        SourceSpec {
            name: name.to_string(),
            defaults: number_fields(&[default]),
            timeout: Duration::from_secs(5),
        },
        Arc::new(FixedSource {
            name: name.to_string(),
            result,
        }),
    )
    .unwrap();
}

#[tokio::test(start_paused = true)]
async fn five_sources_with_two_permanent_failures() {
    let mut sources = SourceSet::new();
    register(
        &mut sources,
        "infra",
        ("serverHealth", 99.0),
        Ok(number_fields(&[("serverHealth", 99.6)])),
    );
    register(
        &mut sources,
        "api",
        ("apiResponseTime", 120.0),
        Ok(number_fields(&[("apiResponseTime", 84.0)])),
    );
    register(
        &mut sources,
        "users",
        ("activeUsers", 0.0),
        Ok(number_fields(&[("activeUsers", 1423.0)])),
    );
    register(
        &mut sources,
        "queue",
        ("queueDepth", -1.0),
        Err(SourceError::Transport("status 500".into())),
    );
    register(
        &mut sources,
        "batch",
        ("batchLag", -1.0),
        Err(SourceError::Transport("status 503".into())),
    );

    // Smoothing period chosen so no smoothing tick lands on the full refresh
    // at 30s.
    let mut config = DashboardConfig {
        full_refresh_period_ms: 30_000,
        smoothing_period_ms: 7_000,
        ..DashboardConfig::default()
    };
    config.metrics.insert(
        "serverHealth".into(),
        MetricConfig {
            min: 95.0,
            max: 100.0,
            max_step: 1.0,
            initial: 99.8,
        },
    );

    let runtime = EngineRuntime::seeded(config, sources, Arc::new(FixedCredentials), 11).unwrap();
    let store = runtime.store();

    runtime.start().unwrap();
    sleep(Duration::from_millis(31_000)).await;
    runtime.stop().await.unwrap();

    let snapshot = store.get();
    // Healthy sources show their real values, failed ones their defaults.
    assert_eq!(
        snapshot.field("apiResponseTime"),
        Some(&FieldValue::Number(84.0))
    );
    assert_eq!(snapshot.field("activeUsers"), Some(&FieldValue::Number(1423.0)));
    assert_eq!(snapshot.field("queueDepth"), Some(&FieldValue::Number(-1.0)));
    assert_eq!(snapshot.field("batchLag"), Some(&FieldValue::Number(-1.0)));

    // The refresh at 30s measured serverHealth for real; the next smoothing
    // tick (35s) never ran before the stop at 31s.
    assert_eq!(snapshot.field("serverHealth"), Some(&FieldValue::Number(99.6)));

    assert!(snapshot.partial, "two sources fell back to defaults");
    assert!(!store.stale(), "a partially successful refresh is not stale");
}
