//! Shared mocks for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use pulseboard_domain::{FieldMap, FieldValue, SourceError, SourceSpec};
use pulseboard_ports::{CredentialProvider, TelemetrySource};

pub fn fields(entries: &[(&str, f64)]) -> FieldMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), FieldValue::Number(*value)))
        .collect()
}

pub fn spec(name: &str, defaults: FieldMap, timeout: Duration) -> SourceSpec {
    SourceSpec {
        name: name.to_string(),
        defaults,
        timeout,
    }
}

#[derive(Clone)]
pub struct MockCall {
    pub delay: Duration,
    pub result: Result<FieldMap, SourceError>,
}

/// Scripted telemetry source: consumes queued calls in order, then repeats
/// the fallback. Delays run on the (usually paused) tokio clock.
pub struct MockSource {
    name: String,
    queued: Mutex<VecDeque<MockCall>>,
    fallback: MockCall,
    pub fetch_count: AtomicU64,
}

impl MockSource {
    pub fn returning(name: &str, result: Result<FieldMap, SourceError>) -> Self {
        Self::with_delay(name, result, Duration::ZERO)
    }

    pub fn with_delay(
        name: &str,
        result: Result<FieldMap, SourceError>,
        delay: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            queued: Mutex::new(VecDeque::new()),
            fallback: MockCall { delay, result },
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Script an extra call ahead of the fallback behavior.
    pub fn queue(&self, delay: Duration, result: Result<FieldMap, SourceError>) {
        self.queued
            .lock()
            .unwrap()
            .push_back(MockCall { delay, result });
    }

    pub fn fetches(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _bearer: &str) -> Result<FieldMap, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let call = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if call.delay > Duration::ZERO {
            tokio::time::sleep(call.delay).await;
        }
        call.result
    }
}

pub struct TestCredentials;

#[async_trait]
impl CredentialProvider for TestCredentials {
    async fn bearer_token(&self) -> Result<String> {
        Ok("test-token".into())
    }
}

pub struct FailingCredentials;

#[async_trait]
impl CredentialProvider for FailingCredentials {
    async fn bearer_token(&self) -> Result<String> {
        anyhow::bail!("credential store unavailable")
    }
}
