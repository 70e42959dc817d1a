//! Engine lifecycle: Init -> Running -> Stopping -> Stopped.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use pulseboard_domain::{DashboardConfig, FieldValue, Metric};
use pulseboard_ports::CredentialProvider;

use crate::aggregator::Aggregator;
use crate::error::EngineError;
use crate::scheduler::{Scheduler, SchedulerCore};
use crate::sources::SourceSet;
use crate::store::ViewStore;

enum LifecycleState {
    Init,
    Running(Scheduler),
    Stopping,
    Stopped,
}

/// Owns the store and the scheduler for one dashboard instance. Multiple
/// runtimes can coexist; nothing here is global. `Stopped` is terminal, so a
/// new run requires a fresh instance.
pub struct EngineRuntime {
    sources: Arc<SourceSet>,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<ViewStore>,
    metrics: BTreeMap<String, Metric>,
    full_refresh_period: Duration,
    smoothing_period: Duration,
    rng_seed: Option<u64>,
    state: Mutex<LifecycleState>,
}

impl EngineRuntime {
    pub fn new(
        config: DashboardConfig,
        sources: SourceSet,
        credentials: Arc<dyn CredentialProvider>,
    ) -> anyhow::Result<Self> {
        Self::build(config, sources, credentials, None)
    }

    /// Deterministic variant: the smoothing walk draws from a generator
    /// seeded with `seed` instead of entropy.
    pub fn seeded(
        config: DashboardConfig,
        sources: SourceSet,
        credentials: Arc<dyn CredentialProvider>,
        seed: u64,
    ) -> anyhow::Result<Self> {
        Self::build(config, sources, credentials, Some(seed))
    }

    fn build(
        config: DashboardConfig,
        sources: SourceSet,
        credentials: Arc<dyn CredentialProvider>,
        rng_seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let metrics: BTreeMap<String, Metric> = config
            .metrics
            .iter()
            .map(|(name, metric_config)| (name.clone(), metric_config.to_metric()))
            .collect();

        // Seed the store with every declared field: source defaults first,
        // then metric initial values (metrics own their fields between
        // refreshes).
        let mut seed_fields = sources.default_fields();
        for (name, metric) in &metrics {
            seed_fields.insert(name.clone(), FieldValue::Number(metric.value()));
        }
        let store = Arc::new(ViewStore::new(seed_fields, config.stale_after()));

        Ok(Self {
            sources: Arc::new(sources),
            credentials,
            store,
            metrics,
            full_refresh_period: config.full_refresh_period(),
            smoothing_period: config.smoothing_period(),
            rng_seed,
            state: Mutex::new(LifecycleState::Init),
        })
    }

    pub fn store(&self) -> Arc<ViewStore> {
        self.store.clone()
    }

    /// Start both periodic tasks. Must be called from within a tokio
    /// runtime. Fails on double start and after stop.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().expect("lifecycle lock poisoned");
        match *state {
            LifecycleState::Init => {}
            LifecycleState::Running(_) => return Err(EngineError::AlreadyRunning),
            LifecycleState::Stopping | LifecycleState::Stopped => return Err(EngineError::Stopped),
        }

        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let core = Arc::new(SchedulerCore::new(
            self.store.clone(),
            Aggregator::new(self.sources.clone()),
            self.credentials.clone(),
            self.metrics.clone(),
            rng,
        ));
        *state = LifecycleState::Running(Scheduler::start(
            core,
            self.full_refresh_period,
            self.smoothing_period,
        ));
        info!(
            "engine started: {} sources, {} smoothed metrics",
            self.sources.len(),
            self.metrics.len()
        );
        Ok(())
    }

    /// Cancel both tasks and wait for them to finish. Once this returns, no
    /// further store writes occur, even from fetches dispatched earlier.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let scheduler = {
            let mut state = self.state.lock().expect("lifecycle lock poisoned");
            match std::mem::replace(&mut *state, LifecycleState::Stopping) {
                LifecycleState::Running(scheduler) => scheduler,
                LifecycleState::Init => {
                    *state = LifecycleState::Init;
                    return Err(EngineError::NotRunning);
                }
                LifecycleState::Stopping => return Err(EngineError::NotRunning),
                LifecycleState::Stopped => {
                    *state = LifecycleState::Stopped;
                    return Err(EngineError::Stopped);
                }
            }
        };

        scheduler.shutdown().await;
        *self.state.lock().expect("lifecycle lock poisoned") = LifecycleState::Stopped;
        info!("engine stopped");
        Ok(())
    }
}
