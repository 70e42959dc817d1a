//! The two periodic tasks: full refresh and smoothing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use pulseboard_domain::{AggregationResult, FieldMap, FieldValue, Metric, now_millis};
use pulseboard_ports::CredentialProvider;

use crate::aggregator::Aggregator;
use crate::smoother;
use crate::store::ViewStore;

/// Every store write funnels through this gate. It serializes publishes,
/// enforces the freshness rule (publication order follows cycle start time),
/// and drops anything arriving after shutdown.
struct PublishGate {
    latest_full_start: Option<Instant>,
    closed: bool,
}

pub(crate) struct SchedulerCore {
    store: Arc<ViewStore>,
    aggregator: Aggregator,
    credentials: Arc<dyn CredentialProvider>,
    metrics: Mutex<BTreeMap<String, Metric>>,
    rng: Mutex<StdRng>,
    gate: Mutex<PublishGate>,
    in_flight: AtomicBool,
    pub(crate) cancel: CancellationToken,
}

impl SchedulerCore {
    pub(crate) fn new(
        store: Arc<ViewStore>,
        aggregator: Aggregator,
        credentials: Arc<dyn CredentialProvider>,
        metrics: BTreeMap<String, Metric>,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            aggregator,
            credentials,
            metrics: Mutex::new(metrics),
            rng: Mutex::new(rng),
            gate: Mutex::new(PublishGate {
                latest_full_start: None,
                closed: false,
            }),
            in_flight: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// One end-to-end full-refresh cycle, keyed by its start instant. The
    /// aggregation itself runs without any lock held; only the final publish
    /// goes through the gate.
    pub(crate) async fn run_full_cycle(&self, started: Instant) {
        let result = match self.credentials.bearer_token().await {
            Ok(bearer) => Some(self.aggregator.run(&bearer).await),
            Err(err) => {
                error!("credential lookup failed, skipping refresh cycle: {err:#}");
                None
            }
        };

        let mut gate = self.gate.lock().expect("publish gate lock poisoned");
        if gate.closed || self.cancel.is_cancelled() {
            debug!("discarding refresh cycle finished after shutdown");
            return;
        }
        match result {
            None => self.store.mark_refresh_failed(),
            Some(result) => {
                if let Some(latest) = gate.latest_full_start {
                    // Freshness is keyed on start time, not finish time: a
                    // straggler never overwrites newer data.
                    if started <= latest {
                        debug!("discarding superseded refresh cycle");
                        return;
                    }
                }
                gate.latest_full_start = Some(started);
                self.reseed_metrics(&result);
                self.store.apply_full_refresh(&result);
            }
        }
    }

    /// Smoothed metrics are overwritten only by values an `Ok` source
    /// actually measured; defaults substituted for failed sources leave the
    /// walk where it was.
    fn reseed_metrics(&self, result: &AggregationResult) {
        let mut metrics = self.metrics.lock().expect("metrics lock poisoned");
        for (name, metric) in metrics.iter_mut() {
            if !result.measured_fields.contains(name) {
                continue;
            }
            if let Some(FieldValue::Number(real)) = result.snapshot.field(name) {
                metric.set_value(*real);
            }
        }
    }

    /// One smoothing tick: walk every registered metric and publish exactly
    /// those fields. The metrics lock is released before the gate is taken.
    pub(crate) fn run_smoothing_tick(&self) {
        let updates: FieldMap = {
            let mut metrics = self.metrics.lock().expect("metrics lock poisoned");
            if metrics.is_empty() {
                return;
            }
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            metrics
                .iter_mut()
                .map(|(name, metric)| {
                    (
                        name.clone(),
                        FieldValue::Number(smoother::advance(metric, &mut *rng)),
                    )
                })
                .collect()
        };

        let gate = self.gate.lock().expect("publish gate lock poisoned");
        if gate.closed || self.cancel.is_cancelled() {
            return;
        }
        self.store.merge(&updates, now_millis());
        drop(gate);
    }

    fn close_gate(&self) {
        self.gate.lock().expect("publish gate lock poisoned").closed = true;
    }
}

/// Handle on the two running periodic tasks. Dropped into the lifecycle's
/// `Running` state; consumed by shutdown.
pub(crate) struct Scheduler {
    core: Arc<SchedulerCore>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn both periodic tasks. Must be called from within a tokio
    /// runtime.
    pub(crate) fn start(
        core: Arc<SchedulerCore>,
        full_refresh_period: Duration,
        smoothing_period: Duration,
    ) -> Self {
        let tasks = vec![
            tokio::spawn(full_refresh_loop(core.clone(), full_refresh_period)),
            tokio::spawn(smoothing_loop(core.clone(), smoothing_period)),
        ];
        Self { core, tasks }
    }

    /// Cancel both tasks and close the publish gate. Once this returns, no
    /// further store writes occur: a fetch dispatched before cancellation may
    /// still resolve, but its result is discarded at the gate.
    pub(crate) async fn shutdown(self) {
        self.core.cancel.cancel();
        self.core.close_gate();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

async fn full_refresh_loop(core: Arc<SchedulerCore>, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = core.cancel.cancelled() => break,
            _ = ticks.tick() => {}
        }
        // At most one full refresh in flight: a tick landing mid-cycle is
        // coalesced, not queued.
        if core.in_flight.swap(true, Ordering::AcqRel) {
            debug!("full refresh still in flight, coalescing tick");
            continue;
        }
        let cycle = core.clone();
        tokio::spawn(async move {
            cycle.run_full_cycle(Instant::now()).await;
            cycle.in_flight.store(false, Ordering::Release);
        });
    }
}

async fn smoothing_loop(core: Arc<SchedulerCore>, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = core.cancel.cancelled() => break,
            _ = ticks.tick() => {}
        }
        core.run_smoothing_tick();
    }
}
