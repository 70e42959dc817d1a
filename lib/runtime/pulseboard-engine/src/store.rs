//! The view-model store: one atomically replaced snapshot plus subscribers.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use pulseboard_domain::{AggregationResult, FieldMap, Snapshot, now_millis};

pub type SnapshotSubscriber = Box<dyn Fn(&Snapshot) + Send + Sync>;

struct FullRefreshMark {
    at: Instant,
    all_failed: bool,
}

/// Exclusive owner of the published snapshot. Each publish builds a fresh
/// immutable [`Snapshot`] and swaps it in under the write lock, so readers
/// never observe a half-applied merge. Writers are serialized by the
/// scheduler's publish gate; the store itself only guards the swap.
pub struct ViewStore {
    snapshot: RwLock<Arc<Snapshot>>,
    subscribers: RwLock<Vec<SnapshotSubscriber>>,
    last_full: RwLock<FullRefreshMark>,
    stale_after: Duration,
}

impl ViewStore {
    /// Seed the store so every declared field has a value before the first
    /// refresh lands. The seed snapshot is partial: defaults are not real
    /// measurements.
    pub fn new(seed_fields: FieldMap, stale_after: Duration) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::new(seed_fields, now_millis(), true))),
            subscribers: RwLock::new(Vec::new()),
            last_full: RwLock::new(FullRefreshMark {
                at: Instant::now(),
                all_failed: false,
            }),
            stale_after,
        }
    }

    pub fn get(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .expect("snapshot lock poisoned")
            .clone()
    }

    /// Register a callback invoked once per successful publish.
    pub fn subscribe(&self, subscriber: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .push(Box::new(subscriber));
    }

    /// Merge a partial field update over the current snapshot. Fields not
    /// named carry over unchanged, as does the `partial` flag.
    pub fn merge(&self, updates: &FieldMap, captured_at_ms: i64) -> Arc<Snapshot> {
        self.replace(|current| current.merged_with(updates, captured_at_ms))
    }

    /// Apply a finished full-refresh cycle: merge its fields, adopt its
    /// `partial` flag, and record the refresh for staleness tracking.
    pub fn apply_full_refresh(&self, result: &AggregationResult) -> Arc<Snapshot> {
        {
            let mut mark = self.last_full.write().expect("refresh mark lock poisoned");
            mark.at = Instant::now();
            mark.all_failed = result.all_failed();
        }
        self.replace(|current| {
            let mut next =
                current.merged_with(&result.snapshot.fields, result.snapshot.captured_at_ms);
            next.partial = result.snapshot.partial;
            next
        })
    }

    /// Record a full-refresh attempt that produced no result at all (for
    /// example a credential failure). The snapshot is untouched; staleness
    /// reports it.
    pub fn mark_refresh_failed(&self) {
        self.last_full
            .write()
            .expect("refresh mark lock poisoned")
            .all_failed = true;
    }

    /// True when the most recent full-refresh attempt failed entirely, or
    /// when no refresh has landed within the staleness budget.
    pub fn stale(&self) -> bool {
        let mark = self.last_full.read().expect("refresh mark lock poisoned");
        mark.all_failed || mark.at.elapsed() > self.stale_after
    }

    fn replace(&self, build: impl FnOnce(&Snapshot) -> Snapshot) -> Arc<Snapshot> {
        let next = {
            let mut current = self.snapshot.write().expect("snapshot lock poisoned");
            let next = Arc::new(build(&current));
            *current = next.clone();
            next
        };
        let subscribers = self.subscribers.read().expect("subscriber lock poisoned");
        for subscriber in subscribers.iter() {
            subscriber(&next);
        }
        next
    }
}
