//! Bounded random walk between real samples.

use rand::Rng;

use pulseboard_domain::{Metric, MetricBounds};

/// One smoothing step: `clamp(previous + draw * max_step)` with a uniform
/// draw in `[-1, 1]` from the injected generator. Clamping after every step
/// keeps a walk that reaches a boundary inside the bounds forever.
pub fn next_value<R: Rng + ?Sized>(
    previous: f64,
    bounds: MetricBounds,
    max_step: f64,
    rng: &mut R,
) -> f64 {
    let draw: f64 = rng.gen_range(-1.0..=1.0);
    bounds.clamp(previous + draw * max_step)
}

/// Advance a metric in place and return its new value.
pub fn advance<R: Rng + ?Sized>(metric: &mut Metric, rng: &mut R) -> f64 {
    let next = next_value(metric.value(), metric.bounds, metric.max_step, rng);
    metric.set_value(next);
    next
}
