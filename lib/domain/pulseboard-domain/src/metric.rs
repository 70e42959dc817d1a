//! Bounded metrics animated by the smoothing walk.

/// Inclusive value range for a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    pub min: f64,
    pub max: f64,
}

impl MetricBounds {
    /// Clamp `value` into the range. Written without `f64::clamp` so a
    /// degenerate range never panics.
    pub fn clamp(&self, value: f64) -> f64 {
        value.min(self.max).max(self.min)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A smoothed dashboard metric. The value is kept inside its bounds from
/// construction onward; every write goes through [`Metric::set_value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    value: f64,
    pub bounds: MetricBounds,
    pub max_step: f64,
}

impl Metric {
    pub fn new(initial: f64, bounds: MetricBounds, max_step: f64) -> Self {
        Self {
            value: bounds.clamp(initial),
            bounds,
            max_step,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = self.bounds.clamp(value);
    }
}
