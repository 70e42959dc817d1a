//! The fixed set of telemetry sources behind one dashboard.

use std::sync::Arc;

use anyhow::{Result, bail};

use pulseboard_domain::{FieldMap, SourceSpec};
use pulseboard_ports::TelemetrySource;

pub struct SourceEntry {
    pub spec: SourceSpec,
    pub source: Arc<dyn TelemetrySource>,
}

/// Ordered registry of sources, built once at startup. Declaration order is
/// load-bearing: when two sources declare the same field name, the
/// later-declared source wins.
#[derive(Default)]
pub struct SourceSet {
    entries: Vec<SourceEntry>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: SourceSpec, source: Arc<dyn TelemetrySource>) -> Result<()> {
        if spec.name.trim().is_empty() {
            bail!("source name must not be empty");
        }
        if self.entries.iter().any(|entry| entry.spec.name == spec.name) {
            bail!("duplicate source name: {}", spec.name);
        }
        self.entries.push(SourceEntry { spec, source });
        Ok(())
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of every source's default fields, applying the
    /// later-declared-wins precedence. This is the seed for the always-
    /// populated snapshot.
    pub fn default_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        for entry in &self.entries {
            for (name, value) in &entry.spec.defaults {
                fields.insert(name.clone(), value.clone());
            }
        }
        fields
    }
}
