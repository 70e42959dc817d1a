//! Pulseboard: a dashboard backend that merges telemetry from independent
//! sources into one always-populated view and animates selected metrics
//! between real samples.

pub use pulseboard_domain as domain;
pub use pulseboard_engine as engine;
pub use pulseboard_ports as ports;

pub use pulseboard_domain::DashboardConfig;
pub use pulseboard_engine::{EngineRuntime, SourceSet, ViewStore};
