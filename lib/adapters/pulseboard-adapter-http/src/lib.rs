//! HTTP adapter implementations of the telemetry and credential ports.

pub mod credentials;
pub mod telemetry;

pub use credentials::{EnvCredentialProvider, StaticCredentialProvider};
pub use telemetry::HttpTelemetrySource;
