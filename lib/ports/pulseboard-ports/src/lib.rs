//! Port traits between the engine and its collaborators.

use anyhow::Result;
use async_trait::async_trait;

use pulseboard_domain::{FieldMap, SourceError};

/// One independently addressable telemetry endpoint. Fetches are the only
/// suspension points in the engine; implementations must not block.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the source's fields, attaching the given bearer credential.
    async fn fetch(&self, bearer: &str) -> Result<FieldMap, SourceError>;
}

/// Supplies the bearer credential attached to every source fetch. Login and
/// logout live outside the engine.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}
