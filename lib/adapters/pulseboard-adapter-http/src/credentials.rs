use anyhow::{Context, Result};
use async_trait::async_trait;

use pulseboard_ports::CredentialProvider;

const DEFAULT_TOKEN_VAR: &str = "PULSEBOARD_TOKEN";

/// Reads the bearer token from an environment variable on every fetch cycle,
/// so rotated tokens are picked up without a restart.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::from_var(DEFAULT_TOKEN_VAR)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn bearer_token(&self) -> Result<String> {
        std::env::var(&self.var)
            .with_context(|| format!("bearer token variable {} is not set", self.var))
    }
}

/// Fixed bearer token, for tests and static deployments.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    token: String,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
