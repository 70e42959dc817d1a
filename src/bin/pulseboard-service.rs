use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pulseboard_adapter_http::{EnvCredentialProvider, HttpTelemetrySource};
use pulseboard_domain::DashboardConfig;
use pulseboard_engine::{EngineRuntime, SourceSet};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DashboardConfig::load_from_path(config_path())?;

    let mut sources = SourceSet::new();
    for source_config in &config.sources {
        let spec = config.source_spec(source_config);
        sources.register(
            spec,
            Arc::new(HttpTelemetrySource::new(
                source_config.name.clone(),
                source_config.url.clone(),
            )),
        )?;
    }

    let runtime = EngineRuntime::new(config, sources, Arc::new(EnvCredentialProvider::default()))?;
    runtime.start()?;

    let store = runtime.store();
    store.subscribe(|snapshot| {
        tracing::debug!(
            "published snapshot: {} fields, partial: {}",
            snapshot.fields.len(),
            snapshot.partial
        );
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    runtime.stop().await?;
    Ok(())
}

fn config_path() -> PathBuf {
    if let Ok(path) = env::var("PULSEBOARD_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".pulseboard").join("config.yaml");
    }

    PathBuf::from("pulseboard-config.yaml")
}
