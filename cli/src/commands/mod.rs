pub mod address;
pub mod identify;
pub mod lookup;
pub mod route;
pub mod search;
pub mod tile;

use std::io::Write;

use anyhow::{Context, Result};
use parcelnav::{Engine, EngineConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::Cli;

/// Load the configuration and data directory named on the command line.
pub(crate) fn open_engine(cli: &Cli) -> Result<Engine> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let collections = parcelnav::io::read_collections_dir(&cli.data)
        .with_context(|| format!("loading data from {}", cli.data.display()))?;

    let timeout = config.routing.provider_timeout();
    let engine = with_directions(Engine::new(config)?, timeout);
    let snapshot = engine.load_snapshot(collections)?;
    info!(
        version = snapshot.version(),
        parcels = snapshot.parcels().len(),
        diagnostics = snapshot.diagnostics().len(),
        "snapshot loaded",
    );
    Ok(engine)
}

#[cfg(feature = "directions")]
fn with_directions(engine: Engine, timeout: std::time::Duration) -> Engine {
    use std::sync::Arc;

    use parcelnav::routing::{MapboxDirections, ProviderError};
    use tracing::warn;

    match MapboxDirections::from_env(timeout) {
        Ok(client) => engine.with_directions(Arc::new(client)),
        Err(ProviderError::NotConfigured) => engine,
        Err(e) => {
            warn!(error = %e, "directions provider unavailable, routing locally");
            engine
        }
    }
}

#[cfg(not(feature = "directions"))]
fn with_directions(engine: Engine, _timeout: std::time::Duration) -> Engine { engine }

/// Pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
