//! Registry stub server, standalone development binary.
//!
//! `REGISTRY_CATALOG` selects a JSON/YAML catalog file; without it the
//! built-in seed taxonomy is served. `REGISTRY_STUB_PORT` sets the port.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use riskgate_registry::Catalog;
use riskgate_registry_stub::{router, StubStore, DEFAULT_PORT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("REGISTRY_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let store = match std::env::var("REGISTRY_CATALOG") {
        Ok(path) => {
            let catalog =
                Catalog::from_path(&path).with_context(|| format!("loading catalog {path}"))?;
            tracing::info!(catalog = %path, "serving catalog file");
            StubStore::from_catalog(catalog)
        }
        Err(_) => StubStore::builtin(),
    };
    tracing::info!(
        risks = store.risk_count(),
        controls = store.control_count(),
        "catalog loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("riskgate-registry-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, router(store).into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
