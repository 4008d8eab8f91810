use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod service;
mod store;

use config::{BusKind, Config};
use dbus_interface::{VerdictService, BUS_NAME, OBJECT_PATH};
use service::ScoringService;
use store::ThresholdStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("verdictd starting");

    let config = Config::from_env();
    let thresholds = config
        .threshold_config()
        .context("invalid VERDICT_DETECTION_THRESHOLD / VERDICT_UNCERTAINTY_RANGE")?;
    tracing::info!(
        threshold = thresholds.detection_threshold(),
        range = thresholds.uncertainty_range(),
        lower = thresholds.lower_bound(),
        upper = thresholds.upper_bound(),
        "threshold config loaded"
    );

    let store = ThresholdStore::new(thresholds);

    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let current = *changes.borrow_and_update();
            tracing::info!(
                lower = current.lower_bound(),
                upper = current.upper_bound(),
                "uncertainty band moved"
            );
        }
    });

    let builder = match config.bus {
        BusKind::Session => zbus::connection::Builder::session()?,
        BusKind::System => zbus::connection::Builder::system()?,
    };
    let _conn = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, VerdictService::new(ScoringService::new(store)))?
        .build()
        .await
        .with_context(|| format!("registering {BUS_NAME} on the {:?} bus", config.bus))?;

    tracing::info!(bus = ?config.bus, name = BUS_NAME, "verdictd ready");

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("verdictd shutting down");

    Ok(())
}
