//! Driver Alertness Monitor - Main Entry Point

use anyhow::{Context, Result};
use dms::LandmarkSource;
use metrics_exporter_prometheus::PrometheusBuilder;
use monitor::config::{SourceConfig, StorageConfig};
use monitor::status::shared_status;
use monitor::{
    create_router, init_logging, AppState, MonitorConfig, MonitorSession, ReplaySource,
    DEFAULT_CONFIG_PATH,
};
use serial_link::SerialLink;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::{AuditLogger, EventStore, MemoryEventStore, SqliteEventStore};
use telemetry::{resolver_from_config, LocationCell, TelemetryParser, TelemetryTask};
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = MonitorConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    init_logging(&config.logging)?;

    info!("=== Driver Alertness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(listen) = &config.metrics.listen {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid metrics.listen address {}", listen))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing Prometheus exporter")?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    let store = open_store(&config.storage).await;
    let logger = AuditLogger::new(store.clone());

    let (link, reader) = SerialLink::open_or_disconnected(&config.serial);
    let location = LocationCell::new();
    let status = shared_status(link.device().map(str::to_string));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let telemetry = reader.map(|reader| {
        TelemetryTask::new(
            TelemetryParser::new(&config.telemetry),
            resolver_from_config(&config.geo),
            location.clone(),
        )
        .spawn(reader, shutdown_rx.clone())
    });

    let api = match &config.api.bind {
        Some(bind) => {
            let state = AppState::new(status.clone(), store.clone());
            Some(spawn_api(bind, state, shutdown_rx.clone()).await?)
        }
        None => None,
    };

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                ctrl_c_tx.send_replace(true);
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut session = MonitorSession::new(
        &config.dms,
        &config.alerting,
        link.clone(),
        location,
        logger,
        status,
    )?;
    let mut source = open_source(&config.source).await?;
    session.run(source.as_mut(), shutdown_rx).await;

    shutdown_tx.send_replace(true);
    if let Some(handle) = telemetry {
        if let Err(e) = handle.await {
            warn!("Telemetry task ended abnormally: {}", e);
        }
    }
    if let Some(handle) = api {
        if let Err(e) = handle.await {
            warn!("Status API task ended abnormally: {}", e);
        }
    }
    link.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// SQLite when configured and reachable, otherwise in memory
async fn open_store(config: &StorageConfig) -> Arc<dyn EventStore> {
    if let Some(url) = config.url.as_deref().filter(|url| !url.is_empty()) {
        match SqliteEventStore::connect(url).await {
            Ok(store) => match store.init().await {
                Ok(()) => return Arc::new(store),
                Err(e) => warn!("Failed to prepare event table: {}", e),
            },
            Err(e) => warn!("SQLite store unavailable: {}", e),
        }
        warn!("Keeping audit events in memory only");
    }
    Arc::new(MemoryEventStore::with_capacity(config.memory_capacity))
}

/// Recording file when configured, otherwise JSON lines on stdin
async fn open_source(config: &SourceConfig) -> Result<Box<dyn LandmarkSource>> {
    match &config.path {
        Some(path) => {
            let source = ReplaySource::open(path, config.fps)
                .await
                .with_context(|| format!("opening landmark recording {}", path.display()))?;
            Ok(Box::new(source))
        }
        None => {
            info!("Reading landmark frames from standard input");
            Ok(Box::new(ReplaySource::from_reader(
                BufReader::new(tokio::io::stdin()),
                0.0,
            )))
        }
    }
}

async fn spawn_api(
    bind: &str,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding status API to {}", bind))?;
    info!("Starting status API on {}", bind);

    let app = create_router(Arc::new(state));
    Ok(tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        });
        if let Err(e) = server.await {
            error!("Status API failed: {}", e);
        }
    }))
}
