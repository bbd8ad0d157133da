//! Station Map Binary
//!
//! Reads station updates and renders them onto the route map.
//!
//! # Usage
//!
//! ```bash
//! STATION_MAP_OUTPUT=live.svg cargo run --bin station-map < updates.ndjson
//! ```
//!
//! # Environment Variables
//!
//! - `STATION_MAP_SVG`: Route map to render onto (default: bundled map)
//! - `STATION_MAP_OUTPUT`: File the current render is written to (default: none)
//! - `STATION_MAP_INPUT`: Update source, `-` for stdin (default: stdin)
//! - `STATION_MAP_CHANNEL_CAPACITY`: Inbound channel capacity (default: 256)
//! - `STATION_MAP_HEALTH_PORT`: Health check HTTP port, 0 disables (default: 8083)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: station-map)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use station_map::application::ports::MapDocument;
use station_map::application::services::{DispatchStats, UpdateDispatcher};
use station_map::domain::network::{Station, StationStateUpdate};
use station_map::infrastructure::config::{InputSource, MapConfig};
use station_map::infrastructure::health::{HealthServer, HealthServerState};
use station_map::infrastructure::svg::SvgMapDocument;
use station_map::infrastructure::telemetry;
use station_map::infrastructure::transport::{ReaderSummary, TransportError, forward_lines};
use station_map::init_metrics;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long to wait for background work once the renderer has stopped.
///
/// Reads from standard input cannot be interrupted, so the runtime is not
/// allowed to wait for them indefinitely.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(run());
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

async fn run() -> anyhow::Result<()> {
    load_dotenv();

    let telemetry_guard = telemetry::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        otel_export = telemetry_guard.is_exporting(),
        "Starting station map renderer"
    );

    let _metrics_handle = init_metrics();

    let config = MapConfig::from_env()?;
    log_config(&config);

    let mut document = SvgMapDocument::load(&config.map)
        .with_context(|| format!("failed to load route map ({})", config.map.describe()))?;
    if let Some(path) = config.output_path() {
        document = document.with_output(path);
    }
    document
        .commit()
        .context("failed to write initial render")?;

    let shutdown_token = CancellationToken::new();
    let stats = Arc::new(DispatchStats::new());
    let dispatcher = UpdateDispatcher::with_stats(document, Arc::clone(&stats));
    report_resolution(&dispatcher);

    if config.server.health_enabled() {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION"),
            Arc::clone(&stats),
        ));
        let health_server = HealthServer::new(
            config.server.health_port,
            health_state,
            shutdown_token.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
    }

    let (update_tx, update_rx) = mpsc::channel(config.channel.capacity);
    let reader = spawn_reader(
        &config.input,
        update_tx,
        Arc::clone(&stats),
        shutdown_token.clone(),
    )
    .await?;

    tracing::info!("Station map renderer ready");

    let dispatch = dispatcher.run(update_rx, shutdown_token.clone());
    tokio::pin!(dispatch);

    let finished = tokio::select! {
        document = &mut dispatch => Some(document),
        () = await_shutdown(shutdown_token.clone()) => None,
    };
    let mut document = match finished {
        Some(document) => document,
        None => dispatch.await,
    };
    shutdown_token.cancel();

    match reader.await {
        Ok(Ok(summary)) => log_summary(&summary),
        Ok(Err(e)) => tracing::error!(error = %e, "Input reader failed"),
        Err(e) => tracing::error!(error = %e, "Input reader task failed"),
    }

    document.commit().context("failed to write final render")?;

    tracing::info!(
        received = stats.received(),
        applied = stats.applied(),
        skipped = stats.skipped(),
        rejected = stats.rejected(),
        "Station map renderer stopped"
    );
    Ok(())
}

/// Open the update source and start forwarding it to the dispatcher.
async fn spawn_reader(
    input: &InputSource,
    updates: mpsc::Sender<StationStateUpdate>,
    stats: Arc<DispatchStats>,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinHandle<Result<ReaderSummary, TransportError>>> {
    let handle = match input {
        InputSource::Stdin => {
            let stdin = BufReader::new(tokio::io::stdin());
            tokio::spawn(forward_lines(stdin, updates, stats, shutdown))
        }
        InputSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open input {}", path.display()))?;
            tokio::spawn(forward_lines(BufReader::new(file), updates, stats, shutdown))
        }
    };

    tracing::info!(input = %input.describe(), "Reading station updates");
    Ok(handle)
}

/// Warn about stations the loaded map has no marker for.
fn report_resolution(dispatcher: &UpdateDispatcher<SvgMapDocument>) {
    let resolved = dispatcher.resolvable_stations();
    for station in Station::ALL {
        if !resolved.contains(&station) {
            tracing::warn!(
                station = %station,
                element_id = station.element_id(),
                "Route map has no marker for station"
            );
        }
    }
    tracing::info!(
        resolved = resolved.len(),
        total = Station::COUNT,
        "Route map loaded"
    );
}

/// Log the parsed configuration.
fn log_config(config: &MapConfig) {
    tracing::info!(
        map = %config.map.describe(),
        input = %config.input.describe(),
        output = ?config.output_path(),
        channel_capacity = config.channel.capacity,
        health_port = config.server.health_port,
        "Configuration loaded"
    );
}

fn log_summary(summary: &ReaderSummary) {
    tracing::info!(
        lines = summary.lines,
        forwarded = summary.forwarded,
        ignored = summary.ignored,
        unmapped = summary.unmapped,
        rejected = summary.rejected,
        "Input finished"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    for dir in cwd.ancestors().skip(1) {
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
            return;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }

    shutdown_token.cancel();
}
