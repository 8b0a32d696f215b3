//! HTTP exporter for a running masking stage.
//!
//! `/metrics` serves the Prometheus text exposition. `/health` answers with a
//! JSON summary of the stage: 200 while it is set up (masking or bypassed),
//! 503 before the first snapshot arrives or once the stage is torn down.

use crate::config::OutputConfig;
use crate::metrics::{MetricsError, MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind metrics exporter to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("metrics exporter stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Where the exporter listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsServerConfig {
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Listen on every interface at `port`.
    pub fn on_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }

    /// The exporter requested by the output section; `None` when
    /// `metrics_port` is 0.
    pub fn from_output(output: &OutputConfig) -> Option<Self> {
        (output.metrics_port != 0).then(|| Self::on_port(output.metrics_port))
    }
}

/// Stage condition reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Nothing published yet.
    Starting,
    /// Set up and masking frames.
    Masking,
    /// Set up, frames passed through untouched.
    Bypassed,
    /// Torn down or never set up.
    Idle,
}

impl StageStatus {
    fn http_status(self) -> StatusCode {
        match self {
            StageStatus::Masking | StageStatus::Bypassed => StatusCode::OK,
            StageStatus::Starting | StageStatus::Idle => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Body of `/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: StageStatus,
    pub geometry: Option<String>,
    pub frame_index: u64,
    pub frames_processed: u64,
    pub frames_bypassed: u64,
    pub grid_cells: usize,
    pub lookback: u32,
    pub last_masked_ratio: Option<f64>,
}

impl HealthReport {
    pub fn from_snapshot(snapshot: Option<&MetricsSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self {
                status: StageStatus::Starting,
                geometry: None,
                frame_index: 0,
                frames_processed: 0,
                frames_bypassed: 0,
                grid_cells: 0,
                lookback: 0,
                last_masked_ratio: None,
            };
        };

        let status = match (snapshot.initialized, snapshot.enabled) {
            (false, _) => StageStatus::Idle,
            (true, true) => StageStatus::Masking,
            (true, false) => StageStatus::Bypassed,
        };
        Self {
            status,
            geometry: snapshot.geometry.map(|g| g.to_string()),
            frame_index: snapshot.frame_index,
            frames_processed: snapshot.frames_processed,
            frames_bypassed: snapshot.frames_bypassed,
            grid_cells: snapshot.grid_cells,
            lookback: snapshot.lookback,
            last_masked_ratio: snapshot.last_masked_ratio,
        }
    }
}

/// Registry plus the latest stage snapshot, shared with the handlers.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: Option<MetricsSnapshot>,
}

impl MetricsState {
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            latest: None,
        }
    }

    /// Applies a snapshot to the counters and keeps it for `/health`.
    pub fn publish(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.latest = Some(snapshot.clone());
    }

    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.latest.as_ref()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport::from_snapshot(self.latest.as_ref())
    }

    pub fn encode(&self) -> Result<String, MetricsError> {
        self.registry.encode()
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// Serves stage metrics and health over HTTP.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState::new(registry))),
        }
    }

    /// Handle used by the frame loop to publish snapshots.
    pub fn state(&self) -> Arc<RwLock<MetricsState>> {
        Arc::clone(&self.state)
    }

    fn router(state: SharedState) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Binds and serves until the runtime shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, "Metrics exporter listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(ServerError::Serve)
    }
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let report = state.read().await.health();
    (report.status.http_status(), Json(report))
}
