//! HTTP server exposing the dashboard.
//!
//! This module provides an HTTP server that:
//! - Starts and ends sessions on behalf of the login front end
//! - Accepts activity signals via POST /activity
//! - Serves the latest telemetry snapshot and summary
//!
//! # Architecture
//!
//! ```text
//! Login page ──→ POST /session/start ──→ Dashboard ←── timer task
//! Key handler ─→ POST /activity ───────→     │       (sleep until deadline)
//! Chart ───────→ GET /telemetry ←────────────┘
//! ```

use crate::config::SimulationConfig;
use crate::core::clock::Increment;
use crate::core::telemetry::{Summary, TelemetrySnapshot};
use crate::dashboard::{Dashboard, DashboardError};
use crate::display::{NullDisplay, Renderer};
use crate::input::ActivityKey;
use crate::session::SessionReport;
use crate::stats::{create_shared_log, ActivityStats, SharedActivityLog};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Engine parameters for every session
    pub simulation: SimulationConfig,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, simulation: SimulationConfig) -> Self {
        Self { port, simulation }
    }
}

/// Logs snapshots instead of drawing them; clients poll GET /telemetry.
struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn render(&mut self, snapshot: &TelemetrySnapshot) {
        tracing::debug!(
            sequence = snapshot.sequence,
            steps = snapshot.total_steps,
            heart_rate = snapshot.current_heart_rate,
            state = ?snapshot.state,
            "Telemetry"
        );
    }
}

/// Shared server state
pub struct ServerState {
    dashboard: Mutex<Dashboard>,
    /// Wakes the timer task when a deadline changes
    rearm: Notify,
    log: SharedActivityLog,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig) -> Self {
        let log = create_shared_log();
        let dashboard = Dashboard::new(
            config.simulation.clone(),
            Box::new(TracingRenderer),
            Box::new(NullDisplay),
            log.clone(),
        );
        Self {
            dashboard: Mutex::new(dashboard),
            rearm: Notify::new(),
            log,
        }
    }
}

/// Optional per-trigger overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityRequest {
    /// Browser key name that produced the signal
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub heart: Option<u32>,
}

/// Response from session start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub summary: Summary,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_running: bool,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(code: &str, error: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
}

fn dashboard_error(e: DashboardError) -> ApiError {
    let code = match e {
        DashboardError::NoSession => "NO_SESSION",
        DashboardError::AlreadyRunning => "SESSION_RUNNING",
    };
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: e.to_string(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let session_running = state.dashboard.lock().await.is_running();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_running,
    })
}

/// POST /session/start
async fn start_session(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<SessionStarted>, ApiError> {
    let mut dashboard = state.dashboard.lock().await;
    let session_id = dashboard.start().map_err(dashboard_error)?;
    tracing::info!("Session {} started", session_id);
    Ok(Json(SessionStarted {
        session_id,
        summary: dashboard.summary(),
    }))
}

/// POST /session/end
async fn end_session(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<SessionReport>, ApiError> {
    let report = state
        .dashboard
        .lock()
        .await
        .end()
        .map_err(dashboard_error)?;
    state.rearm.notify_one();
    Ok(Json(report))
}

/// POST /activity
///
/// Registers one activity signal. The body is optional; when present it
/// may name the key and override the step and heart-rate increments.
async fn activity(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<ActivityRequest>, JsonRejection>,
) -> Result<Json<TelemetrySnapshot>, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => ActivityRequest::default(),
        Err(e) => return Err(bad_request("INVALID_BODY", e.body_text())),
    };

    if let Some(name) = request.key.as_deref() {
        if ActivityKey::from_key_name(name).is_none() {
            return Err(bad_request(
                "NOT_ACTIVITY_KEY",
                format!("Key '{name}' is not an activity key"),
            ));
        }
    }

    let snapshot = {
        let mut dashboard = state.dashboard.lock().await;
        let default = dashboard
            .session()
            .map(|s| s.default_increment())
            .unwrap_or_else(Increment::default);
        let increment = default.with_overrides(request.steps, request.heart);
        dashboard
            .trigger_activity_now(Some(increment))
            .map_err(dashboard_error)?
    };

    // The grace timer was re-armed; the timer task must re-read its deadline
    state.rearm.notify_one();
    Ok(Json(snapshot))
}

/// GET /telemetry
async fn telemetry(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<TelemetrySnapshot>, ApiError> {
    let mut dashboard = state.dashboard.lock().await;
    // Catch up on timers a slow wake-up may have missed
    dashboard.advance_now();
    dashboard.snapshot().map(Json).map_err(dashboard_error)
}

/// GET /summary
async fn summary(State(state): State<Arc<ServerState>>) -> Json<Summary> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.advance_now();
    Json(dashboard.summary())
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<ActivityStats> {
    Json(state.log.stats())
}

/// Sleep until the armed deadline, fire it, repeat.
async fn drive_timers(state: Arc<ServerState>, mut stop: watch::Receiver<bool>) {
    loop {
        let deadline = state.dashboard.lock().await.next_deadline_instant();

        let wait = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = wait => {
                state.dashboard.lock().await.advance_now();
            }
            _ = state.rearm.notified() => {}
            _ = stop.changed() => break,
        }
    }

    // No timer may outlive the server
    let mut dashboard = state.dashboard.lock().await;
    if dashboard.is_running() {
        let _ = dashboard.end();
    }
    tracing::debug!("Timer task stopped");
}

/// A running server and the tasks behind it.
pub struct ServerHandle {
    /// Address the listener is bound to
    pub addr: SocketAddr,
    stop: watch::Sender<bool>,
    timers: JoinHandle<()>,
    server: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop serving and wait until the running session has been ended.
    pub async fn shutdown(self) {
        tracing::info!("Server shutdown requested");
        let _ = self.stop.send(true);
        if let Err(e) = self.timers.await {
            tracing::error!("Timer task failed: {}", e);
        }
        if let Err(e) = self.server.await {
            tracing::error!("Server task failed: {}", e);
        }
    }
}

/// Run the HTTP server
pub async fn run(config: ServerConfig) -> anyhow::Result<ServerHandle> {
    let state = Arc::new(ServerState::new(&config));

    let app = Router::new()
        .route("/health", get(health))
        .route("/session/start", post(start_session))
        .route("/session/end", post(end_session))
        .route("/activity", post(activity))
        .route("/telemetry", get(telemetry))
        .route("/summary", get(summary))
        .route("/stats", get(stats))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Activity sim server listening on http://{}", actual_addr);

    let (stop, stop_rx) = watch::channel(false);
    let timers = tokio::spawn(drive_timers(state, stop_rx.clone()));

    let server = tokio::spawn(async move {
        let mut server_stop = stop_rx;
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_stop.changed().await;
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        stop,
        timers,
        server,
    })
}
