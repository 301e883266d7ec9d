use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    error::ScanError,
    scanner::ScanController,
    types::{ScanState, ScanStats},
    wordlist,
};

#[derive(Clone)]
pub struct AppState {
    controller: ScanController,
    default_wordlist: Arc<Vec<String>>,
}

impl AppState {
    /// `default_wordlist` is used when a scan request has no usable paths.
    pub fn new(controller: ScanController, default_wordlist: Vec<String>) -> Self {
        Self {
            controller,
            default_wordlist: Arc::new(default_wordlist),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub state: ScanState,
    pub target: Option<String>,
    pub total: u64,
    pub completed: u64,
    pub progress: f64,
    pub stats: ScanStats,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    #[serde(default)]
    pub wordlist: Vec<String>,
}

/// Build the API router plus the static UI fallback.
pub fn router(state: AppState, ui_dir: impl Into<PathBuf>) -> Router {
    let api = Router::new()
        .route("/status", get(get_status))
        .route("/scan", post(post_scan))
        .route("/pause", post(post_pause))
        .route("/resume", post(post_resume))
        .route("/stop", post(post_stop))
        .route("/results", get(get_results))
        .route("/export", get(get_export))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state);

    let static_svc = ServeDir::new(ui_dir.into()).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
}

pub async fn spawn_server(bind: &str, state: AppState, ui_dir: PathBuf) -> Result<()> {
    let app = router(state, ui_dir);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("serving UI on http://{}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn current_status(controller: &ScanController) -> Status {
    let snap = controller.snapshot().await;
    Status {
        state: snap.state,
        target: snap.target,
        total: snap.total,
        completed: snap.completed,
        progress: snap.progress,
        stats: snap.stats,
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let code = match &self {
            ScanError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ScanError::AlreadyRunning(_) | ScanError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (code, self.to_string()).into_response()
    }
}

async fn get_status(State(app): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(current_status(&app.controller).await))
}

async fn get_results(State(app): State<AppState>) -> impl IntoResponse {
    let snap = app.controller.snapshot().await;
    if snap.state == ScanState::Idle {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(snap)).into_response()
    }
}

async fn get_export(State(app): State<AppState>) -> Response {
    let results = app.controller.results().await;
    match serde_json::to_vec_pretty(&results) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"pathscout-results.json\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => ScanError::from(e).into_response(),
    }
}

async fn post_scan(State(app): State<AppState>, Json(req): Json<ScanRequest>) -> Response {
    let mut paths = wordlist::parse_wordlist_str(&req.wordlist.join("\n"));
    if paths.is_empty() {
        paths = app.default_wordlist.as_ref().clone();
    }

    if let Err(e) = app.controller.start(&req.target, paths).await {
        warn!(error = %e, "scan request rejected");
        return e.into_response();
    }
    (StatusCode::ACCEPTED, Json(current_status(&app.controller).await)).into_response()
}

async fn post_pause(State(app): State<AppState>) -> Response {
    match app.controller.pause() {
        Ok(()) => (StatusCode::OK, Json(current_status(&app.controller).await)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn post_resume(State(app): State<AppState>) -> Response {
    match app.controller.resume() {
        Ok(()) => (StatusCode::OK, Json(current_status(&app.controller).await)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn post_stop(State(app): State<AppState>) -> Response {
    match app.controller.stop().await {
        Ok(()) => (StatusCode::OK, Json(current_status(&app.controller).await)).into_response(),
        Err(e) => e.into_response(),
    }
}
