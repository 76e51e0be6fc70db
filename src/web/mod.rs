//! Axum HTTP surface for the bullwatch console.
//!
//! The handlers are thin: they parse parameters, call the explorer, and
//! map the error taxonomy onto status codes. Fatal store errors become
//! 500, typed not-found becomes 404; everything the explorer absorbed
//! internally still renders as a best-effort response.

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::time::Instant;

use crate::explorer::{Job, JobSummary, QueueExplorer, QueueStats, StateFilter};
use crate::metrics;
use crate::storage::StoreError;

const CONSOLE_HTML: &str = include_str!("../../ui/console.html");

const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Clone)]
struct AppState {
    explorer: QueueExplorer,
}

#[derive(Deserialize, Default)]
struct JobListParams {
    state: Option<String>,
    q: Option<String>,
    limit: Option<usize>,
}

/// Build the full application router.
pub fn router(explorer: QueueExplorer) -> Router {
    let state = AppState { explorer };

    Router::new()
        .route("/", get(serve_console))
        .route("/api/queues", get(list_queues))
        .route("/api/queues/:name", get(queue_detail))
        .route("/api/queues/:name/jobs", get(queue_jobs))
        .route("/api/queues/:name/jobs/:id", get(job_detail))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready))
        .route("/readyz", get(ready))
        .route("/metrics", get(metrics_exposition))
        .layer(middleware::from_fn(track_http))
        .with_state(state)
}

/// Record request latency per method/route/status.
async fn track_http(req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), &path, response.status().as_str()])
        .observe(start.elapsed().as_secs_f64());
    response
}

async fn serve_console() -> Html<&'static str> {
    Html(CONSOLE_HTML)
}

/// Discovery plus stats for every queue.
async fn list_queues(State(state): State<AppState>) -> Result<Json<Vec<QueueStats>>, StatusCode> {
    let queues = state
        .explorer
        .discover_queues()
        .await
        .map_err(internal_error)?;
    Ok(Json(state.explorer.stats_for(&queues).await))
}

/// Stats for a single queue; 404 when no key of the queue exists at all.
async fn queue_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<QueueStats>, StatusCode> {
    let stats = state.explorer.queue_stats(&name).await;
    if stats.total == 0 {
        let known = state
            .explorer
            .discover_queues()
            .await
            .map_err(internal_error)?;
        if !known.contains(&name) {
            return Err(StatusCode::NOT_FOUND);
        }
    }
    Ok(Json(stats))
}

/// Job listing for one state or the pseudo-state `all`, with optional
/// free-text search.
async fn queue_jobs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<JobListParams>,
) -> Result<Json<Vec<JobSummary>>, StatusCode> {
    let filter = StateFilter::parse(params.state.as_deref().unwrap_or("all"))
        .ok_or(StatusCode::BAD_REQUEST)?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let jobs = state
        .explorer
        .list_jobs(&name, filter, params.q.as_deref(), limit)
        .await
        .map_err(internal_error)?;
    Ok(Json(jobs))
}

async fn job_detail(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Job>, StatusCode> {
    match state.explorer.get_job(&name, &id).await {
        Ok(job) => Ok(Json(job)),
        Err(e) if e.is_not_found() => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(internal_error(e)),
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Readiness is "queue discovery succeeds"; it does not validate full
/// aggregation correctness.
async fn ready(State(state): State<AppState>) -> Response {
    match state.explorer.discover_queues().await {
        Ok(_) => (StatusCode::OK, "Ready").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable").into_response()
        }
    }
}

async fn metrics_exposition() -> Result<String, StatusCode> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metrics::gather(), &mut buffer)
        .map_err(|e| {
            tracing::error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn internal_error(err: StoreError) -> StatusCode {
    tracing::error!(error = %err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}
