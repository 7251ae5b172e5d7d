//! HTTP API endpoints

use crate::protocol::{parse_key, parse_samples};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use metricdb_core::storage::{MetricStore, StoreStats};
use metricdb_core::{MetricError, Sample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state
pub type AppState = Arc<MetricStore>;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Create the API router
pub fn create_router(store: Arc<MetricStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/ping", get(ping))

        // Write endpoints
        .route("/add", post(add))
        .route("/write", post(write))

        // Query endpoint
        .route("/sum", get(sum))

        // Stats
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub key: String,
    pub value: i32,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SumParams {
    pub key: String,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SumResponse {
    pub key: String,
    pub start: i64,
    pub end: i64,
    pub sum: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub accepted: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

fn internal(error: impl ToString) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn store_error(error: MetricError) -> ApiError {
    match error {
        MetricError::InvalidKey(_) => bad_request(error.to_string()),
        other => internal(other),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: metricdb_core::VERSION.to_string(),
    })
}

async fn ping() -> &'static str {
    "pong"
}

async fn add(
    State(store): State<AppState>,
    Json(req): Json<AddRequest>,
) -> Result<StatusCode, ApiError> {
    let key = parse_key(&req.key).map_err(bad_request)?;
    let sample = Sample::new(req.timestamp.unwrap_or_else(now_millis), key, req.value);

    tokio::task::spawn_blocking(move || store.add_sample(sample))
        .await
        .map_err(internal)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn write(
    State(store): State<AppState>,
    body: String,
) -> Result<Json<WriteResponse>, ApiError> {
    let samples = parse_samples(&body, now_millis()).map_err(bad_request)?;
    let accepted = samples.len();

    tokio::task::spawn_blocking(move || {
        for sample in samples {
            store.add_sample(sample);
        }
    })
    .await
    .map_err(internal)?;

    Ok(Json(WriteResponse { accepted }))
}

async fn sum(
    State(store): State<AppState>,
    Query(params): Query<SumParams>,
) -> Result<Json<SumResponse>, ApiError> {
    let key = parse_key(&params.key).map_err(bad_request)?;
    let (start, end) = (params.start, params.end);

    let sum = tokio::task::spawn_blocking(move || store.sum(start, end, key))
        .await
        .map_err(internal)?
        .map_err(store_error)?;

    Ok(Json(SumResponse {
        key: params.key,
        start,
        end,
        sum,
    }))
}

async fn stats(State(store): State<AppState>) -> Json<StoreStats> {
    Json(store.stats())
}

async fn metrics(State(store): State<AppState>) -> String {
    let stats = store.stats();

    // Prometheus format
    let mut output = String::new();
    let mut emit = |name: &str, help: &str, kind: &str, value: String| {
        output.push_str(&format!("# HELP metricdb_{} {}\n", name, help));
        output.push_str(&format!("# TYPE metricdb_{} {}\n", name, kind));
        output.push_str(&format!("metricdb_{} {}\n", name, value));
    };

    emit(
        "open_handles",
        "Partition files currently open for writing",
        "gauge",
        stats.open_handles.to_string(),
    );
    emit(
        "partitions_opened_total",
        "Partition files opened for writing",
        "counter",
        stats.partitions_opened.to_string(),
    );
    emit(
        "evictions_total",
        "Write handles closed by eviction",
        "counter",
        stats.evictions.to_string(),
    );
    emit("writes_total", "Samples appended", "counter", stats.writes.to_string());
    emit(
        "failed_writes_total",
        "Samples dropped on write errors",
        "counter",
        stats.failed_writes.to_string(),
    );

    output
}
