//! API request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::classifier::Label;
use crate::error::SpamError;
use crate::history::HistoryQuery;
use crate::service::SpamService;
use crate::stats::SpamStats;

/// Shared application state
pub struct AppState {
    pub service: Arc<SpamService>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }
    }
}

/// Classify request body
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// Classify response
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub label: Label,
    pub confidence: f64,
    /// History line recorded for this classification
    pub line: String,
}

/// History listing
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub lines: Vec<String>,
}

/// Statistics for display
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: u64,
    pub spam_count: u64,
    pub ham_count: u64,
    pub spam_percentage: f64,
    pub has_data: bool,
}

fn status_for(err: &SpamError) -> StatusCode {
    match err {
        SpamError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SpamError::EmptyVector => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response<T: Serialize>(err: SpamError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    (status, Json(ApiResponse::<T>::error(&err.to_string()))).into_response()
}

/// Run a synchronous service call on the blocking thread pool
async fn run_blocking<T, F>(f: F) -> Result<T, SpamError>
where
    F: FnOnce() -> Result<T, SpamError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SpamError::Storage(format!("blocking task failed: {}", e)))?
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "spam-rs",
        "version": env!("CARGO_PKG_VERSION"),
        "vocabulary_size": state.service.pipeline().vocabulary().len(),
    }))
}

/// POST /api/classify - Classify a message and record it in the history
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassifyRequest>,
) -> Response {
    let service = state.service.clone();
    match run_blocking(move || service.analyze(&req.text)).await {
        Ok(outcome) => Json(ApiResponse::success(ClassifyResponse {
            label: outcome.prediction.label,
            confidence: outcome.prediction.confidence,
            line: outcome.event.render(),
        }))
        .into_response(),
        Err(e) => error_response::<ClassifyResponse>(e),
    }
}

/// GET /api/history?filter=&order=&search=
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let service = state.service.clone();
    match run_blocking(move || service.list_history(&query)).await {
        Ok(lines) => Json(ApiResponse::success(HistoryResponse {
            count: lines.len(),
            lines,
        }))
        .into_response(),
        Err(e) => error_response::<HistoryResponse>(e),
    }
}

/// DELETE /api/history
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Response {
    let service = state.service.clone();
    match run_blocking(move || service.clear_history()).await {
        Ok(()) => {
            info!("History cleared via API");
            Json(ApiResponse::success("History cleared".to_string())).into_response()
        }
        Err(e) => error_response::<String>(e),
    }
}

/// GET /api/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    let service = state.service.clone();
    match run_blocking(move || service.summarize()).await {
        Ok(summary) => {
            let has_data = summary.has_data();
            let stats = SpamStats::from(summary);
            Json(ApiResponse::success(StatsResponse {
                total: stats.total,
                spam_count: stats.spam_count,
                ham_count: stats.ham_count,
                spam_percentage: stats.spam_percentage,
                has_data,
            }))
            .into_response()
        }
        Err(e) => error_response::<StatsResponse>(e),
    }
}
