use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use threadlens_common::ThreadLensError;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub status: &'static str,
    pub error: Option<String>,
}

impl SummarizeResponse {
    fn success(summary: String) -> Self {
        Self {
            summary,
            status: "success",
            error: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            summary: String::new(),
            status: "error",
            error: Some(message),
        }
    }
}

/// HTTP status for a pipeline failure. Client mistakes are 400 and
/// exhausted-retrieval conditions are 503; everything else is reported
/// inside a well-formed 200 response so the extension always gets the
/// documented schema. Upstream errors reaching this point come from
/// the completion path; fallback failures arrive wrapped in
/// `Exhausted`.
fn error_status(err: &ThreadLensError) -> StatusCode {
    match err {
        ThreadLensError::Validation(_) => StatusCode::BAD_REQUEST,
        ThreadLensError::TransientFetch { .. } | ThreadLensError::Exhausted(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ThreadLensError::PermanentFetch { .. }
        | ThreadLensError::Parse(_)
        | ThreadLensError::Upstream(_) => StatusCode::OK,
    }
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SummarizeRequest>,
) -> impl IntoResponse {
    let started = Instant::now();
    info!(url = %body.url, "Summarize request received");

    let thread = match state.retriever.retrieve(&body.url).await {
        Ok(thread) => thread,
        Err(e) => {
            warn!(url = %body.url, error = %e, "Retrieval failed");
            return (
                error_status(&e),
                Json(SummarizeResponse::failure(e.to_string())),
            );
        }
    };

    match state.summarizer.summarize(&thread).await {
        Ok(summary) => {
            info!(
                url = %body.url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Summary generated"
            );
            (StatusCode::OK, Json(SummarizeResponse::success(summary)))
        }
        Err(e) => {
            warn!(url = %body.url, error = %e, "Summarization failed");
            (
                error_status(&e),
                Json(SummarizeResponse::failure(e.to_string())),
            )
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "ThreadLens API",
        "status": "running",
    }))
}
