use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::AppState;
use crate::cookies::CookieJarStatus;
use crate::PipelineError;

/// API information and available endpoints
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "YouTube Transcript API",
        "description": "Extract video info and transcripts from YouTube videos",
        "endpoints": {
            "GET /transcript/{video_id}": "Get video info and transcript",
            "GET /video-info/{video_id}": "Get video metadata with timestamped captions",
            "GET /cookies/status": "Inspect the cookies file used for authentication",
            "GET /health": "Health check"
        },
        "example": "/transcript/dQw4w9WgXcQ",
        "note": "Video ID is the part after 'v=' in YouTube URL"
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "message": "YouTube Transcript API is running"
    }))
}

pub async fn transcript(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    match state.pipeline.transcript(&video_id).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => rejection(err),
    }
}

pub async fn video_info(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    match state.pipeline.video_info(&video_id).await {
        Ok(info) => Json(info).into_response(),
        Err(err) => rejection(err),
    }
}

pub async fn cookies_status(State(state): State<AppState>) -> Response {
    match &state.cookies_file {
        Some(path) => Json(CookieJarStatus::inspect(path, chrono::Utc::now())).into_response(),
        None => Json(json!({
            "configured": false,
            "message": "No cookies file configured"
        }))
        .into_response(),
    }
}

// Only identifier validation is rejected at the HTTP level
fn rejection(err: PipelineError) -> Response {
    match err {
        PipelineError::InvalidIdentifier(id) => {
            tracing::debug!("Rejected video id '{}'", id);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "Invalid video ID. Must be 11 characters." })),
            )
                .into_response()
        }
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": other.user_message() })),
        )
            .into_response(),
    }
}
