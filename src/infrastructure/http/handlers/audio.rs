//! Audio Handlers - 页面朗读音频下载

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use crate::application::{AudioFormat, GetPageAudio};
use crate::infrastructure::http::dto::AudioParams;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// GET /api/story/audio/:page_index?format=wav|pcm
pub async fn get_page_audio(
    State(state): State<Arc<AppState>>,
    Path(page_index): Path<usize>,
    Query(params): Query<AudioParams>,
) -> Result<Response, ApiError> {
    let format = match params.format.as_deref() {
        Some(format) => format
            .parse::<AudioFormat>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => AudioFormat::default(),
    };

    let result = state
        .get_page_audio_handler
        .handle(GetPageAudio { page_index, format })
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.audio_data.len())
        .header("X-Audio-Duration-Ms", result.duration_ms)
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
