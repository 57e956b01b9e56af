//! Story HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    ApplicationError, GetStory, NavigateCommand, NavigateResponse, PlayPageCommand,
    PlayPageResponse, StartStoryCommand, StoryView,
};
use crate::domain::story::{NavDirection, StoryPrompt};
use crate::infrastructure::http::dto::{
    ApiResponse, NavigateRequest, PlayPageRequest, StartStoryAccepted, StartStoryRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 开始新故事（后台生成，立即返回，进度通过 WS 推送）
pub async fn start_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartStoryRequest>,
) -> Result<Json<ApiResponse<StartStoryAccepted>>, ApiError> {
    let prompt = StoryPrompt::new(&req.prompt).map_err(ApplicationError::from)?;
    let accepted = StartStoryAccepted {
        status: "generating",
        prompt: prompt.as_str().to_string(),
    };

    let state_clone = state.clone();
    tokio::spawn(async move {
        match state_clone
            .start_story_handler
            .handle(StartStoryCommand { prompt })
            .await
        {
            Ok(result) => {
                tracing::info!(
                    story_id = %result.story_id,
                    page_count = result.page_count,
                    "Story opening page ready"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Story could not be started");
            }
        }
    });

    Ok(Json(ApiResponse::success(accepted)))
}

/// 翻页
pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<ApiResponse<NavigateResponse>>, ApiError> {
    let direction = req
        .direction
        .parse::<NavDirection>()
        .map_err(ApplicationError::from)?;

    let result = state
        .navigate_handler
        .handle(NavigateCommand { direction })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 重新播放页面朗读
pub async fn play_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayPageRequest>,
) -> Result<Json<ApiResponse<PlayPageResponse>>, ApiError> {
    let result = state
        .play_page_handler
        .handle(PlayPageCommand {
            page_index: req.page_index,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 当前故事快照；尚未开始时 data 为 null
pub async fn get_story(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<StoryView>>>, ApiError> {
    let view = state.get_story_handler.handle(GetStory).await?;
    Ok(Json(ApiResponse::success(view)))
}
