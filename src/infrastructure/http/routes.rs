//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                     GET   健康检查
//! - /api/story/start              POST  开始新故事（后台生成）
//! - /api/story/navigate           POST  翻页（越过边界时生成下一页）
//! - /api/story/play               POST  重新播放页面朗读
//! - /api/story/get                GET   当前故事快照
//! - /api/story/audio/:page_index  GET   页面朗读音频（wav | pcm）
//! - /ws/events                    WS    故事事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/story", story_routes())
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_story))
        .route("/navigate", post(handlers::navigate))
        .route("/play", post(handlers::play_page))
        .route("/get", get(handlers::get_story))
        .route("/audio/:page_index", get(handlers::get_page_audio))
}
