//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    NavigateHandler, PlayPageHandler, StartStoryHandler,
    // Query handlers
    GetPageAudioHandler, GetStoryHandler,
    // Orchestration
    AudioEncoderPort, StoryOrchestrator,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    pub orchestrator: Arc<StoryOrchestrator>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub start_story_handler: StartStoryHandler,
    pub navigate_handler: NavigateHandler,
    pub play_page_handler: PlayPageHandler,

    // ========== Query Handlers ==========
    pub get_story_handler: GetStoryHandler,
    pub get_page_audio_handler: GetPageAudioHandler,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<StoryOrchestrator>,
        encoder: Arc<dyn AudioEncoderPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.clone(),
            event_publisher,

            start_story_handler: StartStoryHandler::new(orchestrator.clone()),
            navigate_handler: NavigateHandler::new(orchestrator.clone()),
            play_page_handler: PlayPageHandler::new(orchestrator.clone()),

            get_story_handler: GetStoryHandler::new(orchestrator.clone()),
            get_page_audio_handler: GetPageAudioHandler::new(orchestrator, encoder),
        }
    }
}
