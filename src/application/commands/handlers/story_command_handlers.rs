//! Story Command Handlers

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{NavigateCommand, PlayPageCommand, StartStoryCommand};
use crate::application::error::ApplicationError;
use crate::application::orchestrator::StoryOrchestrator;
use crate::domain::story::{NavigationOutcome, PageId};

// ============================================================================
// StartStory
// ============================================================================

/// 开始故事响应（第一页已就绪）
#[derive(Debug, Clone, Serialize)]
pub struct StartStoryResponse {
    pub story_id: Uuid,
    pub page_count: usize,
}

/// StartStory Handler
pub struct StartStoryHandler {
    orchestrator: Arc<StoryOrchestrator>,
}

impl StartStoryHandler {
    pub fn new(orchestrator: Arc<StoryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        command: StartStoryCommand,
    ) -> Result<StartStoryResponse, ApplicationError> {
        let story_id = self.orchestrator.start_story(command.prompt).await?;
        let page_count = self
            .orchestrator
            .story()
            .await
            .filter(|story| story.id() == &story_id)
            .map(|story| story.page_count())
            .unwrap_or(0);

        Ok(StartStoryResponse {
            story_id: *story_id.as_uuid(),
            page_count,
        })
    }
}

// ============================================================================
// Navigate
// ============================================================================

/// 翻页响应
#[derive(Debug, Clone, Serialize)]
pub struct NavigateResponse {
    pub outcome: &'static str,
    pub position: usize,
    /// 越过边界时正在生成的页面
    pub generating_page: Option<usize>,
}

/// Navigate Handler - 越过边界时新页面在后台生成
pub struct NavigateHandler {
    orchestrator: Arc<StoryOrchestrator>,
}

impl NavigateHandler {
    pub fn new(orchestrator: Arc<StoryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        command: NavigateCommand,
    ) -> Result<NavigateResponse, ApplicationError> {
        let navigation = self.orchestrator.advance_page(command.direction).await?;

        let generating_page = match navigation.outcome {
            NavigationOutcome::Frontier { index } => Some(index.index()),
            _ => None,
        };

        Ok(NavigateResponse {
            outcome: navigation.outcome.as_str(),
            position: navigation.position,
            generating_page,
        })
    }
}

// ============================================================================
// PlayPage
// ============================================================================

/// 播放响应
#[derive(Debug, Clone, Serialize)]
pub struct PlayPageResponse {
    pub page_index: usize,
    pub duration_ms: u64,
    pub audio_url: String,
}

/// PlayPage Handler
pub struct PlayPageHandler {
    orchestrator: Arc<StoryOrchestrator>,
}

impl PlayPageHandler {
    pub fn new(orchestrator: Arc<StoryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        command: PlayPageCommand,
    ) -> Result<PlayPageResponse, ApplicationError> {
        let page_id = PageId::new(command.page_index);
        let duration_ms = self.orchestrator.play_page(page_id).await?;

        tracing::info!(page_id = %page_id, duration_ms = duration_ms, "Page replay requested");

        Ok(PlayPageResponse {
            page_index: command.page_index,
            duration_ms,
            audio_url: format!("/api/story/audio/{}", command.page_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::orchestrator::test_support::ScriptedGateway;
    use crate::application::orchestrator::StoryOrchestratorConfig;
    use crate::application::playback::test_support::RecordingOutput;
    use crate::application::playback::PlaybackController;
    use crate::domain::story::{NavDirection, StoryPrompt};
    use crate::infrastructure::events::EventPublisher;

    fn orchestrator(texts: Vec<Result<&str, &str>>) -> Arc<StoryOrchestrator> {
        Arc::new(StoryOrchestrator::new(
            StoryOrchestratorConfig::default(),
            Arc::new(ScriptedGateway::new(texts)),
            Arc::new(PlaybackController::new(Arc::new(RecordingOutput::default()))),
            Arc::new(EventPublisher::new()),
        ))
    }

    #[tokio::test]
    async fn test_start_story_handler() {
        let orchestrator = orchestrator(vec![Ok("page one")]);
        let handler = StartStoryHandler::new(orchestrator.clone());

        let response = handler
            .handle(StartStoryCommand {
                prompt: StoryPrompt::new("a lost kitten").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(response.page_count, 1);
        let story = orchestrator.story().await.unwrap();
        assert_eq!(story.id().as_uuid(), &response.story_id);
    }

    #[tokio::test]
    async fn test_navigate_handler_reports_frontier() {
        let orchestrator = orchestrator(vec![Ok("page one"), Ok("page two")]);
        StartStoryHandler::new(orchestrator.clone())
            .handle(StartStoryCommand {
                prompt: StoryPrompt::new("a lost kitten").unwrap(),
            })
            .await
            .unwrap();

        let handler = NavigateHandler::new(orchestrator.clone());
        let response = handler
            .handle(NavigateCommand {
                direction: NavDirection::Next,
            })
            .await
            .unwrap();

        assert_eq!(response.outcome, "frontier");
        assert_eq!(response.position, 1);
        assert_eq!(response.generating_page, Some(1));
    }

    #[tokio::test]
    async fn test_play_unknown_page() {
        let orchestrator = orchestrator(vec![Ok("page one")]);
        StartStoryHandler::new(orchestrator.clone())
            .handle(StartStoryCommand {
                prompt: StoryPrompt::new("a lost kitten").unwrap(),
            })
            .await
            .unwrap();

        let handler = PlayPageHandler::new(orchestrator);
        let result = handler.handle(PlayPageCommand { page_index: 3 }).await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));

        let response = handler
            .handle(PlayPageCommand { page_index: 0 })
            .await
            .unwrap();
        assert_eq!(response.audio_url, "/api/story/audio/0");
        assert_eq!(response.duration_ms, 1000);
    }
}
