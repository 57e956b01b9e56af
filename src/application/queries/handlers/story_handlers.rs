//! Story Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::orchestrator::StoryOrchestrator;
use crate::application::ports::AudioEncoderPort;
use crate::application::queries::{GetPageAudio, GetPageAudioResponse, GetStory, StoryView};
use crate::domain::story::PageId;

/// GetStory Handler - 当前故事快照，未开始时为 None
pub struct GetStoryHandler {
    orchestrator: Arc<StoryOrchestrator>,
}

impl GetStoryHandler {
    pub fn new(orchestrator: Arc<StoryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(&self, _query: GetStory) -> Result<Option<StoryView>, ApplicationError> {
        Ok(self
            .orchestrator
            .story()
            .await
            .as_ref()
            .map(StoryView::from))
    }
}

/// GetPageAudio Handler - 重新编码页面音频
pub struct GetPageAudioHandler {
    orchestrator: Arc<StoryOrchestrator>,
    encoder: Arc<dyn AudioEncoderPort>,
}

impl GetPageAudioHandler {
    pub fn new(orchestrator: Arc<StoryOrchestrator>, encoder: Arc<dyn AudioEncoderPort>) -> Self {
        Self {
            orchestrator,
            encoder,
        }
    }

    pub async fn handle(
        &self,
        query: GetPageAudio,
    ) -> Result<GetPageAudioResponse, ApplicationError> {
        if !self.encoder.supports_format(query.format) {
            return Err(ApplicationError::validation(format!(
                "Unsupported audio format: {}",
                query.format
            )));
        }

        let buffer = self
            .orchestrator
            .page_audio(PageId::new(query.page_index))
            .await?;
        let encoded = self.encoder.encode(&buffer, query.format)?;

        tracing::debug!(
            page_index = query.page_index,
            format = %encoded.format,
            bytes = encoded.audio_data.len(),
            "Page audio encoded"
        );

        Ok(GetPageAudioResponse {
            audio_data: encoded.audio_data,
            content_type: encoded.format.content_type(),
            duration_ms: encoded.duration_ms,
        })
    }
}
