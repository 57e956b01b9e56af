//! Story Queries - 故事读取

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::AudioFormat;
use crate::domain::story::{LoadingState, Page, Story};

/// 获取当前故事快照
#[derive(Debug, Clone, Default)]
pub struct GetStory;

/// 获取页面朗读音频
#[derive(Debug, Clone)]
pub struct GetPageAudio {
    pub page_index: usize,
    pub format: AudioFormat,
}

/// 页面视图（供渲染层使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub id: usize,
    pub text: String,
    pub image_url: Option<String>,
    pub has_audio: bool,
    pub duration_ms: Option<u64>,
}

impl From<&Page> for PageView {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id().index(),
            text: page.text().to_string(),
            image_url: page.image().map(|image| image.as_str().to_string()),
            has_audio: page.has_audio(),
            duration_ms: page.audio().map(|audio| audio.duration_ms()),
        }
    }
}

/// 故事视图
#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    pub story_id: Uuid,
    pub prompt: String,
    pub position: usize,
    pub page_count: usize,
    pub loading: LoadingState,
    pub pages: Vec<PageView>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Story> for StoryView {
    fn from(story: &Story) -> Self {
        Self {
            story_id: *story.id().as_uuid(),
            prompt: story.prompt().as_str().to_string(),
            position: story.position(),
            page_count: story.page_count(),
            loading: story.loading(),
            pages: story.pages().iter().map(PageView::from).collect(),
            created_at: story.created_at().to_rfc3339(),
            updated_at: story.updated_at().to_rfc3339(),
        }
    }
}

/// 页面音频响应
#[derive(Debug, Clone)]
pub struct GetPageAudioResponse {
    pub audio_data: Vec<u8>,
    pub content_type: &'static str,
    pub duration_ms: u64,
}
