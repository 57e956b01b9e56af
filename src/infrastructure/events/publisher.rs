//! Event Publisher Implementation
//!
//! 故事状态变更事件推送（WebSocket）

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::queries::PageView;
use crate::domain::story::{LoadingState, Page, PageId, Story, StoryId, StoryPrompt};

/// 事件通道容量
const CHANNEL_CAPACITY: usize = 256;

/// 故事事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum StoryEvent {
    /// 故事开始生成
    StoryStarted { story_id: Uuid, prompt: String },
    /// 故事无法开始（回到输入提示状态）
    StoryFailed { story_id: Uuid, error: String },
    /// 加载标记变更
    LoadingChanged {
        story_id: Uuid,
        loading: LoadingState,
    },
    /// 页面内容变更（文本追加或插图/音频落定）
    PageUpdated { story_id: Uuid, page: PageView },
    /// 阅读位置变更
    PositionChanged {
        story_id: Uuid,
        position: usize,
        page_count: usize,
    },
    /// 页面生成失败
    PageFailed {
        story_id: Uuid,
        page_id: usize,
        error: String,
    },
    /// 开始播放
    PlaybackStarted {
        page_id: usize,
        duration_ms: u64,
        audio_url: String,
    },
    /// 停止播放
    PlaybackStopped { page_id: usize },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<StoryEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<StoryEvent> {
        self.channel.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }

    pub fn publish_story_started(&self, story_id: &StoryId, prompt: &StoryPrompt) {
        self.publish(StoryEvent::StoryStarted {
            story_id: *story_id.as_uuid(),
            prompt: prompt.as_str().to_string(),
        });
    }

    pub fn publish_story_failed(&self, story_id: &StoryId, error: &str) {
        self.publish(StoryEvent::StoryFailed {
            story_id: *story_id.as_uuid(),
            error: error.to_string(),
        });
    }

    pub fn publish_loading(&self, story_id: &StoryId, loading: LoadingState) {
        self.publish(StoryEvent::LoadingChanged {
            story_id: *story_id.as_uuid(),
            loading,
        });
    }

    pub fn publish_page_updated(&self, story_id: &StoryId, page: &Page) {
        self.publish(StoryEvent::PageUpdated {
            story_id: *story_id.as_uuid(),
            page: PageView::from(page),
        });
    }

    pub fn publish_position(&self, story: &Story) {
        self.publish(StoryEvent::PositionChanged {
            story_id: *story.id().as_uuid(),
            position: story.position(),
            page_count: story.page_count(),
        });
    }

    pub fn publish_page_failed(&self, story_id: &StoryId, page_id: PageId, error: &str) {
        self.publish(StoryEvent::PageFailed {
            story_id: *story_id.as_uuid(),
            page_id: page_id.index(),
            error: error.to_string(),
        });
    }

    pub fn publish_playback_started(&self, page_id: PageId, duration_ms: u64) {
        self.publish(StoryEvent::PlaybackStarted {
            page_id: page_id.index(),
            duration_ms,
            audio_url: format!("/api/story/audio/{}", page_id),
        });
    }

    pub fn publish_playback_stopped(&self, page_id: PageId) {
        self.publish(StoryEvent::PlaybackStopped {
            page_id: page_id.index(),
        });
    }

    fn publish(&self, event: StoryEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish_playback_started(PageId::new(2), 1500);
        publisher.publish_playback_stopped(PageId::new(2));

        assert_eq!(
            rx.recv().await.unwrap(),
            StoryEvent::PlaybackStarted {
                page_id: 2,
                duration_ms: 1500,
                audio_url: "/api/story/audio/2".to_string(),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StoryEvent::PlaybackStopped { page_id: 2 }
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::new();
        publisher.publish_playback_stopped(PageId::new(0));
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn test_event_json_shape() {
        let event = StoryEvent::LoadingChanged {
            story_id: Uuid::nil(),
            loading: LoadingState::all(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "LoadingChanged");
        assert_eq!(json["data"]["loading"]["text"], true);
        assert_eq!(json["data"]["loading"]["audio"], true);
    }
}
