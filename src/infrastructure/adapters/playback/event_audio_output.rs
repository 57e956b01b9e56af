//! Event Audio Output - 通过事件流驱动远程播放
//!
//! 服务端不直接发声：开始播放时推送 PlaybackStarted（附带音频下载地址），
//! 客户端据此播放；停止未结束的句柄时推送 PlaybackStopped。

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{AudioOutputPort, PlaybackError, PlaybackHandle};
use crate::domain::story::PageId;
use crate::domain::AudioBuffer;
use crate::infrastructure::events::EventPublisher;

/// 基于事件推送的音频输出
pub struct EventAudioOutput {
    events: Arc<EventPublisher>,
}

impl EventAudioOutput {
    pub fn new(events: Arc<EventPublisher>) -> Self {
        Self { events }
    }
}

impl AudioOutputPort for EventAudioOutput {
    fn start(
        &self,
        page_id: PageId,
        buffer: &AudioBuffer,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        if buffer.sample_rate() == 0 {
            return Err(PlaybackError::InvalidBuffer("sample rate is zero".to_string()));
        }

        let duration_ms = buffer.duration_ms();
        self.events.publish_playback_started(page_id, duration_ms);

        Ok(Box::new(EventPlaybackHandle {
            page_id,
            started_at: Instant::now(),
            duration: Duration::from_millis(duration_ms),
            stopped: false,
            events: self.events.clone(),
        }))
    }
}

/// 按时长推算结束时间的播放句柄
struct EventPlaybackHandle {
    page_id: PageId,
    started_at: Instant,
    duration: Duration,
    stopped: bool,
    events: Arc<EventPublisher>,
}

impl PlaybackHandle for EventPlaybackHandle {
    fn page_id(&self) -> PageId {
        self.page_id
    }

    fn stop(&mut self) {
        if self.is_finished() {
            return;
        }
        self.stopped = true;
        self.events.publish_playback_stopped(self.page_id);
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.started_at.elapsed() >= self.duration
    }
}
