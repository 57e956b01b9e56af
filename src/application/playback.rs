//! Playback Controller - 独占式音频播放
//!
//! 任意时刻最多只有一个正在发声的句柄；开始新的播放前总是先停止旧的。

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::{AudioOutputPort, PlaybackError, PlaybackHandle};
use crate::domain::story::PageId;
use crate::domain::AudioBuffer;

/// 播放控制器
pub struct PlaybackController {
    output: Arc<dyn AudioOutputPort>,
    active: Mutex<Option<Box<dyn PlaybackHandle>>>,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutputPort>) -> Self {
        Self {
            output,
            active: Mutex::new(None),
        }
    }

    /// 播放缓冲区，先停止当前句柄
    pub async fn play(&self, page_id: PageId, buffer: &AudioBuffer) -> Result<(), PlaybackError> {
        let mut active = self.active.lock().await;

        if let Some(mut previous) = active.take() {
            tracing::debug!(
                page_id = %previous.page_id(),
                finished = previous.is_finished(),
                "Stopping previous playback"
            );
            previous.stop();
        }

        let handle = self.output.start(page_id, buffer)?;
        *active = Some(handle);

        tracing::info!(
            page_id = %page_id,
            samples = buffer.len(),
            duration_ms = buffer.duration_ms(),
            "Playback started"
        );

        Ok(())
    }

    /// 正在发声的页面
    pub async fn active_page(&self) -> Option<PageId> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .map(|handle| handle.page_id())
    }

    pub async fn is_playing(&self) -> bool {
        self.active_page().await.is_some()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// 播放事件记录
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum OutputEvent {
        Started(PageId),
        Stopped(PageId),
    }

    /// 记录 start/stop 顺序的音频输出
    #[derive(Default)]
    pub struct RecordingOutput {
        pub events: Arc<StdMutex<Vec<OutputEvent>>>,
    }

    impl RecordingOutput {
        pub fn events(&self) -> Vec<OutputEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn started_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, OutputEvent::Started(_)))
                .count()
        }
    }

    struct RecordingHandle {
        page_id: PageId,
        finished: bool,
        events: Arc<StdMutex<Vec<OutputEvent>>>,
    }

    impl PlaybackHandle for RecordingHandle {
        fn page_id(&self) -> PageId {
            self.page_id
        }

        fn stop(&mut self) {
            if self.finished {
                return;
            }
            self.finished = true;
            self.events
                .lock()
                .unwrap()
                .push(OutputEvent::Stopped(self.page_id));
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    impl AudioOutputPort for RecordingOutput {
        fn start(
            &self,
            page_id: PageId,
            buffer: &AudioBuffer,
        ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
            self.events
                .lock()
                .unwrap()
                .push(OutputEvent::Started(page_id));
            Ok(Box::new(RecordingHandle {
                page_id,
                finished: buffer.is_empty(),
                events: self.events.clone(),
            }))
        }
    }
}
