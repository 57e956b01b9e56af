//! Audio Output Port - 音频输出抽象
//!
//! 播放控制器通过此端口启动播放，每次启动得到一个独立的播放句柄

use thiserror::Error;

use crate::domain::story::PageId;
use crate::domain::AudioBuffer;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),
}

/// 正在发声的播放句柄
pub trait PlaybackHandle: Send + Sync {
    /// 所播放的页面
    fn page_id(&self) -> PageId;

    /// 停止播放；已自然结束或已停止的句柄调用时为空操作
    fn stop(&mut self);

    /// 是否已结束（自然结束或被停止）
    fn is_finished(&self) -> bool;
}

/// Audio Output Port
pub trait AudioOutputPort: Send + Sync {
    /// 从零偏移开始播放缓冲区
    fn start(
        &self,
        page_id: PageId,
        buffer: &AudioBuffer,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}
