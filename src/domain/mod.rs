//! Domain Layer - 领域层
//!
//! - Story Context: 故事、页面与翻页
//! - Audio: 语音数据解码

pub mod audio;
pub mod story;

pub use audio::{decode_pcm16, AudioBuffer, AudioDecodeError, SPEECH_SAMPLE_RATE};
