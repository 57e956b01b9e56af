//! Audio Encoder Port - 音频编码抽象
//!
//! 将页面的解码缓冲区重新编码为客户端可下载的格式

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AudioBuffer;

/// 编码错误
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// 音频输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 16 位 PCM WAV
    #[default]
    Wav,
    /// 原始 PCM16 LE（与语音服务返回的格式相同）
    Pcm,
}

impl AudioFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Pcm => "audio/L16",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Wav => write!(f, "wav"),
            AudioFormat::Pcm => write!(f, "pcm"),
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "pcm" => Ok(AudioFormat::Pcm),
            _ => Err(EncodeError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 编码结果
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    /// 编码后的音频数据
    pub audio_data: Vec<u8>,
    /// 输出格式
    pub format: AudioFormat,
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
}

/// Audio Encoder Port
pub trait AudioEncoderPort: Send + Sync {
    /// 编码音频
    fn encode(&self, buffer: &AudioBuffer, format: AudioFormat) -> Result<EncodedAudio, EncodeError>;

    /// 检查是否支持指定格式
    fn supports_format(&self, format: AudioFormat) -> bool;
}
