//! Audio - PCM16 解码
//!
//! 语音合成服务返回 16 位有符号小端、单声道、固定采样率的原始 PCM 数据，
//! 这里将其转换为归一化的 f32 样本缓冲区。

use std::sync::Arc;
use thiserror::Error;

/// 语音合成输出的固定采样率（Hz）
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// PCM16 归一化除数
const PCM16_SCALE: f32 = 32768.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioDecodeError {
    #[error("PCM16 payload has odd length: {0} bytes")]
    OddLength(usize),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// 已解码的单声道音频缓冲区
///
/// 样本以 `Arc<[f32]>` 共享，页面与播放控制器持有同一份数据。
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 时长（毫秒）
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}

/// 解码 PCM16 LE 单声道数据
///
/// 每个样本除以 32768 映射到 [-1.0, 1.0)。奇数长度的输入会被拒绝。
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32) -> Result<AudioBuffer, AudioDecodeError> {
    if sample_rate == 0 {
        return Err(AudioDecodeError::InvalidSampleRate(sample_rate));
    }
    if bytes.len() % 2 != 0 {
        return Err(AudioDecodeError::OddLength(bytes.len()));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect();

    Ok(AudioBuffer::new(samples, sample_rate))
}
