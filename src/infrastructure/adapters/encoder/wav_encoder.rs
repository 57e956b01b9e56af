//! WAV Encoder - 页面音频下载编码
//!
//! 将解码后的 f32 缓冲区还原为 PCM16，可选包装 44 字节 RIFF 头

use crate::application::ports::{AudioEncoderPort, AudioFormat, EncodeError, EncodedAudio};
use crate::domain::AudioBuffer;

const BITS_PER_SAMPLE: u16 = 16;
const WAV_HEADER_LEN: usize = 44;

/// WAV/PCM 编码器
#[derive(Debug, Clone, Default)]
pub struct WavEncoder;

impl WavEncoder {
    pub fn new() -> Self {
        Self
    }

    /// f32 样本还原为 PCM16 LE；与解码时的 /32768 对称
    fn encode_pcm(samples: &[f32]) -> Vec<u8> {
        let mut pcm = Vec::with_capacity(samples.len() * 2);
        for &s in samples {
            let value = (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            pcm.extend_from_slice(&value.to_le_bytes());
        }
        pcm
    }

    fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>, EncodeError> {
        let num_channels = buffer.channels() as u16;
        let sample_rate = buffer.sample_rate();
        let byte_rate = sample_rate * num_channels as u32 * (BITS_PER_SAMPLE / 8) as u32;
        let block_align = num_channels * (BITS_PER_SAMPLE / 8);

        let pcm_data = Self::encode_pcm(buffer.samples());
        let data_size = u32::try_from(pcm_data.len())
            .map_err(|_| EncodeError::InvalidInput("audio too long for WAV".to_string()))?;
        let file_size = 36 + data_size;

        let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm_data.len());

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&file_size.to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_size.to_le_bytes());
        wav.extend_from_slice(&pcm_data);

        Ok(wav)
    }
}

impl AudioEncoderPort for WavEncoder {
    fn encode(&self, buffer: &AudioBuffer, format: AudioFormat) -> Result<EncodedAudio, EncodeError> {
        if buffer.sample_rate() == 0 {
            return Err(EncodeError::InvalidInput("sample rate is zero".to_string()));
        }

        let audio_data = match format {
            AudioFormat::Wav => Self::encode_wav(buffer)?,
            AudioFormat::Pcm => Self::encode_pcm(buffer.samples()),
        };

        Ok(EncodedAudio {
            audio_data,
            format,
            duration_ms: buffer.duration_ms(),
            sample_rate: buffer.sample_rate(),
        })
    }

    fn supports_format(&self, format: AudioFormat) -> bool {
        matches!(format, AudioFormat::Wav | AudioFormat::Pcm)
    }
}
