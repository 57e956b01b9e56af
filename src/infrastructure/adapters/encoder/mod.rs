//! Audio Encoder 适配器

mod wav_encoder;

pub use wav_encoder::WavEncoder;
