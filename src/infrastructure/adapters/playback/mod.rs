//! Audio Output 适配器

mod event_audio_output;

pub use event_audio_output::EventAudioOutput;
