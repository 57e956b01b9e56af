//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_encoder;
mod audio_output;
mod generation_gateway;

pub use audio_encoder::{AudioEncoderPort, AudioFormat, EncodeError, EncodedAudio};
pub use audio_output::{AudioOutputPort, PlaybackError, PlaybackHandle};
pub use generation_gateway::{AssetOutcome, GenerationError, GenerationGatewayPort, SessionHandle};
