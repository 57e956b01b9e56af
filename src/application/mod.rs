//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（GenerationGateway、AudioOutput、AudioEncoder）
//! - orchestrator: 页面生成流程与故事状态
//! - playback: 独占式播放控制
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod orchestrator;
pub mod playback;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{
        NavigateHandler, NavigateResponse, PlayPageHandler, PlayPageResponse, StartStoryHandler,
        StartStoryResponse,
    },
    NavigateCommand, PlayPageCommand, StartStoryCommand,
};

pub use error::ApplicationError;

pub use orchestrator::{Navigation, StoryOrchestrator, StoryOrchestratorConfig};

pub use playback::PlaybackController;

pub use ports::{
    // Generation gateway
    AssetOutcome,
    GenerationError,
    GenerationGatewayPort,
    SessionHandle,
    // Audio output
    AudioOutputPort,
    PlaybackError,
    PlaybackHandle,
    // Audio encoder
    AudioEncoderPort,
    AudioFormat,
    EncodeError,
    EncodedAudio,
};

pub use queries::{
    handlers::{GetPageAudioHandler, GetStoryHandler},
    GetPageAudio, GetPageAudioResponse, GetStory, PageView, StoryView,
};
