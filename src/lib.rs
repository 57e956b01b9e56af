//! Storyweaver - 儿童绘本故事生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Story Context: 页面序列、阅读位置、加载标记
//! - Audio: PCM16 解码与音频缓冲区
//!
//! 应用层 (application/):
//! - Ports: GenerationGateway, AudioOutput, AudioEncoder
//! - Orchestrator: 文本 → 插图/语音 → 自动播放
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Adapters: Gemini Client, Fake Gateway, WAV Encoder, Event Audio Output
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
