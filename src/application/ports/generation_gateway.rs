//! Generation Gateway Port - 生成式 AI 服务抽象
//!
//! 文本续写（有状态对话）、插图生成、语音合成三类远程调用，
//! 具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::story::ImageRef;

/// 文本生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

/// 对话会话句柄
///
/// 整个故事期间只有一个，通过引用传递，不可复制。
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    instruction: String,
    created_at: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            instruction: instruction.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 插图/语音的生成结果
///
/// 失败不会越过网关边界抛出，而是以 `Failed` 返回。
#[derive(Debug, Clone, PartialEq)]
pub enum AssetOutcome<T> {
    Ready(T),
    Absent,
    Failed(String),
}

impl<T> AssetOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetOutcome::Ready(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            AssetOutcome::Ready(value) => Some(value),
            AssetOutcome::Absent | AssetOutcome::Failed(_) => None,
        }
    }
}

/// Generation Gateway Port
///
/// 外部生成服务的抽象接口，不做重试
#[async_trait]
pub trait GenerationGatewayPort: Send + Sync {
    /// 以固定系统指令开启对话会话
    async fn open_session(&self, instruction: &str) -> Result<SessionHandle, GenerationError>;

    /// 在会话中发送提示词并取回完整文本
    async fn continue_session(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<String, GenerationError>;

    /// 生成插图
    async fn generate_image(&self, prompt: &str) -> AssetOutcome<ImageRef>;

    /// 合成语音，返回原始 PCM16 数据
    async fn generate_speech(&self, prompt: &str) -> AssetOutcome<Vec<u8>>;

    /// 释放会话（新故事开始时调用）
    async fn close_session(&self, _session: &SessionHandle) {}

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
