//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{EncodeError, PlaybackError};
use crate::domain::story::StoryError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 无法开启对话会话（故事无法开始）
    #[error("Session error: {0}")]
    SessionError(String),

    /// 文本生成失败（仅中止当前页面）
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// 播放失败
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

impl From<StoryError> for ApplicationError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::InvalidPrompt(_) | StoryError::InvalidDirection(_) => {
                Self::ValidationError(err.to_string())
            }
            StoryError::PageNotFound(id) => Self::not_found("Page", id),
            StoryError::GenerationInProgress | StoryError::PageOutOfOrder { .. } => {
                Self::InvalidState(err.to_string())
            }
        }
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        Self::PlaybackError(err.to_string())
    }
}

impl From<EncodeError> for ApplicationError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnsupportedFormat(_) => Self::ValidationError(err.to_string()),
            EncodeError::InvalidInput(_) => Self::InternalError(err.to_string()),
        }
    }
}
