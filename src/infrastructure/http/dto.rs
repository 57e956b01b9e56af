//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Story DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartStoryRequest {
    pub prompt: String,
}

/// 开始故事响应：生成在后台进行，进度通过 /ws/events 推送
#[derive(Debug, Serialize)]
pub struct StartStoryAccepted {
    pub status: &'static str,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    /// "prev" | "next"
    pub direction: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayPageRequest {
    pub page_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AudioParams {
    /// "wav"（默认）| "pcm"
    #[serde(default)]
    pub format: Option<String>,
}
