//! Story Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoryError;

/// 故事唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 页面编号 - 即页面在故事中的顺序位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(usize);

impl PageId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户输入的故事主题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPrompt(String);

impl StoryPrompt {
    pub const MAX_CHARS: usize = 500;

    /// 去除首尾空白后不可为空
    pub fn new(prompt: impl AsRef<str>) -> Result<Self, StoryError> {
        let trimmed = prompt.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StoryError::InvalidPrompt("prompt cannot be empty".to_string()));
        }
        if trimmed.chars().count() > Self::MAX_CHARS {
            return Err(StoryError::InvalidPrompt(format!(
                "prompt cannot exceed {} characters",
                Self::MAX_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 插图引用（data URL 或普通 URL），可直接交给渲染层
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// 由 base64 编码的图片数据构造 data URL
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 翻页方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Prev,
    Next,
}

impl std::fmt::Display for NavDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavDirection::Prev => write!(f, "prev"),
            NavDirection::Next => write!(f, "next"),
        }
    }
}

impl std::str::FromStr for NavDirection {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prev" => Ok(NavDirection::Prev),
            "next" => Ok(NavDirection::Next),
            _ => Err(StoryError::InvalidDirection(s.to_string())),
        }
    }
}

/// 三项加载标记
///
/// 生成页面期间全部为 true，各子结果落定后分别清除。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadingState {
    pub text: bool,
    pub image: bool,
    pub audio: bool,
}

impl LoadingState {
    pub fn all() -> Self {
        Self {
            text: true,
            image: true,
            audio: true,
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.text || self.image || self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_trimmed() {
        let prompt = StoryPrompt::new("  a brave little rocket \n").unwrap();
        assert_eq!(prompt.as_str(), "a brave little rocket");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert!(StoryPrompt::new("   \t").is_err());
        assert!(StoryPrompt::new("").is_err());
    }

    #[test]
    fn test_overlong_prompt_rejected() {
        let long = "a".repeat(StoryPrompt::MAX_CHARS + 1);
        assert!(StoryPrompt::new(long).is_err());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("prev".parse::<NavDirection>().unwrap(), NavDirection::Prev);
        assert_eq!("NEXT".parse::<NavDirection>().unwrap(), NavDirection::Next);
        assert!("sideways".parse::<NavDirection>().is_err());
    }

    #[test]
    fn test_image_data_url() {
        let image = ImageRef::from_base64("image/png", "AAAA");
        assert_eq!(image.as_str(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_loading_state() {
        assert!(LoadingState::all().is_generating());
        assert!(!LoadingState::idle().is_generating());

        let partial = LoadingState {
            text: false,
            image: false,
            audio: true,
        };
        assert!(partial.is_generating());
    }
}
