//! Story Context - 故事限界上下文
//!
//! 职责:
//! - 故事聚合管理（页面序列、阅读位置、加载标记）
//! - 页面实体
//! - 翻页规则

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{NavigationOutcome, Story};
pub use entities::Page;
pub use errors::StoryError;
pub use value_objects::{ImageRef, LoadingState, NavDirection, PageId, StoryId, StoryPrompt};
