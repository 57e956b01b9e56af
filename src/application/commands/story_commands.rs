//! Story Commands

use crate::domain::story::{NavDirection, StoryPrompt};

/// 开始新故事命令
#[derive(Debug, Clone)]
pub struct StartStoryCommand {
    pub prompt: StoryPrompt,
}

/// 翻页命令
#[derive(Debug, Clone, Copy)]
pub struct NavigateCommand {
    pub direction: NavDirection,
}

/// 播放页面朗读命令
#[derive(Debug, Clone, Copy)]
pub struct PlayPageCommand {
    pub page_index: usize,
}
