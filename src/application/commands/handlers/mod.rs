//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod story_command_handlers;

pub use story_command_handlers::*;
