//! Story Context - Errors

use thiserror::Error;

use super::PageId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryError {
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    #[error("Page generation in progress")]
    GenerationInProgress,

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Page out of order: expected {expected}, got {actual}")]
    PageOutOfOrder { expected: PageId, actual: PageId },
}
