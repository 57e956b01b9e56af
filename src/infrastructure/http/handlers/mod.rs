//! HTTP Handlers

mod audio;
mod ping;
mod story;
mod websocket;

pub use audio::*;
pub use ping::*;
pub use story::*;
pub use websocket::*;
