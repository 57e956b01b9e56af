//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod encoder;
pub mod generation;
pub mod playback;

pub use encoder::*;
pub use generation::*;
pub use playback::*;
