//! Story Context - Entities

use super::{ImageRef, PageId};
use crate::domain::audio::AudioBuffer;

/// 故事页面 - 最小阅读单位
///
/// 不变量:
/// - id 在故事内唯一，等于其阅读顺序
/// - 先以纯文本创建，插图与朗读音频随后原地补全
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: PageId,
    text: String,
    image: Option<ImageRef>,
    audio: Option<AudioBuffer>,
}

impl Page {
    pub fn new(id: PageId, text: String) -> Self {
        Self {
            id,
            text,
            image: None,
            audio: None,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioBuffer> {
        self.audio.as_ref()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub(super) fn set_image(&mut self, image: Option<ImageRef>) {
        self.image = image;
    }

    pub(super) fn set_audio(&mut self, audio: Option<AudioBuffer>) {
        self.audio = audio;
    }
}
