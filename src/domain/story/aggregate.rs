//! Story Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{ImageRef, LoadingState, NavDirection, Page, PageId, StoryError, StoryId, StoryPrompt};
use crate::domain::audio::AudioBuffer;

/// 翻页结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 移动到已生成的页面
    Moved { position: usize },
    /// 位置不变（第一页再向前）
    Unchanged { position: usize },
    /// 越过边界，需要生成新页面
    Frontier { index: PageId },
}

impl NavigationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationOutcome::Moved { .. } => "moved",
            NavigationOutcome::Unchanged { .. } => "unchanged",
            NavigationOutcome::Frontier { .. } => "frontier",
        }
    }
}

/// Story 聚合根
///
/// 不变量:
/// - 页面只追加，不删除；id 等于其在序列中的位置
/// - 存在页面时 `position < pages.len()`，生成下一页期间可暂时等于 `pages.len()`
/// - 生成期间禁止翻页
#[derive(Debug, Clone)]
pub struct Story {
    id: StoryId,
    prompt: StoryPrompt,
    pages: Vec<Page>,
    position: usize,
    loading: LoadingState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Story {
    /// 创建新故事，第一页立即进入生成状态
    pub fn new(prompt: StoryPrompt) -> Self {
        let now = Utc::now();
        Self {
            id: StoryId::new(),
            prompt,
            pages: Vec::new(),
            position: 0,
            loading: LoadingState::all(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 追加新页面（只有文本），清除 text 加载标记
    pub fn append_page(&mut self, id: PageId, text: String) -> Result<&Page, StoryError> {
        let expected = self.next_page_id();
        if id != expected {
            return Err(StoryError::PageOutOfOrder {
                expected,
                actual: id,
            });
        }

        self.pages.push(Page::new(id, text));
        self.loading.text = false;
        self.touch();

        Ok(&self.pages[id.index()])
    }

    /// 写入插图结果（可能缺失），清除 image 加载标记
    pub fn settle_image(&mut self, id: PageId, image: Option<ImageRef>) -> Result<(), StoryError> {
        self.loading.image = false;
        let page = self
            .pages
            .get_mut(id.index())
            .ok_or(StoryError::PageNotFound(id))?;
        page.set_image(image);
        self.touch();
        Ok(())
    }

    /// 写入朗读音频结果（可能缺失），清除 audio 加载标记
    pub fn settle_audio(&mut self, id: PageId, audio: Option<AudioBuffer>) -> Result<(), StoryError> {
        self.loading.audio = false;
        let page = self
            .pages
            .get_mut(id.index())
            .ok_or(StoryError::PageNotFound(id))?;
        page.set_audio(audio);
        self.touch();
        Ok(())
    }

    /// 开始生成页面
    pub fn begin_generation(&mut self) {
        self.loading = LoadingState::all();
        self.touch();
    }

    /// 直接请求生成 index 页：故事必须空闲且 index 等于已有页数
    pub fn reserve_page(&mut self, index: PageId) -> Result<(), StoryError> {
        if self.loading.is_generating() {
            return Err(StoryError::GenerationInProgress);
        }
        let expected = self.next_page_id();
        if index != expected {
            return Err(StoryError::PageOutOfOrder {
                expected,
                actual: index,
            });
        }
        self.begin_generation();
        Ok(())
    }

    /// 页面的所有请求均已落定
    pub fn finish_generation(&mut self) {
        self.loading = LoadingState::idle();
        self.touch();
    }

    /// 文本生成失败：清除加载标记，并将阅读位置退回最后一个已存在的页面
    pub fn abort_generation(&mut self) {
        self.loading = LoadingState::idle();
        if !self.pages.is_empty() && self.position >= self.pages.len() {
            self.position = self.pages.len() - 1;
        }
        self.touch();
    }

    /// 翻页
    ///
    /// 到达边界时向前推进位置并进入生成状态，由调用方负责生成该页面。
    pub fn navigate(&mut self, direction: NavDirection) -> Result<NavigationOutcome, StoryError> {
        if self.loading.is_generating() {
            return Err(StoryError::GenerationInProgress);
        }

        let outcome = match direction {
            NavDirection::Prev => {
                if self.position > 0 {
                    self.position -= 1;
                    NavigationOutcome::Moved {
                        position: self.position,
                    }
                } else {
                    NavigationOutcome::Unchanged {
                        position: self.position,
                    }
                }
            }
            NavDirection::Next => {
                let next = self.position + 1;
                if next < self.pages.len() {
                    self.position = next;
                    NavigationOutcome::Moved { position: next }
                } else {
                    self.position = next;
                    self.loading = LoadingState::all();
                    NavigationOutcome::Frontier {
                        index: PageId::new(next),
                    }
                }
            }
        };

        self.touch();
        Ok(outcome)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> &StoryId {
        &self.id
    }

    pub fn prompt(&self) -> &StoryPrompt {
        &self.prompt
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.index())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 下一个将被追加的页面 id（即边界）
    pub fn next_page_id(&self) -> PageId {
        PageId::new(self.pages.len())
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// 当前页面；生成下一页期间为 None
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.position)
    }

    pub fn loading(&self) -> LoadingState {
        self.loading
    }

    pub fn is_generating(&self) -> bool {
        self.loading.is_generating()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_with_pages(count: usize) -> Story {
        let mut story = Story::new(StoryPrompt::new("a brave little rocket").unwrap());
        for i in 0..count {
            story.append_page(PageId::new(i), format!("page {}", i)).unwrap();
            story.settle_image(PageId::new(i), None).unwrap();
            story.settle_audio(PageId::new(i), None).unwrap();
            story.finish_generation();
        }
        story
    }

    #[test]
    fn test_new_story_is_generating() {
        let story = Story::new(StoryPrompt::new("dragons").unwrap());
        assert_eq!(story.loading(), LoadingState::all());
        assert_eq!(story.page_count(), 0);
        assert!(story.current_page().is_none());
    }

    #[test]
    fn test_append_clears_text_flag_only() {
        let mut story = Story::new(StoryPrompt::new("dragons").unwrap());
        story.append_page(PageId::new(0), "Once upon a time".to_string()).unwrap();

        let loading = story.loading();
        assert!(!loading.text);
        assert!(loading.image);
        assert!(loading.audio);
        assert_eq!(story.current_page().unwrap().text(), "Once upon a time");
    }

    #[test]
    fn test_append_out_of_order_rejected() {
        let mut story = Story::new(StoryPrompt::new("dragons").unwrap());
        let result = story.append_page(PageId::new(1), "skipped".to_string());
        assert_eq!(
            result.unwrap_err(),
            StoryError::PageOutOfOrder {
                expected: PageId::new(0),
                actual: PageId::new(1),
            }
        );
    }

    #[test]
    fn test_settle_assets_clears_flags() {
        let mut story = Story::new(StoryPrompt::new("dragons").unwrap());
        story.append_page(PageId::new(0), "text".to_string()).unwrap();

        story
            .settle_image(PageId::new(0), Some(ImageRef::new("http://img")))
            .unwrap();
        assert!(!story.loading().image);
        assert!(story.loading().audio);

        story
            .settle_audio(PageId::new(0), Some(AudioBuffer::new(vec![0.0; 4], 24_000)))
            .unwrap();
        assert!(!story.is_generating());

        let page = story.page(PageId::new(0)).unwrap();
        assert_eq!(page.image().unwrap().as_str(), "http://img");
        assert!(page.has_audio());
    }

    #[test]
    fn test_prev_at_start_is_noop() {
        let mut story = story_with_pages(1);
        let outcome = story.navigate(NavDirection::Prev).unwrap();
        assert_eq!(outcome, NavigationOutcome::Unchanged { position: 0 });
        assert_eq!(story.position(), 0);
        assert!(!story.is_generating());
    }

    #[test]
    fn test_next_inside_generated_pages() {
        let mut story = story_with_pages(3);
        let outcome = story.navigate(NavDirection::Next).unwrap();
        assert_eq!(outcome, NavigationOutcome::Moved { position: 1 });
        assert!(!story.is_generating());
    }

    #[test]
    fn test_next_at_frontier_advances_and_generates() {
        let mut story = story_with_pages(1);
        let outcome = story.navigate(NavDirection::Next).unwrap();

        assert_eq!(
            outcome,
            NavigationOutcome::Frontier {
                index: PageId::new(1)
            }
        );
        assert_eq!(story.position(), 1);
        assert!(story.current_page().is_none());
        assert_eq!(story.loading(), LoadingState::all());
    }

    #[test]
    fn test_navigation_blocked_while_generating() {
        let mut story = story_with_pages(2);
        story.begin_generation();
        assert_eq!(
            story.navigate(NavDirection::Prev).unwrap_err(),
            StoryError::GenerationInProgress
        );
        assert_eq!(story.position(), 0);
    }

    #[test]
    fn test_reserve_page_requires_idle_story() {
        let mut story = story_with_pages(1);

        assert_eq!(
            story.reserve_page(PageId::new(2)).unwrap_err(),
            StoryError::PageOutOfOrder {
                expected: PageId::new(1),
                actual: PageId::new(2),
            }
        );
        assert!(!story.is_generating());

        story.reserve_page(PageId::new(1)).unwrap();
        assert!(story.is_generating());
        assert_eq!(story.position(), 0);

        assert_eq!(
            story.reserve_page(PageId::new(1)).unwrap_err(),
            StoryError::GenerationInProgress
        );
    }

    #[test]
    fn test_abort_rolls_back_dangling_position() {
        let mut story = story_with_pages(2);
        story.navigate(NavDirection::Next).unwrap();
        story.navigate(NavDirection::Next).unwrap();
        assert_eq!(story.position(), 2);

        story.abort_generation();
        assert_eq!(story.position(), 1);
        assert!(!story.is_generating());
    }
}
