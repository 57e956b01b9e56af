//! Story Orchestrator - 页面生成编排
//!
//! 每一页的流程：文本（有状态对话）→ 插图与语音并发 → 语音解码 → 自动播放。
//! 所有远程调用失败都在此转换为状态变更（清除加载标记、字段缺失），
//! 每次变更后通过 EventPublisher 推送给渲染层。

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::application::error::ApplicationError;
use crate::application::playback::PlaybackController;
use crate::application::ports::{AssetOutcome, GenerationGatewayPort, SessionHandle};
use crate::domain::story::{
    LoadingState, NavDirection, NavigationOutcome, PageId, Story, StoryError, StoryId, StoryPrompt,
};
use crate::domain::{decode_pcm16, AudioBuffer, SPEECH_SAMPLE_RATE};
use crate::infrastructure::events::EventPublisher;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a storyteller for young children aged 3-6. \
Your stories are simple, positive, and have a touch of magic. Never say things like 'Page 1' or \
'The End'. Just write the story content. Each response should be a single, short page of the \
story (one or two paragraphs).";

pub const DEFAULT_OPENING_TEMPLATE: &str = "Start a story about {prompt}.";

pub const DEFAULT_CONTINUATION_PROMPT: &str = "Continue the story. Write the next page.";

/// 编排器配置
#[derive(Debug, Clone)]
pub struct StoryOrchestratorConfig {
    /// 整个故事固定的系统指令
    pub system_instruction: String,
    /// 第一页提示词模板，`{prompt}` 替换为用户输入
    pub opening_template: String,
    /// 后续页面的固定提示词
    pub continuation_prompt: String,
    /// 语音 PCM 采样率
    pub sample_rate: u32,
}

impl Default for StoryOrchestratorConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            opening_template: DEFAULT_OPENING_TEMPLATE.to_string(),
            continuation_prompt: DEFAULT_CONTINUATION_PROMPT.to_string(),
            sample_rate: SPEECH_SAMPLE_RATE,
        }
    }
}

impl StoryOrchestratorConfig {
    pub fn opening_prompt(&self, prompt: &StoryPrompt) -> String {
        self.opening_template.replace("{prompt}", prompt.as_str())
    }
}

/// 翻页结果；越过边界时附带新页面生成任务的句柄
#[derive(Debug)]
pub struct Navigation {
    pub outcome: NavigationOutcome,
    pub position: usize,
    pub generation: Option<JoinHandle<Result<(), ApplicationError>>>,
}

struct ActiveStory {
    story: Story,
    session: Option<Arc<SessionHandle>>,
}

impl ActiveStory {
    fn open_session(&self) -> Result<Arc<SessionHandle>, ApplicationError> {
        self.session
            .clone()
            .ok_or_else(|| ApplicationError::invalid_state("Story session is not open"))
    }
}

/// 故事编排器
///
/// 独占页面序列、阅读位置、加载标记与会话句柄。
pub struct StoryOrchestrator {
    config: StoryOrchestratorConfig,
    gateway: Arc<dyn GenerationGatewayPort>,
    playback: Arc<PlaybackController>,
    events: Arc<EventPublisher>,
    state: RwLock<Option<ActiveStory>>,
}

impl StoryOrchestrator {
    pub fn new(
        config: StoryOrchestratorConfig,
        gateway: Arc<dyn GenerationGatewayPort>,
        playback: Arc<PlaybackController>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            gateway,
            playback,
            events,
            state: RwLock::new(None),
        }
    }

    /// 开始新故事（替换正在进行的故事）
    ///
    /// 返回时第一页已生成完毕；会话或文本失败时故事被丢弃。
    pub async fn start_story(&self, prompt: StoryPrompt) -> Result<StoryId, ApplicationError> {
        let story = Story::new(prompt.clone());
        let story_id = story.id().clone();

        let previous = self.state.write().await.replace(ActiveStory {
            story,
            session: None,
        });
        if let Some(session) = previous.and_then(|active| active.session) {
            self.gateway.close_session(&session).await;
        }

        tracing::info!(story_id = %story_id, prompt = %prompt, "Story started");
        self.events.publish_story_started(&story_id, &prompt);
        self.events.publish_loading(&story_id, LoadingState::all());

        let session = match self.gateway.open_session(&self.config.system_instruction).await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                tracing::error!(story_id = %story_id, error = %e, "Failed to open story session");
                self.abandon_story(&story_id, &e.to_string()).await;
                return Err(ApplicationError::SessionError(e.to_string()));
            }
        };

        let attached = {
            let mut state = self.state.write().await;
            match state.as_mut() {
                Some(active) if active.story.id() == &story_id => {
                    active.session = Some(session.clone());
                    true
                }
                _ => false,
            }
        };
        if !attached {
            self.gateway.close_session(&session).await;
            return Err(superseded(&story_id));
        }

        let opening = self.config.opening_prompt(&prompt);
        if let Err(e) = self
            .run_page_pipeline(&story_id, &session, PageId::new(0), &opening)
            .await
        {
            if matches!(e, ApplicationError::GenerationError(_)) {
                self.abandon_story(&story_id, &e.to_string()).await;
            }
            return Err(e);
        }

        Ok(story_id)
    }

    /// 翻页
    ///
    /// 越过边界时阅读位置立即前移，并在后台生成该页面。
    pub async fn advance_page(
        self: &Arc<Self>,
        direction: NavDirection,
    ) -> Result<Navigation, ApplicationError> {
        let (story_id, outcome, position) = {
            let mut state = self.state.write().await;
            let active = state.as_mut().ok_or_else(no_story)?;
            let outcome = active.story.navigate(direction)?;

            self.events.publish_position(&active.story);
            if matches!(outcome, NavigationOutcome::Frontier { .. }) {
                self.events
                    .publish_loading(active.story.id(), active.story.loading());
            }
            (active.story.id().clone(), outcome, active.story.position())
        };

        tracing::info!(
            story_id = %story_id,
            direction = %direction,
            outcome = outcome.as_str(),
            position = position,
            "Page navigation"
        );

        let generation = match outcome {
            NavigationOutcome::Frontier { index } => {
                let orchestrator = Arc::clone(self);
                Some(tokio::spawn(async move {
                    orchestrator.generate_frontier_page(story_id, index).await
                }))
            }
            _ => None,
        };

        Ok(Navigation {
            outcome,
            position,
            generation,
        })
    }

    /// 为当前故事生成下一页，index 必须等于已有页数
    ///
    /// 已有页面正在生成时拒绝，会话上同时只有一个请求。
    pub async fn generate_next_page(&self, index: PageId) -> Result<(), ApplicationError> {
        let (story_id, session) = {
            let mut state = self.state.write().await;
            let active = state.as_mut().ok_or_else(no_story)?;
            let session = active.open_session()?;
            active.story.reserve_page(index)?;
            self.events
                .publish_loading(active.story.id(), active.story.loading());
            (active.story.id().clone(), session)
        };
        self.run_next_page(story_id, session, index).await
    }

    /// 播放指定页面的朗读音频
    pub async fn play_page(&self, index: PageId) -> Result<u64, ApplicationError> {
        let audio = {
            let state = self.state.read().await;
            let active = state.as_ref().ok_or_else(no_story)?;
            if active.story.is_generating() {
                return Err(StoryError::GenerationInProgress.into());
            }
            let page = active
                .story
                .page(index)
                .ok_or(StoryError::PageNotFound(index))?;
            page.audio().cloned().ok_or_else(|| {
                ApplicationError::invalid_state(format!("Page {} has no narration", index))
            })?
        };

        self.playback.play(index, &audio).await?;
        Ok(audio.duration_ms())
    }

    /// 当前故事快照
    pub async fn story(&self) -> Option<Story> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|active| active.story.clone())
    }

    /// 页面的已解码音频
    pub async fn page_audio(&self, index: PageId) -> Result<AudioBuffer, ApplicationError> {
        let state = self.state.read().await;
        let active = state.as_ref().ok_or_else(no_story)?;
        let page = active
            .story
            .page(index)
            .ok_or(StoryError::PageNotFound(index))?;
        page.audio()
            .cloned()
            .ok_or_else(|| ApplicationError::not_found("Narration", index))
    }

    pub fn playback(&self) -> &Arc<PlaybackController> {
        &self.playback
    }

    /// 翻页越过边界后生成页面；加载标记已由 navigate 置位
    async fn generate_frontier_page(
        &self,
        story_id: StoryId,
        index: PageId,
    ) -> Result<(), ApplicationError> {
        let session = {
            let state = self.state.read().await;
            let active = match state.as_ref() {
                Some(active) if active.story.id() == &story_id => active,
                _ => return Err(superseded(&story_id)),
            };
            let expected = active.story.next_page_id();
            if index != expected {
                return Err(StoryError::PageOutOfOrder {
                    expected,
                    actual: index,
                }
                .into());
            }
            active.open_session()?
        };
        self.run_next_page(story_id, session, index).await
    }

    async fn run_next_page(
        &self,
        story_id: StoryId,
        session: Arc<SessionHandle>,
        index: PageId,
    ) -> Result<(), ApplicationError> {
        tracing::info!(story_id = %story_id, page_id = %index, "Generating next page");

        let result = self
            .run_page_pipeline(
                &story_id,
                &session,
                index,
                &self.config.continuation_prompt,
            )
            .await;

        if let Err(ApplicationError::GenerationError(message)) = &result {
            self.with_story(&story_id, |story| {
                story.abort_generation();
                self.events.publish_loading(&story_id, story.loading());
                self.events.publish_position(story);
                self.events.publish_page_failed(&story_id, index, message);
            })
            .await;
        }

        result
    }

    async fn run_page_pipeline(
        &self,
        story_id: &StoryId,
        session: &SessionHandle,
        page_id: PageId,
        prompt: &str,
    ) -> Result<(), ApplicationError> {
        let text = self
            .gateway
            .continue_session(session, prompt)
            .await
            .map_err(|e| {
                tracing::error!(
                    story_id = %story_id,
                    page_id = %page_id,
                    error = %e,
                    "Text generation failed"
                );
                ApplicationError::GenerationError(e.to_string())
            })?;

        self.with_story(story_id, |story| -> Result<(), StoryError> {
            let page = story.append_page(page_id, text.clone())?;
            self.events.publish_page_updated(story_id, page);
            self.events.publish_loading(story_id, story.loading());
            Ok(())
        })
        .await
        .ok_or_else(|| superseded(story_id))??;

        tracing::info!(
            story_id = %story_id,
            page_id = %page_id,
            chars = text.chars().count(),
            "Page text ready"
        );

        let image_task = async {
            let image = match self.gateway.generate_image(&text).await {
                AssetOutcome::Ready(image) => Some(image),
                AssetOutcome::Absent => {
                    tracing::warn!(page_id = %page_id, "Image generation returned nothing");
                    None
                }
                AssetOutcome::Failed(e) => {
                    tracing::warn!(page_id = %page_id, error = %e, "Image generation failed");
                    None
                }
            };
            self.settle_asset(story_id, page_id, |story| story.settle_image(page_id, image))
                .await;
        };

        let speech_task = async {
            let audio = match self.gateway.generate_speech(&text).await {
                AssetOutcome::Ready(bytes) => match decode_pcm16(&bytes, self.config.sample_rate) {
                    Ok(buffer) => Some(buffer),
                    Err(e) => {
                        tracing::warn!(page_id = %page_id, error = %e, "Speech decoding failed");
                        None
                    }
                },
                AssetOutcome::Absent => {
                    tracing::warn!(page_id = %page_id, "Speech generation returned nothing");
                    None
                }
                AssetOutcome::Failed(e) => {
                    tracing::warn!(page_id = %page_id, error = %e, "Speech generation failed");
                    None
                }
            };
            self.settle_asset(story_id, page_id, |story| {
                story.settle_audio(page_id, audio.clone())
            })
            .await;
            audio
        };

        let ((), audio) = futures_util::future::join(image_task, speech_task).await;

        self.with_story(story_id, |story| {
            story.finish_generation();
            self.events.publish_loading(story_id, story.loading());
        })
        .await
        .ok_or_else(|| superseded(story_id))?;

        tracing::info!(
            story_id = %story_id,
            page_id = %page_id,
            has_audio = audio.is_some(),
            "Page ready"
        );

        if let Some(audio) = audio {
            if let Err(e) = self.playback.play(page_id, &audio).await {
                tracing::warn!(page_id = %page_id, error = %e, "Auto playback failed");
            }
        }

        Ok(())
    }

    /// 写入插图/音频结果并推送页面变更
    async fn settle_asset(
        &self,
        story_id: &StoryId,
        page_id: PageId,
        settle: impl FnOnce(&mut Story) -> Result<(), StoryError>,
    ) {
        let settled = self
            .with_story(story_id, |story| {
                let result = settle(story);
                if let Some(page) = story.page(page_id) {
                    self.events.publish_page_updated(story_id, page);
                }
                self.events.publish_loading(story_id, story.loading());
                result
            })
            .await;

        if let Some(Err(e)) = settled {
            tracing::error!(page_id = %page_id, error = %e, "Failed to settle page asset");
        }
    }

    /// 故事无法开始：丢弃并回到初始状态
    async fn abandon_story(&self, story_id: &StoryId, error: &str) {
        let removed = {
            let mut state = self.state.write().await;
            match state.as_ref() {
                Some(active) if active.story.id() == story_id => state.take(),
                _ => None,
            }
        };
        let Some(active) = removed else {
            return;
        };

        if let Some(session) = active.session {
            self.gateway.close_session(&session).await;
        }

        tracing::warn!(story_id = %story_id, error = %error, "Story abandoned");
        self.events.publish_loading(story_id, LoadingState::idle());
        self.events.publish_story_failed(story_id, error);
    }

    /// 仅当 story_id 仍是当前故事时执行变更
    async fn with_story<R>(
        &self,
        story_id: &StoryId,
        mutate: impl FnOnce(&mut Story) -> R,
    ) -> Option<R> {
        let mut state = self.state.write().await;
        match state.as_mut() {
            Some(active) if active.story.id() == story_id => Some(mutate(&mut active.story)),
            _ => None,
        }
    }
}

fn no_story() -> ApplicationError {
    ApplicationError::invalid_state("No story in progress")
}

fn superseded(story_id: &StoryId) -> ApplicationError {
    ApplicationError::invalid_state(format!("Story {} was replaced", story_id))
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedGateway;
    use super::*;
    use crate::application::playback::test_support::{OutputEvent, RecordingOutput};
    use crate::infrastructure::events::StoryEvent;
    use std::time::Duration;

    struct Harness {
        orchestrator: Arc<StoryOrchestrator>,
        gateway: Arc<ScriptedGateway>,
        output: Arc<RecordingOutput>,
        events: Arc<EventPublisher>,
    }

    fn harness(gateway: ScriptedGateway) -> Harness {
        let gateway = Arc::new(gateway);
        let output = Arc::new(RecordingOutput::default());
        let events = Arc::new(EventPublisher::new());
        let playback = Arc::new(PlaybackController::new(output.clone()));
        let orchestrator = Arc::new(StoryOrchestrator::new(
            StoryOrchestratorConfig::default(),
            gateway.clone(),
            playback,
            events.clone(),
        ));
        Harness {
            orchestrator,
            gateway,
            output,
            events,
        }
    }

    fn prompt(text: &str) -> StoryPrompt {
        StoryPrompt::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_brave_little_rocket() {
        let h = harness(ScriptedGateway::new(vec![Ok("Once upon a time...")]));
        let mut rx = h.events.subscribe();

        h.orchestrator
            .start_story(prompt("a brave little rocket"))
            .await
            .unwrap();

        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.page_count(), 1);
        assert_eq!(story.position(), 0);
        assert!(!story.is_generating());

        let page = story.page(PageId::new(0)).unwrap();
        assert_eq!(page.id(), PageId::new(0));
        assert_eq!(page.text(), "Once upon a time...");
        assert!(page.image().is_some());

        let audio = page.audio().unwrap();
        assert_eq!(audio.len(), 24_000);
        assert!(audio.samples().iter().all(|&s| s == 0.0));

        assert_eq!(h.output.events(), vec![OutputEvent::Started(PageId::new(0))]);
        assert_eq!(
            h.gateway.prompts(),
            vec!["Start a story about a brave little rocket.".to_string()]
        );

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(StoryEvent::StoryStarted { .. })));
        assert!(matches!(
            events.last(),
            Some(StoryEvent::LoadingChanged { loading, .. }) if !loading.is_generating()
        ));
    }

    #[tokio::test]
    async fn test_text_failure_discards_story() {
        let h = harness(ScriptedGateway::new(vec![Err("quota exceeded")]));
        let mut rx = h.events.subscribe();

        let result = h.orchestrator.start_story(prompt("dragons")).await;

        assert!(matches!(result, Err(ApplicationError::GenerationError(_))));
        assert!(h.orchestrator.story().await.is_none());
        assert_eq!(h.gateway.asset_calls(), (0, 0));
        assert_eq!(h.gateway.closed_sessions(), 1);
        assert!(h.output.events().is_empty());

        let mut failed = false;
        while let Ok(event) = rx.try_recv() {
            failed |= matches!(event, StoryEvent::StoryFailed { .. });
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_session_failure() {
        let h = harness(ScriptedGateway::new(vec![Ok("unused")]).failing_session());

        let result = h.orchestrator.start_story(prompt("dragons")).await;

        assert!(matches!(result, Err(ApplicationError::SessionError(_))));
        assert!(h.orchestrator.story().await.is_none());
        assert_eq!(h.gateway.text_calls(), 0);
    }

    #[tokio::test]
    async fn test_image_failure_is_isolated() {
        let h = harness(
            ScriptedGateway::new(vec![Ok("page one"), Ok("page two")])
                .with_image(AssetOutcome::Failed("safety filter".to_string())),
        );

        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let story = h.orchestrator.story().await.unwrap();
        let page = story.page(PageId::new(0)).unwrap();
        assert_eq!(page.text(), "page one");
        assert!(page.image().is_none());
        assert!(page.has_audio());
        assert!(!story.is_generating());

        let navigation = h.orchestrator.advance_page(NavDirection::Next).await.unwrap();
        navigation.generation.unwrap().await.unwrap().unwrap();
        assert_eq!(h.orchestrator.story().await.unwrap().page_count(), 2);
    }

    #[tokio::test]
    async fn test_prev_at_first_page_is_noop() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let navigation = h.orchestrator.advance_page(NavDirection::Prev).await.unwrap();

        assert_eq!(navigation.outcome, NavigationOutcome::Unchanged { position: 0 });
        assert!(navigation.generation.is_none());
        assert_eq!(h.gateway.text_calls(), 1);
    }

    #[tokio::test]
    async fn test_next_at_frontier_generates_one_page() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one"), Ok("page two")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let navigation = h.orchestrator.advance_page(NavDirection::Next).await.unwrap();
        assert_eq!(
            navigation.outcome,
            NavigationOutcome::Frontier {
                index: PageId::new(1)
            }
        );
        assert_eq!(navigation.position, 1);

        navigation.generation.unwrap().await.unwrap().unwrap();

        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.page_count(), 2);
        assert_eq!(story.position(), 1);
        assert_eq!(story.current_page().unwrap().text(), "page two");
        assert_eq!(h.gateway.text_calls(), 2);
        assert_eq!(
            h.gateway.prompts()[1],
            "Continue the story. Write the next page."
        );
        assert_eq!(
            h.output.events(),
            vec![
                OutputEvent::Started(PageId::new(0)),
                OutputEvent::Stopped(PageId::new(0)),
                OutputEvent::Started(PageId::new(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_next_inside_story_triggers_no_generation() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one"), Ok("page two")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();
        let navigation = h.orchestrator.advance_page(NavDirection::Next).await.unwrap();
        navigation.generation.unwrap().await.unwrap().unwrap();

        h.orchestrator.advance_page(NavDirection::Prev).await.unwrap();
        let navigation = h.orchestrator.advance_page(NavDirection::Next).await.unwrap();

        assert_eq!(navigation.outcome, NavigationOutcome::Moved { position: 1 });
        assert!(navigation.generation.is_none());
        assert_eq!(h.gateway.text_calls(), 2);
    }

    #[tokio::test]
    async fn test_continuation_failure_rolls_back_position() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one"), Err("service down")]));
        let mut rx = h.events.subscribe();
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let navigation = h.orchestrator.advance_page(NavDirection::Next).await.unwrap();
        let result = navigation.generation.unwrap().await.unwrap();

        assert!(matches!(result, Err(ApplicationError::GenerationError(_))));
        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.page_count(), 1);
        assert_eq!(story.position(), 0);
        assert!(!story.is_generating());

        let mut page_failed = false;
        while let Ok(event) = rx.try_recv() {
            page_failed |= matches!(event, StoryEvent::PageFailed { page_id: 1, .. });
        }
        assert!(page_failed);
    }

    #[tokio::test]
    async fn test_generate_next_page_directly() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one"), Ok("page two")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let out_of_order = h.orchestrator.generate_next_page(PageId::new(3)).await;
        assert!(matches!(out_of_order, Err(ApplicationError::InvalidState(_))));
        assert!(!h.orchestrator.story().await.unwrap().is_generating());

        h.orchestrator
            .generate_next_page(PageId::new(1))
            .await
            .unwrap();

        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.page_count(), 2);
        assert_eq!(story.pages()[1].text(), "page two");
        assert_eq!(story.position(), 0);
        assert!(!story.is_generating());
        assert_eq!(h.gateway.text_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_generate_next_page_sends_one_prompt() {
        let h = harness(
            ScriptedGateway::new(vec![Ok("page one"), Ok("page two"), Ok("page three")])
                .with_text_delay(Duration::from_millis(20)),
        );
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let (first, second) = tokio::join!(
            h.orchestrator.generate_next_page(PageId::new(1)),
            h.orchestrator.generate_next_page(PageId::new(1)),
        );

        assert_eq!(
            [first.is_ok(), second.is_ok()]
                .iter()
                .filter(|ok| **ok)
                .count(),
            1
        );
        let rejected = if first.is_err() { first } else { second };
        assert!(matches!(rejected, Err(ApplicationError::InvalidState(_))));

        assert_eq!(h.gateway.text_calls(), 2);
        assert_eq!(h.gateway.max_texts_in_flight(), 1);
        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.page_count(), 2);
        assert!(!story.is_generating());
    }

    #[tokio::test]
    async fn test_navigation_blocked_during_direct_generation() {
        let h = harness(
            ScriptedGateway::new(vec![Ok("page one"), Ok("page two")])
                .with_text_delay(Duration::from_millis(20)),
        );
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let orchestrator = h.orchestrator.clone();
        let generation =
            tokio::spawn(async move { orchestrator.generate_next_page(PageId::new(1)).await });
        while h.gateway.text_calls() < 2 {
            tokio::task::yield_now().await;
        }

        let blocked = h.orchestrator.advance_page(NavDirection::Next).await;
        assert!(matches!(blocked, Err(ApplicationError::InvalidState(_))));

        generation.await.unwrap().unwrap();
        assert_eq!(h.gateway.max_texts_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_image_and_speech_requested_together() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one")]).image_waits_for_speech());

        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let story = h.orchestrator.story().await.unwrap();
        let page = story.page(PageId::new(0)).unwrap();
        assert!(page.image().is_some());
        assert!(page.has_audio());
        assert_eq!(h.gateway.asset_calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_odd_speech_payload_leaves_audio_absent() {
        let h = harness(
            ScriptedGateway::new(vec![Ok("page one")])
                .with_speech(AssetOutcome::Ready(vec![0u8; 3])),
        );

        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let story = h.orchestrator.story().await.unwrap();
        let page = story.page(PageId::new(0)).unwrap();
        assert!(!page.has_audio());
        assert!(page.image().is_some());
        assert!(h.output.events().is_empty());
    }

    #[tokio::test]
    async fn test_play_page() {
        let h = harness(ScriptedGateway::new(vec![Ok("page one")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let duration = h.orchestrator.play_page(PageId::new(0)).await.unwrap();
        assert_eq!(duration, 1000);
        assert_eq!(h.output.started_count(), 2);

        let missing = h.orchestrator.play_page(PageId::new(5)).await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_play_page_without_audio() {
        let h = harness(
            ScriptedGateway::new(vec![Ok("page one")]).with_speech(AssetOutcome::Absent),
        );
        h.orchestrator.start_story(prompt("owls")).await.unwrap();

        let result = h.orchestrator.play_page(PageId::new(0)).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
        assert!(h.orchestrator.page_audio(PageId::new(0)).await.is_err());
    }

    #[tokio::test]
    async fn test_new_story_replaces_previous() {
        let h = harness(ScriptedGateway::new(vec![Ok("first"), Ok("second")]));
        h.orchestrator.start_story(prompt("owls")).await.unwrap();
        let first = h.orchestrator.story().await.unwrap();

        h.orchestrator.start_story(prompt("foxes")).await.unwrap();
        let second = h.orchestrator.story().await.unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(second.page_count(), 1);
        assert_eq!(second.pages()[0].text(), "second");
        assert_eq!(h.gateway.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_replaced_story_ignores_late_text() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let h = harness(
            ScriptedGateway::new(vec![Ok("late page"), Ok("fresh page")])
                .gate_first_text(gate.clone()),
        );

        let orchestrator = h.orchestrator.clone();
        let stale = tokio::spawn(async move { orchestrator.start_story(prompt("owls")).await });
        while h.gateway.text_calls() == 0 {
            tokio::task::yield_now().await;
        }

        h.orchestrator.start_story(prompt("foxes")).await.unwrap();
        gate.notify_one();
        let result = stale.await.unwrap();

        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
        let story = h.orchestrator.story().await.unwrap();
        assert_eq!(story.prompt().as_str(), "foxes");
        assert_eq!(story.page_count(), 1);
        assert_eq!(story.pages()[0].text(), "fresh page");
        assert_eq!(h.gateway.asset_calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_navigation_without_story() {
        let h = harness(ScriptedGateway::new(Vec::new()));
        let result = h.orchestrator.advance_page(NavDirection::Next).await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[test]
    fn test_opening_prompt_template() {
        let config = StoryOrchestratorConfig::default();
        assert_eq!(
            config.opening_prompt(&prompt("a sleepy whale")),
            "Start a story about a sleepy whale."
        );
    }
}
