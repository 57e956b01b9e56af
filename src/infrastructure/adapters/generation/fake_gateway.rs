//! Fake Generation Gateway - 离线运行与演示用
//!
//! 不访问任何外部服务：按轮次返回固定文本、生成简单的 SVG 插图和静音朗读

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;
use std::time::Duration;

use crate::application::ports::{AssetOutcome, GenerationError, GenerationGatewayPort, SessionHandle};
use crate::domain::story::ImageRef;
use crate::domain::SPEECH_SAMPLE_RATE;

const FAKE_PAGES: &[&str] = &[
    "Once upon a time, a little star wanted to see the world below. \
     One night it slid down a moonbeam and landed softly in a meadow.",
    "In the meadow lived a friendly rabbit with very long ears. \
     \"Hello, little star!\" said the rabbit. \"Would you like to play?\"",
    "They hopped and twinkled until the sky turned pink. \
     The star glowed warm and happy, because it had found a friend.",
];

const PALETTE: &[&str] = &["#ffd166", "#06d6a0", "#118ab2", "#ef476f", "#8338ec"];

/// Fake Gateway 配置
#[derive(Debug, Clone)]
pub struct FakeGenerationGatewayConfig {
    /// 每次调用的模拟延迟（毫秒）
    pub latency_ms: u64,
    /// 每页静音朗读时长（毫秒）
    pub narration_ms: u64,
    pub sample_rate: u32,
}

impl Default for FakeGenerationGatewayConfig {
    fn default() -> Self {
        Self {
            latency_ms: 200,
            narration_ms: 2000,
            sample_rate: SPEECH_SAMPLE_RATE,
        }
    }
}

/// Fake Generation Gateway
pub struct FakeGenerationGateway {
    config: FakeGenerationGatewayConfig,
    /// 会话 id → 已完成的轮次
    turns: DashMap<String, usize>,
}

impl FakeGenerationGateway {
    pub fn new(config: FakeGenerationGatewayConfig) -> Self {
        tracing::info!(
            latency_ms = config.latency_ms,
            narration_ms = config.narration_ms,
            "FakeGenerationGateway initialized"
        );
        Self {
            config,
            turns: DashMap::new(),
        }
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn illustration(text: &str) -> ImageRef {
        let color = PALETTE[text.len() % PALETTE.len()];
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 160 90\">\
             <rect width=\"160\" height=\"90\" fill=\"{}\"/>\
             <circle cx=\"120\" cy=\"25\" r=\"12\" fill=\"#fff8dc\"/></svg>",
            color
        );
        ImageRef::from_base64("image/svg+xml", &STANDARD.encode(svg))
    }

    fn silence(&self) -> Vec<u8> {
        let samples = self.config.sample_rate as u64 * self.config.narration_ms / 1000;
        vec![0u8; samples as usize * 2]
    }
}

#[async_trait]
impl GenerationGatewayPort for FakeGenerationGateway {
    async fn open_session(&self, instruction: &str) -> Result<SessionHandle, GenerationError> {
        let handle = SessionHandle::new(instruction);
        self.turns.insert(handle.id().to_string(), 0);
        Ok(handle)
    }

    async fn continue_session(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        self.simulate_latency().await;

        let mut turn = self
            .turns
            .get_mut(session.id())
            .ok_or_else(|| GenerationError::SessionNotFound(session.id().to_string()))?;
        let text = FAKE_PAGES[*turn % FAKE_PAGES.len()].to_string();
        *turn += 1;

        tracing::debug!(
            session_id = %session.id(),
            turn = *turn,
            prompt_len = prompt.len(),
            "FakeGenerationGateway: returning scripted page"
        );
        Ok(text)
    }

    async fn generate_image(&self, prompt: &str) -> AssetOutcome<ImageRef> {
        self.simulate_latency().await;
        AssetOutcome::Ready(Self::illustration(prompt))
    }

    async fn generate_speech(&self, _prompt: &str) -> AssetOutcome<Vec<u8>> {
        self.simulate_latency().await;
        AssetOutcome::Ready(self.silence())
    }

    async fn close_session(&self, session: &SessionHandle) {
        self.turns.remove(session.id());
    }
}
