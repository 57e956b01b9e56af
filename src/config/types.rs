//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::fmt;

use crate::application::orchestrator::{
    DEFAULT_CONTINUATION_PROMPT, DEFAULT_OPENING_TEMPLATE, DEFAULT_SYSTEM_INSTRUCTION,
};
use crate::domain::SPEECH_SAMPLE_RATE;
use crate::infrastructure::adapters::{DEFAULT_IMAGE_TEMPLATE, DEFAULT_NARRATION_TEMPLATE};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成服务配置
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 故事提示词配置
    #[serde(default)]
    pub story: StoryConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成服务后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Google Gemini REST API
    #[default]
    Gemini,
    /// 离线假数据
    Fake,
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayKind::Gemini => write!(f, "gemini"),
            GatewayKind::Fake => write!(f, "fake"),
        }
    }
}

/// 生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub kind: GatewayKind,

    /// API Key（Gemini 后端必填）
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// 预置语音
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    #[serde(default = "default_aspect_ratio")]
    pub image_aspect_ratio: String,

    /// 插图提示词模板，`{text}` 为页面文本
    #[serde(default = "default_image_template")]
    pub image_template: String,

    /// 朗读提示词模板，`{text}` 为页面文本
    #[serde(default = "default_narration_template")]
    pub narration_template: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Fake 后端的模拟延迟（毫秒）
    #[serde(default = "default_fake_latency")]
    pub fake_latency_ms: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_voice_name() -> String {
    "Kore".to_string()
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_image_template() -> String {
    DEFAULT_IMAGE_TEMPLATE.to_string()
}

fn default_narration_template() -> String {
    DEFAULT_NARRATION_TEMPLATE.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_fake_latency() -> u64 {
    200
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::default(),
            api_key: String::new(),
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            speech_model: default_speech_model(),
            voice_name: default_voice_name(),
            image_aspect_ratio: default_aspect_ratio(),
            image_template: default_image_template(),
            narration_template: default_narration_template(),
            timeout_secs: default_timeout(),
            fake_latency_ms: default_fake_latency(),
        }
    }
}

impl GatewayConfig {
    /// 打印用的 API Key（仅保留末四位）
    pub fn redacted_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return "<unset>".to_string();
        }
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}

/// 音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 语音 PCM 采样率（Hz）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_sample_rate() -> u32 {
    SPEECH_SAMPLE_RATE
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

/// 故事提示词配置
#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// 第一页模板，必须包含 `{prompt}`
    #[serde(default = "default_opening_template")]
    pub opening_template: String,

    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

fn default_opening_template() -> String {
    DEFAULT_OPENING_TEMPLATE.to_string()
}

fn default_continuation_prompt() -> String {
    DEFAULT_CONTINUATION_PROMPT.to_string()
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            system_instruction: default_system_instruction(),
            opening_template: default_opening_template(),
            continuation_prompt: default_continuation_prompt(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别（RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
