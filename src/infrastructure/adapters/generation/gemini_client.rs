//! Gemini Client - 调用 Google Generative Language REST API
//!
//! 实现 GenerationGatewayPort：
//! - 文本：`POST {base}/v1beta/models/{model}:generateContent`，携带系统指令和对话历史
//! - 插图：`POST {base}/v1beta/models/{model}:predict`（Imagen）
//! - 语音：`generateContent` + `responseModalities: ["AUDIO"]`，返回 base64 PCM16

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::gemini_types::{
    Content, ErrorResponse, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    PredictInstance, PredictParameters, PredictRequest, PredictResponse, PrebuiltVoiceConfig,
    SpeechConfig, VoiceConfig,
};
use crate::application::ports::{AssetOutcome, GenerationError, GenerationGatewayPort, SessionHandle};
use crate::domain::story::ImageRef;

pub const DEFAULT_IMAGE_TEMPLATE: &str = "A whimsical and vibrant children's book illustration \
for a story about: \"{text}\". Use a bright, friendly, cartoon style.";

pub const DEFAULT_NARRATION_TEMPLATE: &str =
    "Say it in a gentle and friendly storyteller's voice: {text}";

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    /// API 基础 URL
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
    /// 预置语音名称
    pub voice_name: String,
    pub image_aspect_ratio: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 插图提示词模板，`{text}` 替换为页面文本
    pub image_template: String,
    /// 朗读提示词模板，`{text}` 替换为页面文本
    pub narration_template: String,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            image_aspect_ratio: "16:9".to_string(),
            timeout_secs: 60,
            image_template: DEFAULT_IMAGE_TEMPLATE.to_string(),
            narration_template: DEFAULT_NARRATION_TEMPLATE.to_string(),
        }
    }
}

impl GeminiClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 单个对话的系统指令与历史
struct ChatSession {
    instruction: String,
    history: Vec<Content>,
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
    sessions: DashMap<String, ChatSession>,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            sessions: DashMap::new(),
        })
    }

    /// 当前打开的会话数
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    fn image_request(&self, text: &str) -> PredictRequest {
        PredictRequest {
            instances: vec![PredictInstance {
                prompt: self.config.image_template.replace("{text}", text),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: self.config.image_aspect_ratio.clone(),
            },
        }
    }

    fn speech_request(&self, text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(
                self.config.narration_template.replace("{text}", text),
            )],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.config.voice_name.clone(),
                        },
                    },
                },
            }),
        }
    }

    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, GenerationError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else if e.is_connect() {
                    GenerationError::NetworkError(format!("Cannot connect to Gemini API: {}", e))
                } else {
                    GenerationError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or(error_text);
            return Err(GenerationError::ServiceError(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }

    async fn request_image(&self, text: &str) -> Result<Option<ImageRef>, GenerationError> {
        let url = self.model_url(&self.config.image_model, "predict");
        let response: PredictResponse = self.post_json(&url, &self.image_request(text)).await?;

        Ok(response.predictions.into_iter().find_map(|prediction| {
            let mime = prediction
                .mime_type
                .unwrap_or_else(|| "image/png".to_string());
            prediction
                .bytes_base64_encoded
                .map(|data| ImageRef::from_base64(&mime, &data))
        }))
    }

    async fn request_speech(&self, text: &str) -> Result<Option<Vec<u8>>, GenerationError> {
        let url = self.model_url(&self.config.speech_model, "generateContent");
        let response: GenerateContentResponse =
            self.post_json(&url, &self.speech_request(text)).await?;

        response
            .inline_data()
            .map(|inline| decode_inline_data(&inline.data))
            .transpose()
    }
}

/// 解码 base64 内联数据
fn decode_inline_data(data: &str) -> Result<Vec<u8>, GenerationError> {
    STANDARD
        .decode(data)
        .map_err(|e| GenerationError::InvalidResponse(format!("Invalid base64 payload: {}", e)))
}

#[async_trait]
impl GenerationGatewayPort for GeminiClient {
    async fn open_session(&self, instruction: &str) -> Result<SessionHandle, GenerationError> {
        let handle = SessionHandle::new(instruction);
        self.sessions.insert(
            handle.id().to_string(),
            ChatSession {
                instruction: instruction.to_string(),
                history: Vec::new(),
            },
        );

        tracing::debug!(session_id = %handle.id(), model = %self.config.text_model, "Chat session opened");
        Ok(handle)
    }

    async fn continue_session(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let (instruction, mut contents) = {
            let chat = self
                .sessions
                .get(session.id())
                .ok_or_else(|| GenerationError::SessionNotFound(session.id().to_string()))?;
            (chat.instruction.clone(), chat.history.clone())
        };
        contents.push(Content::user(prompt));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::instruction(instruction)),
            generation_config: None,
        };

        tracing::debug!(
            session_id = %session.id(),
            turns = request.contents.len(),
            "Sending generateContent request"
        );

        let url = self.model_url(&self.config.text_model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;

        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::ServiceError(format!(
                "Prompt blocked: {}",
                reason
            )));
        }
        let text = response.text().ok_or(GenerationError::EmptyResponse)?;

        // 仅在成功时追加历史
        if let Some(mut chat) = self.sessions.get_mut(session.id()) {
            chat.history.push(Content::user(prompt));
            chat.history.push(Content::model(text.clone()));
        }

        tracing::info!(
            session_id = %session.id(),
            chars = text.chars().count(),
            "Story text generated"
        );

        Ok(text)
    }

    async fn generate_image(&self, prompt: &str) -> AssetOutcome<ImageRef> {
        match self.request_image(prompt).await {
            Ok(Some(image)) => AssetOutcome::Ready(image),
            Ok(None) => AssetOutcome::Absent,
            Err(e) => AssetOutcome::Failed(e.to_string()),
        }
    }

    async fn generate_speech(&self, prompt: &str) -> AssetOutcome<Vec<u8>> {
        match self.request_speech(prompt).await {
            Ok(Some(bytes)) => AssetOutcome::Ready(bytes),
            Ok(None) => AssetOutcome::Absent,
            Err(e) => AssetOutcome::Failed(e.to_string()),
        }
    }

    async fn close_session(&self, session: &SessionHandle) {
        if self.sessions.remove(session.id()).is_some() {
            tracing::debug!(session_id = %session.id(), "Chat session closed");
        }
    }

    async fn health_check(&self) -> bool {
        let url = format!(
            "{}/v1beta/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.text_model
        );
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
