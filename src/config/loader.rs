//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, GatewayKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "STORYWEAVER";

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYWEAVER_SERVER__PORT=8080`
/// - `STORYWEAVER_GATEWAY__KIND=fake`
/// - `STORYWEAVER_GATEWAY__API_KEY=...`
/// - `STORYWEAVER_AUDIO__SAMPLE_RATE=24000`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级），其余字段由 serde default 补齐
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("gateway.kind", "gemini")?
        .set_default("audio.sample_rate", 24_000)?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.gateway.kind == GatewayKind::Gemini {
        if config.gateway.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Gateway API key is required for the gemini backend (set {}_GATEWAY__API_KEY)",
                ENV_PREFIX
            )));
        }
        if config.gateway.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "Gateway base URL cannot be empty".to_string(),
            ));
        }
    }

    if config.gateway.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Gateway timeout cannot be 0".to_string(),
        ));
    }

    if config.audio.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Audio sample rate cannot be 0".to_string(),
        ));
    }

    if !config.story.opening_template.contains("{prompt}") {
        return Err(ConfigError::ValidationError(
            "Story opening template must contain {prompt}".to_string(),
        ));
    }

    if config.story.continuation_prompt.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Story continuation prompt cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Gateway: {}", config.gateway.kind);
    match config.gateway.kind {
        GatewayKind::Gemini => {
            tracing::info!("Gateway Base URL: {}", config.gateway.base_url);
            tracing::info!("Gateway API Key: {}", config.gateway.redacted_api_key());
            tracing::info!(
                "Models: text={} image={} speech={}",
                config.gateway.text_model,
                config.gateway.image_model,
                config.gateway.speech_model
            );
            tracing::info!("Voice: {}", config.gateway.voice_name);
            tracing::info!("Gateway Timeout: {}s", config.gateway.timeout_secs);
        }
        GatewayKind::Fake => {
            tracing::info!("Fake Latency: {}ms", config.gateway.fake_latency_ms);
        }
    }
    tracing::info!("Speech Sample Rate: {} Hz", config.audio.sample_rate);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
