//! Storyweaver - 儿童绘本故事生成服务
//!
//! 组装：配置 → 日志 → 生成网关 → 编排器 → HTTP 服务

use std::sync::Arc;

use storyweaver::application::{
    GenerationGatewayPort, PlaybackController, StoryOrchestrator, StoryOrchestratorConfig,
};
use storyweaver::config::{load_config, print_config, AppConfig, GatewayKind};
use storyweaver::infrastructure::adapters::{
    EventAudioOutput, FakeGenerationGateway, FakeGenerationGatewayConfig, GeminiClient,
    GeminiClientConfig, WavEncoder,
};
use storyweaver::infrastructure::events::EventPublisher;
use storyweaver::infrastructure::http::{AppState, HttpServer, ServerConfig};

/// 按配置创建生成网关
fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn GenerationGatewayPort>> {
    let gateway: Arc<dyn GenerationGatewayPort> = match config.gateway.kind {
        GatewayKind::Gemini => {
            let client_config = GeminiClientConfig {
                api_key: config.gateway.api_key.clone(),
                base_url: config.gateway.base_url.clone(),
                text_model: config.gateway.text_model.clone(),
                image_model: config.gateway.image_model.clone(),
                speech_model: config.gateway.speech_model.clone(),
                voice_name: config.gateway.voice_name.clone(),
                image_aspect_ratio: config.gateway.image_aspect_ratio.clone(),
                timeout_secs: config.gateway.timeout_secs,
                image_template: config.gateway.image_template.clone(),
                narration_template: config.gateway.narration_template.clone(),
            };
            Arc::new(GeminiClient::new(client_config)?)
        }
        GatewayKind::Fake => Arc::new(FakeGenerationGateway::new(FakeGenerationGatewayConfig {
            latency_ms: config.gateway.fake_latency_ms,
            sample_rate: config.audio.sample_rate,
            ..Default::default()
        })),
    };
    Ok(gateway)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志（RUST_LOG 优先）
    let log_filter = format!(
        "{},storyweaver={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Storyweaver - 儿童绘本故事生成服务");
    print_config(&config);

    let gateway = build_gateway(&config)?;
    if !gateway.health_check().await {
        tracing::warn!(backend = %config.gateway.kind, "Generation service health check failed");
    }

    // 事件发布器与播放控制
    let event_publisher = Arc::new(EventPublisher::new());
    let playback = Arc::new(PlaybackController::new(Arc::new(EventAudioOutput::new(
        event_publisher.clone(),
    ))));

    let orchestrator_config = StoryOrchestratorConfig {
        system_instruction: config.story.system_instruction.clone(),
        opening_template: config.story.opening_template.clone(),
        continuation_prompt: config.story.continuation_prompt.clone(),
        sample_rate: config.audio.sample_rate,
    };
    let orchestrator = Arc::new(StoryOrchestrator::new(
        orchestrator_config,
        gateway,
        playback,
        event_publisher.clone(),
    ));

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(orchestrator, Arc::new(WavEncoder::new()), event_publisher);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
