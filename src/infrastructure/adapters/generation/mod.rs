//! Generation Gateway 适配器

mod fake_gateway;
mod gemini_client;
mod gemini_types;

pub use fake_gateway::{FakeGenerationGateway, FakeGenerationGatewayConfig};
pub use gemini_client::{
    GeminiClient, GeminiClientConfig, DEFAULT_IMAGE_TEMPLATE, DEFAULT_NARRATION_TEMPLATE,
};
