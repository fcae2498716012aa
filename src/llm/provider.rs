use async_trait::async_trait;
use crate::error::Result;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Raw completion text. Fails with `Authentication`, `RateLimited`,
    /// `EmptyResponse` or `LLMApi`.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
    /// False when no usable credential is present; no call should be attempted.
    fn is_configured(&self) -> bool;
    fn name(&self) -> &str;
}
