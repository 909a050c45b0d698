use async_trait::async_trait;
use callboard_common::Result;
use serde::{Deserialize, Serialize};

/// A completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Completion text, already trimmed.
    pub text: String,
    /// Model reported by the provider, when it reports one.
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// Text-generation backend used for follow-up comments.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One completion for `prompt`. `None` parameters use provider defaults.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    fn model_name(&self) -> &str;
}
