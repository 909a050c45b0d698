//! Provider-agnostic LLM integration for Callboard.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and the OpenAI
//! chat-completions client, plus [`ensure_llm_ready`] to build a client from a
//! [`callboard_common::LlmConfig`]. Builds without the `openai` feature have
//! no provider, and callers fall back to canned text.
//!
//! # Examples
//! ```no_run
//! use callboard_common::LlmConfig;
//! use callboard_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cfg = LlmConfig::None;
//! assert!(ensure_llm_ready(&cfg).is_err());
//! # }
//! ```
#[cfg(feature = "openai")]
pub mod openai;
pub mod traits;

use callboard_common::{BotError, LlmConfig};
use std::sync::Arc;
use traits::LlmClient;

/// Build the configured LLM client.
pub fn ensure_llm_ready(
    config: &LlmConfig,
) -> callboard_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        LlmConfig::None => Err(BotError::Config("No LLM configured".to_string())),
        #[cfg(feature = "openai")]
        LlmConfig::OpenAi {
            api_key,
            model,
            base_url,
        } => {
            let client = match base_url {
                Some(base) => {
                    openai::OpenAiClient::with_base_url(api_key.clone(), model.clone(), base)?
                }
                None => openai::OpenAiClient::new(api_key.clone(), model.clone())?,
            };
            tracing::info!(model = %model, "llm.ready");
            Ok(Arc::new(client))
        }
        #[allow(unreachable_patterns)]
        _ => Err(BotError::Config("LLM provider not enabled".to_string())),
    }
}
