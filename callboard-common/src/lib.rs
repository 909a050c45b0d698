//! Common types and utilities shared across Callboard crates.
//!
//! This crate defines the provider-agnostic LLM configuration, the logging
//! bootstrap, and the shared error type. It stays dependency-light so every
//! crate in the workspace can pull it in.
//!
//! # Overview
//!
//! - [`LlmConfig`]: which text-generation backend (if any) to use
//! - [`TwitterCredentials`]: the OAuth 1.0a user-context key set
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`BotError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use callboard_common::LlmConfig;
//!
//! let cfg = LlmConfig::default();
//! assert!(cfg.is_none());
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for the optional text-generation provider.
///
/// Feature flags control which variants are compiled in. See the
/// `callboard-llm` crate for the concrete client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum LlmConfig {
    #[cfg(feature = "openai")]
    OpenAi {
        api_key: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[default]
    None,
}

impl LlmConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, LlmConfig::None)
    }
}

/// OAuth 1.0a user-context credentials for the publishing account.
///
/// `Debug` never prints the secret halves.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Error types used across the Callboard system.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// The text-generation provider failed or returned something unusable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;
