//! Loader for the bot configuration: embedded defaults, an optional YAML
//! file, and environment overlays.
//!
//! Precedence, lowest first:
//!
//! 1. [`DEFAULT_YAML`], which reads the credentials from the environment via
//!    `${TWITTER_API_KEY}`-style placeholders,
//! 2. files added with [`BotConfigLoader::with_file`] or
//!    [`BotConfigLoader::with_optional_file`] (and inline YAML),
//! 3. `CALLBOARD__SECTION__KEY` environment variables.
//!
//! `${VAR}` placeholders are expanded after merging. A placeholder whose
//! variable is unset stays literal, and credential accessors treat it as
//! missing.
use callboard_common::{LlmConfig, TwitterCredentials};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_YAML: &str = r#"
twitter:
  consumer_key: "${TWITTER_API_KEY}"
  consumer_secret: "${TWITTER_API_SECRET}"
  access_token: "${BOT3_ACCESS_TOKEN}"
  access_token_secret: "${BOT3_ACCESS_TOKEN_SECRET}"
openai:
  api_key: "${OPENAI_API_KEY}"
  model: "gpt-3.5-turbo"
  max_tokens: 50
  temperature: 0.8
feed:
  url: "https://outlight.fun/api/tokens/most-called?timeframe=1h"
  verify_tls: false
  timeout_secs: 15
media:
  main_image: "images/msgtwt.png"
  reply_image: "images/msgtwtft.png"
pacing:
  startup: { min_secs: 180, max_secs: 420 }
  reply: { min_secs: 180, max_secs: 300 }
  comment: { min_secs: 300, max_secs: 600 }
logging:
  format: "text"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub twitter: TwitterSection,
    pub openai: OpenAiSection,
    pub feed: FeedSection,
    pub media: MediaSection,
    pub pacing: PacingSection,
    pub logging: LoggingSection,
}

#[derive(Clone, Default, Deserialize)]
pub struct TwitterSection {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

impl std::fmt::Debug for TwitterSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |v: &Option<String>| if resolved(v).is_some() { "<set>" } else { "<missing>" };
        f.debug_struct("TwitterSection")
            .field("consumer_key", &shown(&self.consumer_key))
            .field("consumer_secret", &shown(&self.consumer_secret))
            .field("access_token", &shown(&self.access_token))
            .field("access_token_secret", &shown(&self.access_token_secret))
            .finish()
    }
}

/// The publishing credentials that are absent, by environment variable name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing publishing credentials: {}", .0.join(", "))]
pub struct MissingCredentials(pub Vec<&'static str>);

impl TwitterSection {
    /// All four credentials, or the names of the missing ones.
    pub fn credentials(&self) -> Result<TwitterCredentials, MissingCredentials> {
        let fields = [
            ("TWITTER_API_KEY", &self.consumer_key),
            ("TWITTER_API_SECRET", &self.consumer_secret),
            ("BOT3_ACCESS_TOKEN", &self.access_token),
            ("BOT3_ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, v)| resolved(v).is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(MissingCredentials(missing));
        }

        let take = |v: &Option<String>| resolved(v).unwrap_or_default();
        Ok(TwitterCredentials {
            consumer_key: take(&self.consumer_key),
            consumer_secret: take(&self.consumer_secret),
            access_token: take(&self.access_token),
            access_token_secret: take(&self.access_token_secret),
        })
    }
}

#[derive(Clone, Deserialize)]
pub struct OpenAiSection {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// OpenAI-compatible base URL; the public API when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl std::fmt::Debug for OpenAiSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSection")
            .field("api_key", &resolved(&self.api_key).map(|_| "<set>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiSection {
    /// Generated comments are enabled only when an API key resolved.
    pub fn llm_config(&self) -> LlmConfig {
        match resolved(&self.api_key) {
            Some(api_key) => LlmConfig::OpenAi {
                api_key,
                model: self.model.clone(),
                base_url: self.endpoint.clone().filter(|e| !e.trim().is_empty()),
            },
            None => LlmConfig::None,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_max_tokens() -> u32 {
    50
}
fn default_temperature() -> f32 {
    0.8
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    pub url: String,
    /// Certificate validation for the ranking endpoint; off for the deployed bot.
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FeedSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSection {
    pub main_image: PathBuf,
    pub reply_image: PathBuf,
}

/// Inclusive range for a randomized pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayWindow {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayWindow {
    pub const fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    pub const ZERO: DelayWindow = DelayWindow::new(0, 0);
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PacingSection {
    pub startup: DelayWindow,
    pub reply: DelayWindow,
    pub comment: DelayWindow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for a rolling log file; stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_format() -> String {
    "text".into()
}

impl BotConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, window) in [
            ("startup", self.pacing.startup),
            ("reply", self.pacing.reply),
            ("comment", self.pacing.comment),
        ] {
            if window.min_secs > window.max_secs {
                return Err(ConfigError::Message(format!(
                    "pacing.{name}: min_secs ({}) exceeds max_secs ({})",
                    window.min_secs, window.max_secs
                )));
            }
        }
        if self.feed.url.trim().is_empty() {
            return Err(ConfigError::Message("feed.url must not be empty".into()));
        }
        Ok(())
    }
}

/// A value counts as present when it is non-blank and fully expanded.
fn resolved(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains("${"))
        .map(str::to_string)
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (defaults + YAML + env overrides).
pub struct BotConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for BotConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BotConfigLoader {
    /// Start from [`DEFAULT_YAML`].
    ///
    /// ```
    /// use callboard_config::BotConfigLoader;
    ///
    /// let cfg = BotConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(cfg.pacing.startup.min_secs, 180);
    /// assert_eq!(cfg.media.main_image.to_str(), Some("images/msgtwt.png"));
    /// assert!(!cfg.feed.verify_tls);
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use callboard_config::BotConfigLoader;
    ///
    /// let cfg = BotConfigLoader::new()
    ///     .with_yaml_str("pacing:\n  reply: { min_secs: 1, max_secs: 2 }")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.pacing.reply.max_secs, 2);
    /// assert_eq!(cfg.pacing.comment.min_secs, 300);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge all sources, overlay `CALLBOARD__` variables, expand `${VAR}`
    /// placeholders, and deserialize.
    pub fn load(self) -> Result<BotConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CALLBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: BotConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
