//! Follow-up comment text, either from fixed templates or from the LLM.
use std::sync::Arc;

use callboard_feed::RankedToken;
use callboard_llm::traits::LlmClient;
use rand::Rng;
use rand::seq::SliceRandom;

pub const SYSTEM_PROMPT: &str = "You are a crypto analyst writing short, engaging Twitter comments about trending Solana tokens. Keep it under 200 characters, use relevant emojis, and sound knowledgeable but casual. Focus on market insights or trading observations.";

pub const NO_DATA_COMMENTS: [&str; 4] = [
    "🔍 Markets are quiet today - perfect time to research those hidden gems! 💎 #Solana #DeFi",
    "📊 Low activity periods often precede the biggest moves. Stay ready! 🚀 #CryptoAnalysis",
    "🤔 When the calls are quiet, the smart money is accumulating... #SolanaGems",
    "💡 Pro tip: Use quiet market periods to study patterns and prepare strategies! 📈",
];

const PROMPT_TOKENS: usize = 3;

/// Sampling parameters for generated comments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 50,
            temperature: 0.8,
        }
    }
}

pub struct CommentGenerator {
    llm: Option<Arc<dyn LlmClient + Send + Sync>>,
    params: GenerationParams,
}

impl CommentGenerator {
    /// Template mode when `llm` is `None`, generated mode otherwise.
    pub fn new(llm: Option<Arc<dyn LlmClient + Send + Sync>>, params: GenerationParams) -> Self {
        Self { llm, params }
    }

    /// A non-empty comment about `tokens`. Never fails.
    pub async fn generate<R: Rng + ?Sized>(&self, tokens: &[RankedToken], rng: &mut R) -> String {
        let Some(top) = tokens.first() else {
            return no_data_comment(rng);
        };

        let Some(llm) = &self.llm else {
            return template_comment(tokens, rng).unwrap_or_else(|| fallback_comment(top));
        };

        let prompt = build_prompt(tokens);
        match llm
            .generate(
                &prompt,
                Some(SYSTEM_PROMPT),
                Some(self.params.max_tokens),
                Some(self.params.temperature),
            )
            .await
        {
            Ok(resp) if !resp.text.trim().is_empty() => {
                let comment = resp.text.trim().to_string();
                tracing::info!(model = llm.model_name(), %comment, "comment.generated");
                comment
            }
            Ok(_) => {
                tracing::warn!(model = llm.model_name(), "comment.empty_completion");
                fallback_comment(top)
            }
            Err(e) => {
                tracing::error!(error = %e, "comment.generation_failed");
                fallback_comment(top)
            }
        }
    }
}

/// User prompt listing up to three tokens as `1. $SYM (N calls)`.
pub fn build_prompt(tokens: &[RankedToken]) -> String {
    let lines: Vec<String> = tokens
        .iter()
        .take(PROMPT_TOKENS)
        .enumerate()
        .map(|(i, t)| format!("{}. ${} ({} calls)", i + 1, t.symbol, t.filtered_calls))
        .collect();
    format!(
        "Today's most called Solana tokens:\n{}\n\nWrite a brief, engaging comment about this trend:",
        lines.join("\n")
    )
}

/// The comment used when generation fails.
pub fn fallback_comment(top: &RankedToken) -> String {
    format!(
        "🚀 ${} is trending with {} calls! Market momentum building 📈",
        top.symbol, top.filtered_calls
    )
}

/// Uniform pick among the templates `tokens` can fill; `None` for an empty list.
pub fn template_comment<R: Rng + ?Sized>(tokens: &[RankedToken], rng: &mut R) -> Option<String> {
    let top = tokens.first()?;
    let (sym, calls) = (&top.symbol, top.filtered_calls);

    let mut pool = vec![
        format!("🔥 {sym} leading with {calls} calls! The market speaks volumes 📊"),
        format!("💡 Pro tip: When you see {calls} calls on ${sym}, smart money is moving!"),
        format!("🎯 ${sym} with {calls} calls - that's what momentum looks like! #SolanaGems"),
    ];
    if let Some(second) = tokens.get(1) {
        pool.push(format!(
            "Interesting pattern: ${sym} and ${} dominating today's calls 🤔",
            second.symbol
        ));
    }
    pool.choose(rng).cloned()
}

/// Uniform pick from [`NO_DATA_COMMENTS`].
pub fn no_data_comment<R: Rng + ?Sized>(rng: &mut R) -> String {
    NO_DATA_COMMENTS
        .choose(rng)
        .copied()
        .unwrap_or(NO_DATA_COMMENTS[0])
        .to_string()
}
