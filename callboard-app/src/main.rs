use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use callboard_app::{
    CommentGenerator, GenerationParams, NoPacer, Pacer, SystemClock, TokioPacer, Workflow,
    WorkflowSettings,
};
use callboard_common::observability::{LogConfig, LogFormat, init_logging};
use callboard_config::{BotConfig, BotConfigLoader};
use callboard_feed::OutlightFeed;
use callboard_llm::ensure_llm_ready;
use callboard_social::twitter::TwitterApi;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

const DEFAULT_CONFIG_FILE: &str = "callboard.yaml";

/// Post the hourly most-called token ranking to X.
#[derive(Debug, Parser)]
#[command(name = "callboard", version)]
struct Cli {
    /// YAML file layered over the built-in defaults (default: ./callboard.yaml if present).
    #[arg(long, env = "CALLBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the randomized pauses between steps.
    #[arg(long)]
    no_pacing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => BotConfigLoader::new().with_file(path),
        None => BotConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: BotConfig = loader.load()?;

    init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        format: LogFormat::from_name(&cfg.logging.format),
        ..LogConfig::default()
    })?;
    tracing::info!(?cfg, no_pacing = cli.no_pacing, "callboard.start");

    let feed = OutlightFeed::new(&cfg.feed.url, cfg.feed.verify_tls, cfg.feed.timeout())?;

    let llm_config = cfg.openai.llm_config();
    let llm = if llm_config.is_none() {
        tracing::info!("comment.template_mode");
        None
    } else {
        match ensure_llm_ready(&llm_config) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "comment.llm_unavailable");
                None
            }
        }
    };
    let comments = CommentGenerator::new(
        llm,
        GenerationParams {
            max_tokens: cfg.openai.max_tokens,
            temperature: cfg.openai.temperature,
        },
    );

    let pacer: Arc<dyn Pacer> = if cli.no_pacing {
        Arc::new(NoPacer)
    } else {
        Arc::new(TokioPacer)
    };

    let mut workflow = Workflow::new(
        WorkflowSettings::from_config(&cfg),
        Arc::new(feed),
        comments,
        pacer,
        Arc::new(SystemClock),
        StdRng::from_entropy(),
    );
    let outcome = workflow.run(TwitterApi::new).await;
    tracing::info!(?outcome, "callboard.finished");

    Ok(())
}
