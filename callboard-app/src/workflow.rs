//! One bot run: fetch, compose, publish the thread, and maybe comment.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use callboard_common::TwitterCredentials;
use callboard_config::{BotConfig, PacingSection, TwitterSection};
use callboard_feed::{RankedToken, TokenSource};
use callboard_social::twitter::{SocialError, SocialResult, rate_limit_wait_secs};
use callboard_social::{PostDraft, Publisher};
use rand::Rng;

use crate::cadence::{Clock, Pacer, is_comment_hour, sample_delay};
use crate::commentary::{CommentGenerator, no_data_comment};
use crate::compose::{char_count, exceeds_limit, main_post, reply_post, POST_CHAR_LIMIT};

/// The parts of [`BotConfig`] a run needs.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub twitter: TwitterSection,
    pub main_image: PathBuf,
    pub reply_image: PathBuf,
    pub pacing: PacingSection,
}

impl WorkflowSettings {
    pub fn from_config(cfg: &BotConfig) -> Self {
        Self {
            twitter: cfg.twitter.clone(),
            main_image: cfg.media.main_image.clone(),
            reply_image: cfg.media.reply_image.clone(),
            pacing: cfg.pacing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Main,
    Reply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Main => f.write_str("main"),
            Stage::Reply => f.write_str("reply"),
        }
    }
}

/// How a run ended. Every variant is a normal exit for the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    MissingCredentials(Vec<&'static str>),
    AuthenticationFailed,
    /// The feed had nothing to rank; `comment` is the id of the no-data
    /// comment, when one was published.
    NoData { comment: Option<String> },
    Published {
        main: String,
        reply: String,
        comment: Option<String>,
    },
    /// A thread post failed. `posted` lists the ids already published and
    /// `retry_after_secs` is set when the API rate limited the request.
    PublishFailed {
        stage: Stage,
        posted: Vec<String>,
        retry_after_secs: Option<u64>,
    },
}

pub struct Workflow<R> {
    settings: WorkflowSettings,
    source: Arc<dyn TokenSource>,
    comments: CommentGenerator,
    pacer: Arc<dyn Pacer>,
    clock: Arc<dyn Clock>,
    rng: R,
}

impl<R: Rng + Send> Workflow<R> {
    pub fn new(
        settings: WorkflowSettings,
        source: Arc<dyn TokenSource>,
        comments: CommentGenerator,
        pacer: Arc<dyn Pacer>,
        clock: Arc<dyn Clock>,
        rng: R,
    ) -> Self {
        Self {
            settings,
            source,
            comments,
            pacer,
            clock,
            rng,
        }
    }

    /// Run once. `connect` builds the publisher from the resolved credentials.
    pub async fn run<P, F>(&mut self, connect: F) -> RunOutcome
    where
        P: Publisher,
        F: FnOnce(TwitterCredentials) -> SocialResult<P>,
    {
        let startup = sample_delay(self.settings.pacing.startup, &mut self.rng);
        self.pacer.pause("startup", startup).await;

        let credentials = match self.settings.twitter.credentials() {
            Ok(c) => c,
            Err(missing) => {
                tracing::error!(missing = ?missing.0, "run.missing_credentials");
                return RunOutcome::MissingCredentials(missing.0);
            }
        };

        let publisher = match connect(credentials) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "run.publisher_init_failed");
                return RunOutcome::AuthenticationFailed;
            }
        };
        match publisher.verify_credentials().await {
            Ok(account) => tracing::info!(username = %format!("@{}", account.username), "run.authenticated"),
            Err(e) => {
                tracing::error!(error = %e, "run.authentication_failed");
                return RunOutcome::AuthenticationFailed;
            }
        }

        let comment_hour = is_comment_hour(self.clock.utc_hour());

        let Some(tokens) = self.source.top_tokens().await else {
            return self.no_data(&publisher, comment_hour).await;
        };

        let mut posted = Vec::new();

        let main_text = main_post(&tokens, &mut self.rng);
        log_composed(Stage::Main, &main_text);
        let media = attach_image(&publisher, &self.settings.main_image).await;
        let main_id = match publisher
            .publish(&PostDraft::new(main_text).with_media(media))
            .await
        {
            Ok(id) => id,
            Err(e) => return self.publish_failed(Stage::Main, e, posted),
        };
        tracing::info!(id = %main_id, "run.main_posted");
        posted.push(main_id.clone());

        let delay = sample_delay(self.settings.pacing.reply, &mut self.rng);
        self.pacer.pause("reply", delay).await;

        let reply_text = reply_post(&tokens, &mut self.rng);
        log_composed(Stage::Reply, &reply_text);
        let media = attach_image(&publisher, &self.settings.reply_image).await;
        let draft = PostDraft::new(reply_text)
            .in_reply_to(main_id.clone())
            .with_media(media);
        let reply_id = match publisher.publish(&draft).await {
            Ok(id) => id,
            Err(e) => return self.publish_failed(Stage::Reply, e, posted),
        };
        tracing::info!(id = %reply_id, in_reply_to = %main_id, "run.reply_posted");

        let comment = if comment_hour {
            self.comment(&publisher, &tokens).await
        } else {
            tracing::info!("run.no_comment_this_hour");
            None
        };

        RunOutcome::Published {
            main: main_id,
            reply: reply_id,
            comment,
        }
    }

    async fn no_data<P: Publisher>(&mut self, publisher: &P, comment_hour: bool) -> RunOutcome {
        if !comment_hour {
            tracing::info!("run.no_data");
            return RunOutcome::NoData { comment: None };
        }
        let delay = sample_delay(self.settings.pacing.comment, &mut self.rng);
        self.pacer.pause("comment", delay).await;

        let text = no_data_comment(&mut self.rng);
        tracing::info!(comment = %text, "run.no_data_comment");
        let comment = self.post_comment(publisher, text).await;
        RunOutcome::NoData { comment }
    }

    async fn comment<P: Publisher>(&mut self, publisher: &P, tokens: &[RankedToken]) -> Option<String> {
        let delay = sample_delay(self.settings.pacing.comment, &mut self.rng);
        self.pacer.pause("comment", delay).await;

        let text = self.comments.generate(tokens, &mut self.rng).await;
        tracing::info!(comment = %text, chars = char_count(&text), "run.comment_composed");
        self.post_comment(publisher, text).await
    }

    async fn post_comment<P: Publisher>(&self, publisher: &P, text: String) -> Option<String> {
        match publisher.publish(&PostDraft::new(text)).await {
            Ok(id) => {
                tracing::info!(id = %id, "run.comment_posted");
                Some(id)
            }
            Err(e) => {
                let retry_after = self.retry_after(&e);
                tracing::error!(error = %e, retry_after_secs = ?retry_after, "run.comment_failed");
                None
            }
        }
    }

    fn publish_failed(&self, stage: Stage, e: SocialError, posted: Vec<String>) -> RunOutcome {
        let retry_after_secs = self.retry_after(&e);
        match retry_after_secs {
            Some(wait) => tracing::error!(%stage, wait_secs = wait, ?posted, "run.rate_limited"),
            None => tracing::error!(%stage, error = %e, ?posted, "run.publish_failed"),
        }
        RunOutcome::PublishFailed {
            stage,
            posted,
            retry_after_secs,
        }
    }

    fn retry_after(&self, e: &SocialError) -> Option<u64> {
        match e {
            SocialError::RateLimited { reset } => {
                Some(rate_limit_wait_secs(*reset, self.clock.now().timestamp()))
            }
            _ => None,
        }
    }
}

fn log_composed(stage: Stage, text: &str) {
    let chars = char_count(text);
    tracing::info!(%stage, chars, %text, "run.post_composed");
    if exceeds_limit(text) {
        tracing::warn!(%stage, chars, limit = POST_CHAR_LIMIT, "run.post_over_limit");
    }
}

/// Upload `path` and return its media id; failures are logged and yield `None`.
pub async fn attach_image<P: Publisher + ?Sized>(publisher: &P, path: &Path) -> Option<String> {
    match publisher.upload_media(path).await {
        Ok(id) => {
            tracing::info!(path = %path.display(), media_id = %id, "media.attached");
            Some(id)
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "media.attach_failed");
            None
        }
    }
}
