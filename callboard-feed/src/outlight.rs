//! Client for the outlight.fun "most called tokens" endpoint.
use std::time::Duration;

use async_trait::async_trait;
use callboard_http::{HttpClient, HttpError, RequestOpts};

use crate::rank::rank_tokens;
use crate::types::{RankedToken, RawToken};

pub const OUTLIGHT_MOST_CALLED_URL: &str =
    "https://outlight.fun/api/tokens/most-called?timeframe=1h";

/// Source of the ranked token list for one run.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The ranked list, or `None` when no usable data is available.
    ///
    /// Failures never produce a partial list.
    async fn top_tokens(&self) -> Option<Vec<RankedToken>>;
}

#[derive(Clone)]
pub struct OutlightFeed {
    http: HttpClient,
    url: String,
}

impl OutlightFeed {
    /// `verify_tls = false` accepts any certificate for this endpoint.
    pub fn new(url: &str, verify_tls: bool, timeout: Duration) -> Result<Self, HttpError> {
        let http = HttpClient::with_tls_verification(url, verify_tls)?
            .with_timeout(timeout)
            .with_retries(0);
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    /// Fetch the raw list without ranking it.
    pub async fn fetch_raw(&self) -> Result<Vec<RawToken>, HttpError> {
        self.http
            .get_json(
                &self.url,
                RequestOpts {
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await
    }
}

#[async_trait]
impl TokenSource for OutlightFeed {
    async fn top_tokens(&self) -> Option<Vec<RankedToken>> {
        let raw = match self.fetch_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "feed.fetch_failed");
                return None;
            }
        };
        let received = raw.len();
        let ranked = rank_tokens(raw);
        tracing::info!(received, ranked = ranked.len(), "feed.ranked");
        (!ranked.is_empty()).then_some(ranked)
    }
}
