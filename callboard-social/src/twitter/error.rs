use callboard_http::HttpError;
use callboard_http::StatusCode;
use thiserror::Error;

pub type SocialResult<T> = Result<T, SocialError>;

#[derive(Debug, Error)]
pub enum SocialError {
    /// HTTP 429; `reset` is the unix second the window reopens, when known.
    #[error("rate limited (reset={reset:?})")]
    RateLimited { reset: Option<i64> },

    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("twitter API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Http(HttpError),

    #[error("media file {path}: {source}")]
    Media {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("oauth signing failed: {0}")]
    Signing(String),
}

impl From<HttpError> for SocialError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Api {
                status,
                rate_limit_reset,
                ..
            } if status == StatusCode::TOO_MANY_REQUESTS => SocialError::RateLimited {
                reset: rate_limit_reset,
            },
            HttpError::Api {
                status, message, ..
            } if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                SocialError::Unauthorized {
                    status: status.as_u16(),
                    message,
                }
            }
            HttpError::Api {
                status, message, ..
            } => SocialError::Api {
                status: status.as_u16(),
                message,
            },
            other => SocialError::Http(other),
        }
    }
}

/// Seconds to wait before the publishing API accepts requests again.
///
/// `reset` is the `x-rate-limit-reset` unix timestamp (0 when absent); the
/// result carries a 10 second margin and never drops below 60.
pub fn rate_limit_wait_secs(reset: Option<i64>, now_unix: i64) -> u64 {
    let wait = reset.unwrap_or(0).saturating_sub(now_unix).saturating_add(10);
    wait.max(60) as u64
}
