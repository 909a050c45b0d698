//! Shared HTTP client for the ranking feed, the X API and OpenAI.
//!
//! - JSON and single-file multipart bodies
//! - `Auth::Bearer` or a precomputed header (OAuth 1.0a signatures)
//! - Retries 429/5xx within a per-client or per-request budget, honoring
//!   `Retry-After`; a zero budget surfaces the first failure
//! - API errors carry the `x-rate-limit-reset` value when the server sent one
//! - Curl-style request/response dumps with `CALLBOARD_HTTP_RAW=1`
//!
//! Secrets never reach the logs: only the auth kind is recorded, and raw
//! dumps redact `Authorization`, cookies and secret-looking query keys.
//!
//! ```no_run
//! # async fn demo() -> Result<(), callboard_http::HttpError> {
//! let client = callboard_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", callboard_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

pub use reqwest::StatusCode;
pub use reqwest::header;

const RAW_ENV: &str = "CALLBOARD_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

/// Header carrying the unix timestamp at which the current rate-limit window resets.
pub const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "api_key",
    "key",
    "token",
    "secret",
    "client_secret",
    "oauth_signature",
];

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
        /// Unix seconds from `x-rate-limit-reset`, when the server sent it.
        rate_limit_reset: Option<i64>,
    },
}

impl HttpError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// How a request authenticates.
///
/// ```
/// use callboard_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// assert_eq!(bearer.kind(), "bearer");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    /// A precomputed header, e.g. an OAuth 1.0a `Authorization` value.
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl Auth<'_> {
    /// The label used in logs in place of the credential.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// A single file sent as `multipart/form-data`.
#[derive(Clone, Debug)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
enum Body {
    Json(Vec<u8>),
    Multipart(MultipartFile),
}

impl Body {
    fn len(&self) -> usize {
        match self {
            Body::Json(b) => b.len(),
            Body::Multipart(f) => f.bytes.len(),
        }
    }
}

/// Per-request overrides of the client defaults.
///
/// ```
/// use callboard_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(60)),
///     retries: Some(0),
///     ..Default::default()
/// };
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    /// Use an absolute `path` as-is instead of joining it to the base URL.
    pub allow_absolute: bool,
}

/// One response, fully read.
struct Exchange {
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Client anchored to `base`, with certificate validation on.
    ///
    /// ```no_run
    /// use callboard_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        Self::with_tls_verification(base, true)
    }

    /// `verify_tls = false` accepts invalid certificates and logs a warning.
    pub fn with_tls_verification(base: &str, verify_tls: bool) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !verify_tls {
            tracing::warn!(
                host = %base.host_str().unwrap_or("-"),
                "http.tls_verification_disabled"
            );
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// ```no_run
    /// use callboard_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retries(0);
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// The URL a request for `path` goes to. Request signers need it exactly.
    pub fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// POST JSON with an optional bearer token.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.post_json_opts(path, body, opts).await
    }

    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.execute(Method::GET, path, None, opts).await
    }

    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        self.execute(Method::POST, path, Some(Body::Json(bytes)), opts)
            .await
    }

    /// POST one file as `multipart/form-data` and decode the JSON response.
    pub async fn post_multipart<T>(
        &self,
        path: &str,
        file: MultipartFile,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(Body::Multipart(file)), opts)
            .await
    }

    async fn execute<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self.resolve(path, opts.allow_absolute)?;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let auth_kind = opts.auth.as_ref().map_or("none", Auth::kind);
        let raw = raw_enabled();
        let mut attempt = 0usize;

        loop {
            let req_id = request_id();
            tracing::debug!(
                %req_id,
                attempt = attempt + 1,
                max_retries,
                %method,
                host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                body_len = body.as_ref().map_or(0, Body::len),
                "http.request.start"
            );
            if raw {
                let curl = make_curl(&method, &url, opts.headers.as_ref(), body.as_ref());
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // Bodies are rebuilt per attempt; multipart forms are single-use.
            let request = self.build(method.clone(), url.clone(), body.as_ref(), &opts, timeout)?;
            let started = Instant::now();
            let exchange = match send(request).await {
                Ok(exchange) => exchange,
                Err(message) if attempt < max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(
                        %req_id,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        %message,
                        "http.retrying.network"
                    );
                    sleep(delay).await;
                    continue;
                }
                Err(message) => {
                    tracing::warn!(%req_id, attempt, %message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };
            log_exchange(&req_id, &exchange, started.elapsed(), raw);

            let snippet = snip_body(&exchange.bytes);
            if exchange.status.is_success() {
                return serde_json::from_slice::<T>(&exchange.bytes).map_err(|e| {
                    tracing::warn!(
                        %req_id,
                        serde_err = %e,
                        body_snippet = %snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = error_message(&exchange.bytes);
            if attempt < max_retries {
                if let Some(delay) = retry_delay(&exchange, attempt + 1) {
                    attempt += 1;
                    tracing::warn!(
                        %req_id,
                        status = %exchange.status,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        %message,
                        "http.retrying"
                    );
                    sleep(delay).await;
                    continue;
                }
            }

            let reset = rate_limit_reset(&exchange.headers);
            let request_id = upstream_request_id(&exchange.headers).unwrap_or("-").to_string();
            tracing::warn!(
                %req_id,
                status = %exchange.status,
                %message,
                x_request_id = %request_id,
                rate_limit.reset = ?reset,
                body_snippet = %snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status: exchange.status,
                message,
                request_id,
                rate_limit_reset: reset,
            });
        }
    }

    fn build(
        &self,
        method: Method,
        url: Url,
        body: Option<&Body>,
        opts: &RequestOpts<'_>,
        timeout: Duration,
    ) -> Result<RequestBuilder, HttpError> {
        let mut rb = self.inner.request(method, url).timeout(timeout);

        match body {
            Some(Body::Json(bytes)) => {
                rb = rb.header(CONTENT_TYPE, "application/json").body(bytes.clone());
            }
            Some(Body::Multipart(file)) => {
                let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                rb = rb.multipart(Form::new().part(file.field.clone(), part));
            }
            None => {}
        }

        if let Some(headers) = &opts.headers {
            rb = rb.headers(headers.clone());
        }

        match &opts.auth {
            Some(Auth::Bearer(token)) => rb = rb.bearer_auth(sanitize_bearer(token)?),
            Some(Auth::Header { name, value }) => rb = rb.header(name, value),
            Some(Auth::None) | None => {}
        }
        Ok(rb)
    }
}

async fn send(request: RequestBuilder) -> Result<Exchange, String> {
    let resp = request.send().await.map_err(|e| e.to_string())?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
    Ok(Exchange {
        status,
        headers,
        bytes: bytes.to_vec(),
    })
}

fn log_exchange(req_id: &str, exchange: &Exchange, elapsed: Duration, raw: bool) {
    let headers = &exchange.headers;
    tracing::debug!(
        %req_id,
        status = %exchange.status,
        duration_ms = elapsed.as_millis() as u64,
        body_len = exchange.bytes.len(),
        x_request_id = %upstream_request_id(headers).unwrap_or("-"),
        rate_limit.limit = ?header_str(headers, "x-rate-limit-limit"),
        rate_limit.remaining = ?header_str(headers, "x-rate-limit-remaining"),
        rate_limit.reset = ?rate_limit_reset(headers),
        "http.response.headers"
    );
    if raw {
        let shown = &exchange.bytes[..exchange.bytes.len().min(RAW_MAX_BODY)];
        tracing::info!(
            target: "http.raw",
            %req_id,
            status = %exchange.status,
            headers = ?redact_headers(headers),
            body = %String::from_utf8_lossy(shown),
            truncated = exchange.bytes.len() > RAW_MAX_BODY
        );
    }
}

/// Delay before the next attempt, or `None` when the status is not retryable.
fn retry_delay(exchange: &Exchange, next_attempt: usize) -> Option<Duration> {
    let rate_limited = exchange.status == StatusCode::TOO_MANY_REQUESTS;
    if !rate_limited && !exchange.status.is_server_error() {
        return None;
    }
    let delay = match retry_after_secs(&exchange.headers) {
        Some(secs) => Duration::from_secs(secs),
        None if rate_limited => backoff(next_attempt).max(Duration::from_millis(1100)),
        None => backoff(next_attempt),
    };
    Some(delay)
}

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn request_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("r{nanos:x}")
}

fn backoff(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1 << exp))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn upstream_request_id(headers: &HeaderMap) -> Option<&str> {
    ["x-request-id", "x-transaction-id", "x-correlation-id"]
        .into_iter()
        .find_map(|name| header_str(headers, name))
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<i64> {
    header_str(headers, RATE_LIMIT_RESET)?.trim().parse().ok()
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

/// The most useful message in an error body.
///
/// Understands OpenAI (`error.message`), X v2 (`errors[0]` or top-level
/// `detail`/`title`) and plain `message`/`error` strings, else a snippet.
fn error_message(body: &[u8]) -> String {
    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        return snip_body(body);
    };
    let text = |v: &Value, key: &str| {
        v.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(msg) = json.get("error").and_then(|e| text(e, "message")) {
        return msg;
    }
    if let Some(first) = json.get("errors").and_then(|e| e.get(0)) {
        if let Some(msg) = ["message", "detail", "title"]
            .iter()
            .find_map(|k| text(first, k))
        {
            return msg;
        }
    }
    ["detail", "message", "title", "error"]
        .iter()
        .find_map(|k| text(&json, k))
        .unwrap_or_else(|| snip_body(body))
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let token: String = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if !token.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if token.bytes().any(|b| b.is_ascii_control()) {
        return Err(HttpError::Build("API key contains control characters".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}

fn is_secret_key(key: &str) -> bool {
    SECRET_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == AUTHORIZATION || name.as_str() == "set-cookie" {
                "<redacted>".to_string()
            } else {
                value.to_str().unwrap_or("").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// A curl command reproducing the request, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: Option<&HeaderMap>, body: Option<&Body>) -> String {
    let quote = |s: &str| s.replace('\'', r"'\''");
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];

    for (name, value) in headers.map(redact_headers).unwrap_or_default() {
        parts.push(format!("-H '{name}: {}'", quote(&value)));
    }
    match body {
        Some(Body::Json(bytes)) => {
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            parts.push(format!("-d '{}'", quote(&text)));
        }
        Some(Body::Multipart(file)) => {
            parts.push(format!("-F '{}=@{}'", file.field, file.file_name));
        }
        None => {}
    }

    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_key(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    parts.push(format!("'{shown}'"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_is_sanitized() {
        assert_eq!(sanitize_bearer(" \"sk-abc 123\"\n").unwrap(), "sk-abc123");
        assert!(sanitize_bearer("sk-ключ").is_err());
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        let openai = br#"{"error":{"message":"bad key"}}"#;
        assert_eq!(error_message(openai), "bad key");

        let twitter = br#"{"errors":[{"title":"Too Many Requests"}]}"#;
        assert_eq!(error_message(twitter), "Too Many Requests");

        let problem = br#"{"title":"Unauthorized","detail":"Unauthorized","status":401}"#;
        assert_eq!(error_message(problem), "Unauthorized");

        let generic = br#"{"detail":"You are not permitted"}"#;
        assert_eq!(error_message(generic), "You are not permitted");

        assert_eq!(error_message(b"plain failure"), "plain failure");
    }

    #[test]
    fn rate_limit_reset_parses_unix_seconds() {
        let mut h = HeaderMap::new();
        assert_eq!(rate_limit_reset(&h), None);
        h.insert(RATE_LIMIT_RESET, HeaderValue::from_static("1700000000"));
        assert_eq!(rate_limit_reset(&h), Some(1_700_000_000));
        h.insert(RATE_LIMIT_RESET, HeaderValue::from_static("soon"));
        assert_eq!(rate_limit_reset(&h), None);
    }

    #[test]
    fn only_throttling_and_server_errors_retry() {
        let exchange = |status: StatusCode| Exchange {
            status,
            headers: HeaderMap::new(),
            bytes: Vec::new(),
        };
        assert_eq!(retry_delay(&exchange(StatusCode::UNAUTHORIZED), 1), None);
        assert_eq!(
            retry_delay(&exchange(StatusCode::BAD_GATEWAY), 2),
            Some(Duration::from_millis(400))
        );
        assert_eq!(
            retry_delay(&exchange(StatusCode::TOO_MANY_REQUESTS), 1),
            Some(Duration::from_millis(1100))
        );

        let mut throttled = exchange(StatusCode::TOO_MANY_REQUESTS);
        throttled
            .headers
            .insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_delay(&throttled, 1), Some(Duration::from_secs(3)));
    }

    #[test]
    fn curl_redacts_auth_and_secret_query() {
        let url = Url::parse("https://api.example.com/v1/x?token=abc&q=sol").unwrap();
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_static("OAuth secret"));
        let curl = make_curl(&Method::GET, &url, Some(&h), None);
        assert!(!curl.contains("secret"));
        assert!(!curl.contains("abc"));
        assert!(curl.contains("q=sol"));
    }

    #[test]
    fn snip_respects_char_boundaries() {
        let body = "🚀".repeat(200);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }
}
