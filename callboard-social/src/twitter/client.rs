//! Twitter/X client for the three user-context calls the bot makes.
//!
//! Every request is OAuth 1.0a signed and sent with a zero retry budget: a
//! 429 surfaces as [`SocialError::RateLimited`] and the caller decides.
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use callboard_common::TwitterCredentials;
use callboard_http::header::{AUTHORIZATION, HeaderValue};
use callboard_http::{Auth, HttpClient, MultipartFile, RequestOpts};

use super::error::{SocialError, SocialResult};
use super::oauth::OAuthSigner;
use super::types::{
    CreateTweetRequest, CreatedTweet, DataEnvelope, MediaSettings, MediaUpload, ReplySettings,
    User,
};
use crate::publisher::{Account, PostDraft, Publisher};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com/";
pub const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    signer: OAuthSigner,
    upload_url: String,
}

impl TwitterApi {
    pub fn new(credentials: TwitterCredentials) -> SocialResult<Self> {
        Self::with_endpoints(credentials, TWITTER_API_BASE, MEDIA_UPLOAD_URL)
    }

    /// Point the client at other hosts (mock servers, proxies).
    pub fn with_endpoints(
        credentials: TwitterCredentials,
        api_base: &str,
        upload_url: &str,
    ) -> SocialResult<Self> {
        let http = HttpClient::new(api_base)?.with_retries(0);
        Ok(Self {
            http,
            signer: OAuthSigner::new(credentials),
            upload_url: upload_url.to_string(),
        })
    }

    fn signed(
        &self,
        method: &str,
        path: &str,
        allow_absolute: bool,
    ) -> SocialResult<RequestOpts<'static>> {
        let url = self.http.resolve(path, allow_absolute)?;
        let header = self.signer.authorization(method, url.as_str(), &[])?;
        let value = HeaderValue::from_str(&header)
            .map_err(|e| SocialError::Signing(format!("invalid header value: {e}")))?;
        Ok(RequestOpts {
            auth: Some(Auth::Header {
                name: AUTHORIZATION,
                value,
            }),
            retries: Some(0),
            allow_absolute,
            ..Default::default()
        })
    }

    pub async fn get_me(&self) -> SocialResult<User> {
        let opts = self.signed("GET", "2/users/me", false)?;
        let resp: DataEnvelope<User> = self.http.get_json("2/users/me", opts).await?;
        Ok(resp.data)
    }

    pub async fn create_tweet(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        media_ids: &[String],
    ) -> SocialResult<CreatedTweet> {
        let body = CreateTweetRequest {
            text,
            reply: in_reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
            media: (!media_ids.is_empty()).then_some(MediaSettings { media_ids }),
        };
        let opts = self.signed("POST", "2/tweets", false)?;
        let resp: DataEnvelope<CreatedTweet> =
            self.http.post_json_opts("2/tweets", &body, opts).await?;
        tracing::debug!(
            tweet_id = %resp.data.id,
            reply = in_reply_to.is_some(),
            "twitter.tweet_created"
        );
        Ok(resp.data)
    }

    pub async fn media_upload(&self, path: &Path) -> SocialResult<MediaUpload> {
        let bytes = tokio::fs::read(path).await.map_err(|source| SocialError::Media {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media")
            .to_string();

        let mut opts = self.signed("POST", &self.upload_url, true)?;
        opts.timeout = Some(UPLOAD_TIMEOUT);
        let file = MultipartFile {
            field: "media".to_string(),
            file_name,
            bytes,
        };
        Ok(self.http.post_multipart(&self.upload_url, file, opts).await?)
    }
}

#[async_trait]
impl Publisher for TwitterApi {
    async fn verify_credentials(&self) -> SocialResult<Account> {
        let user = self.get_me().await?;
        Ok(Account {
            id: user.id,
            username: user.username,
        })
    }

    async fn publish(&self, draft: &PostDraft) -> SocialResult<String> {
        let created = self
            .create_tweet(&draft.text, draft.reply_to.as_deref(), &draft.media_ids)
            .await?;
        Ok(created.id)
    }

    async fn upload_media(&self, path: &Path) -> SocialResult<String> {
        let upload = self.media_upload(path).await?;
        upload.id().ok_or_else(|| SocialError::Api {
            status: 200,
            message: "media upload response carried no media id".into(),
        })
    }
}
