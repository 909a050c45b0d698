use serde::{Deserialize, Serialize};

/// `{"data": ...}` envelope used by the v2 endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTweet {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of `POST /2/tweets`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTweetRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplySettings<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaSettings<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplySettings<'a> {
    pub in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaSettings<'a> {
    pub media_ids: &'a [String],
}

/// Response of the v1.1 media upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUpload {
    #[serde(default)]
    pub media_id: Option<u64>,
    #[serde(default)]
    pub media_id_string: Option<String>,
}

impl MediaUpload {
    /// The string form is authoritative; the numeric one can lose precision in some clients.
    pub fn id(&self) -> Option<String> {
        self.media_id_string
            .clone()
            .or_else(|| self.media_id.map(|id| id.to_string()))
    }
}
