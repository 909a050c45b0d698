//! The publishing seam used by the bot workflow.
//!
//! [`crate::twitter::TwitterApi`] is the production implementation; tests
//! substitute recording fakes.
use crate::twitter::SocialResult;
use async_trait::async_trait;
use std::path::Path;

/// Identity of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
}

/// A post waiting to be published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub reply_to: Option<String>,
    pub media_ids: Vec<String>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_reply_to(mut self, post_id: impl Into<String>) -> Self {
        self.reply_to = Some(post_id.into());
        self
    }

    pub fn with_media(mut self, media_id: Option<String>) -> Self {
        self.media_ids.extend(media_id);
        self
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Look up the authenticated account; fails when the credentials are rejected.
    async fn verify_credentials(&self) -> SocialResult<Account>;

    /// Publish a post and return its id.
    async fn publish(&self, draft: &PostDraft) -> SocialResult<String>;

    /// Upload a local image and return its media id.
    async fn upload_media(&self, path: &Path) -> SocialResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_builder_threads_and_attaches() {
        let draft = PostDraft::new("hi").in_reply_to("10").with_media(Some("m1".into()));
        assert_eq!(draft.reply_to.as_deref(), Some("10"));
        assert_eq!(draft.media_ids, vec!["m1".to_string()]);

        let bare = PostDraft::new("hi").with_media(None);
        assert!(bare.media_ids.is_empty());
        assert!(bare.reply_to.is_none());
    }
}
