//! Twitter/X publishing surface: OAuth 1.0a signing, the API client, and
//! the wire types for tweets, users and media uploads.
pub mod client;
pub mod error;
pub mod oauth;
pub mod types;

pub use client::TwitterApi;
pub use error::{SocialError, SocialResult, rate_limit_wait_secs};
