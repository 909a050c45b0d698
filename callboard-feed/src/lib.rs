//! Trending-token feed: fetches the outlight.fun "most called" list and ranks
//! it by calls from channels with a win rate above 30%.
pub mod outlight;
pub mod rank;
pub mod types;

pub use outlight::{OUTLIGHT_MOST_CALLED_URL, OutlightFeed, TokenSource};
pub use rank::{TOP_N, WIN_RATE_THRESHOLD, rank_tokens};
pub use types::{ChannelCall, RankedToken, RawToken};
