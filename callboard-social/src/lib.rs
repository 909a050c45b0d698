//! Social network clients used by Callboard.
//!
//! Only Twitter/X is implemented. The workflow talks to it through the
//! [`Publisher`] trait.
pub mod publisher;
pub mod twitter;

pub use publisher::{Account, PostDraft, Publisher};
