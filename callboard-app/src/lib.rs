//! The callboard bot: ranks the outlight.fun "most called" tokens and posts
//! them as a two-part thread, with a follow-up comment every four hours.
//!
//! The binary in `main.rs` wires configuration and the production clients
//! into [`workflow::Workflow`]; everything here is usable with fakes.
pub mod cadence;
pub mod commentary;
pub mod compose;
pub mod workflow;

pub use cadence::{Clock, NoPacer, Pacer, SystemClock, TokioPacer, is_comment_hour};
pub use commentary::{CommentGenerator, GenerationParams};
pub use workflow::{RunOutcome, Stage, Workflow, WorkflowSettings};
