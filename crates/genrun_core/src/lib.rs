//! Generation-run core: pure run state machine, prompt queue and wildcard expansion.
mod effect;
mod msg;
mod queue;
mod signal;
mod state;
mod update;
mod view_model;
pub mod wildcard;

pub use effect::{Effect, RunNotice, StopReason};
pub use msg::{CompletionCue, FailureKind, Msg, SubmitOutcome};
pub use queue::PromptQueue;
pub use signal::CompletionSignal;
pub use state::{AppState, RunState, RunStats, SubmissionId};
pub use update::update;
pub use view_model::RunViewModel;
pub use wildcard::WildcardExpander;
