use std::fmt;

use crate::{FailureKind, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drive the full text/attachment/click sequence for one prompt.
    Submit {
        submission_id: SubmissionId,
        prompt: String,
    },
    /// Arm the generation timeout; replaces any armed timer.
    ArmTimeout { submission_id: SubmissionId },
    ClearTimeout,
    /// Abort any in-flight attachment paste sequence.
    CancelPastes,
    Report(RunNotice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunNotice {
    Started { prompts: usize, looping: bool },
    StartRejected { reason: String },
    Submitted { submission_id: SubmissionId },
    Completed { submission_id: SubmissionId },
    Stalled { submission_id: SubmissionId },
    Refilled { prompts: usize },
    Stopped { reason: StopReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Queue drained with looping disabled.
    Drained,
    UserRequested,
    PromptFieldMissing,
    SubmitControlMissing,
    HostFailure(String),
}

impl StopReason {
    /// Missing-element and host failures end the run abnormally.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StopReason::Drained | StopReason::UserRequested)
    }
}

impl From<FailureKind> for StopReason {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::PromptFieldMissing => StopReason::PromptFieldMissing,
            FailureKind::SubmitControlMissing => StopReason::SubmitControlMissing,
            FailureKind::Host(message) => StopReason::HostFailure(message),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Drained => write!(f, "queue drained"),
            StopReason::UserRequested => write!(f, "stopped by user"),
            StopReason::PromptFieldMissing => write!(f, "prompt field not found"),
            StopReason::SubmitControlMissing => write!(f, "submit control not found"),
            StopReason::HostFailure(message) => write!(f, "host page failure: {message}"),
        }
    }
}
