use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User started a run over `prompts`.
    StartRequested { prompts: Vec<String>, looping: bool },
    /// User pressed stop.
    StopRequested,
    /// User toggled looping; honoured at the next drain check.
    LoopingChanged(bool),
    /// The engine finished driving one submission sequence.
    SubmissionFinished {
        submission_id: crate::SubmissionId,
        outcome: SubmitOutcome,
    },
    /// Completion watcher observed one half of the completion proxy.
    Completion(CompletionCue),
    /// Generation timeout elapsed for a submission.
    TimeoutFired { submission_id: crate::SubmissionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCue {
    /// A progress indicator (spinner or bare percentage) left the DOM.
    IndicatorRemoved,
    /// A result tile was inserted at index 0.
    NewTileAppeared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submit control was clicked; the job is now generating.
    Submitted,
    /// The sequence observed a stop and bailed out.
    Cancelled,
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    PromptFieldMissing,
    SubmitControlMissing,
    Host(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::PromptFieldMissing => write!(f, "prompt field not found"),
            FailureKind::SubmitControlMissing => write!(f, "submit control not found"),
            FailureKind::Host(message) => write!(f, "host page failure: {message}"),
        }
    }
}
