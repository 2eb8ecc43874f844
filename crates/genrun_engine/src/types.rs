use std::time::Duration;

use genrun_core::RunNotice;

use crate::{Attachment, HostError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("no enabled submit control found within {0:?}")]
    SubmitControlNotFound(Duration),
    #[error("cancelled while waiting for the submit control")]
    Cancelled,
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasteError {
    #[error("no attachments stored")]
    Empty,
    #[error("another paste is still in progress")]
    Busy,
    #[error("prompt field not found")]
    NoPromptField,
    #[error("paste sequence cancelled")]
    Cancelled,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Data of a paste event observed on the prompt field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardEvent {
    pub files: Vec<Attachment>,
    /// Text the host inserted into the field for the pasted item, if any.
    pub placeholder_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The event carried no image file.
    NoImage,
    /// Persistence is on; the blob was appended at `index`.
    Stored { index: usize, len: usize },
    /// Persistence is off; the blob was pasted once and discarded.
    PastedOnce,
}

/// External requests accepted by the run controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { prompts: Vec<String>, looping: bool },
    Stop,
    SetLooping(bool),
    SetPersistence(bool),
    Capture(ClipboardEvent),
    PasteOne,
    PasteAll,
    ClearAttachments,
    Shutdown,
}

/// Notifications emitted by the run controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Notice(RunNotice),
    /// Result of a user-triggered paste; `Ok` carries the number of pastes.
    PasteFinished(Result<usize, PasteError>),
    Captured(Result<CaptureOutcome, PasteError>),
    AttachmentsCleared,
}
