//! Generation-run engine: page bridge, attachments, watchers and effect execution.
mod adapter;
mod attachments;
mod bridge;
mod controller;
mod dom;
mod engine;
mod host;
mod settings;
mod simulated;
mod submission;
mod timeout;
mod types;
mod wait;
mod watch;

pub use adapter::{HeuristicAdapter, MatchSettings, Page, PageAdapter};
pub use attachments::AttachmentStore;
pub use bridge::DomBridge;
pub use controller::{ControllerHandle, RunController};
pub use dom::{DomElement, DomNode};
pub use engine::RunnerHandle;
pub use host::{
    Attachment, DomEvent, ElementHandle, ElementInfo, FrameworkHandler, HostError, HostPage,
    InteropError, MutationBatch,
};
pub use settings::RunSettings;
pub use simulated::{FrameworkMode, HostCall, SimulatedPage};
pub use timeout::GenerationTimeout;
pub use types::{BridgeError, CaptureOutcome, ClipboardEvent, Command, PasteError, RunEvent};
pub use watch::{CompletionWatcher, OverlayPass, SelectionOverlayWatcher};
