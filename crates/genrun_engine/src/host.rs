use std::fmt;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::DomNode;

/// Opaque reference to a live element of the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Query result for one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub handle: ElementHandle,
    pub tag: String,
    /// Visible text content, used to filter fallback submit candidates.
    pub text: String,
    pub disabled: bool,
}

/// Image blob carried by a synthetic paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.to_ascii_lowercase().starts_with("image/")
    }

    /// First 12 hex digits of the SHA-256 of the payload, for log lines.
    pub fn short_digest(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    Focus,
    Input,
    Change,
    Click,
    Paste(Attachment),
}

impl DomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Focus => "focus",
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Click => "click",
            DomEvent::Paste(_) => "paste",
        }
    }
}

/// Handler looked up in the UI framework's internal props registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkHandler {
    Change { value: String },
    Click,
}

impl FrameworkHandler {
    pub fn name(&self) -> &'static str {
        match self {
            FrameworkHandler::Change { .. } => "onChange",
            FrameworkHandler::Click => "onClick",
        }
    }
}

/// One observer callback worth of DOM changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationBatch {
    pub added: Vec<DomNode>,
    pub removed: Vec<DomNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("element {0} is no longer attached")]
    Detached(ElementHandle),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("host backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("framework handler {handler} failed: {message}")]
pub struct InteropError {
    pub handler: &'static str,
    pub message: String,
}

/// Primitive operations on the third-party page.
///
/// Implemented by a browser backend in production and by
/// [`crate::SimulatedPage`] for tests and dry runs.
#[async_trait::async_trait]
pub trait HostPage: Send + Sync {
    async fn query(&self, selector: &str) -> Result<Vec<ElementInfo>, HostError>;

    async fn read_value(&self, element: ElementHandle) -> Result<String, HostError>;

    /// Writes through the prototype value setter, bypassing the framework's
    /// instance override so its change tracking notices the new value.
    async fn native_set_value(&self, element: ElementHandle, value: &str) -> Result<(), HostError>;

    async fn dispatch(&self, element: ElementHandle, event: DomEvent) -> Result<(), HostError>;

    /// `Ok(true)` if the handler ran, `Ok(false)` if the element exposes no
    /// handler registry.
    async fn invoke_framework_handler(
        &self,
        element: ElementHandle,
        handler: FrameworkHandler,
    ) -> Result<bool, InteropError>;

    async fn attach_selection_overlay(&self, tile: ElementHandle) -> Result<(), HostError>;

    async fn remove_element(&self, element: ElementHandle) -> Result<(), HostError>;

    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch>;
}
