use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use genrun_logging::run_trace;
use parking_lot::Mutex;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::broadcast;

use crate::{
    DomEvent, DomNode, ElementHandle, ElementInfo, FrameworkHandler, HostError, HostPage,
    InteropError, MutationBatch,
};

/// How the simulated page answers framework handler lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameworkMode {
    /// Elements expose no handler registry.
    #[default]
    Absent,
    Present,
    /// The registry exists but every handler throws.
    Failing,
}

/// Side effects recorded by [`SimulatedPage`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    NativeSet { element: ElementHandle, value: String },
    Dispatch { element: ElementHandle, event: &'static str },
    Pasted { element: ElementHandle, name: String },
    Handler { element: ElementHandle, handler: &'static str },
    OverlayAttached(ElementHandle),
    Removed(ElementHandle),
}

#[derive(Debug)]
struct SimElement {
    html: String,
    value: String,
    disabled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    elements: BTreeMap<ElementHandle, SimElement>,
    next_handle: u64,
    calls: Vec<HostCall>,
    framework: FrameworkMode,
    replace_value_on_paste: Option<String>,
    auto_complete: Option<Duration>,
    completions: usize,
}

impl Inner {
    fn register(&mut self, html: &str) -> ElementHandle {
        self.next_handle += 1;
        let handle = ElementHandle(self.next_handle);
        self.elements.insert(
            handle,
            SimElement {
                html: html.to_string(),
                value: String::new(),
                disabled: false,
            },
        );
        handle
    }

    fn element_mut(&mut self, handle: ElementHandle) -> Result<&mut SimElement, HostError> {
        self.elements
            .get_mut(&handle)
            .ok_or(HostError::Detached(handle))
    }
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    mutations: broadcast::Sender<MutationBatch>,
}

/// In-memory host page: elements are HTML snippets matched with real CSS
/// selectors, and every side effect is recorded for inspection.
///
/// With auto-completion enabled, each click on a control schedules the
/// progress-indicator removal and a new result tile after the configured
/// latency, the way the real host renders a finished generation.
#[derive(Debug, Clone)]
pub struct SimulatedPage {
    shared: Arc<Shared>,
}

impl Default for SimulatedPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPage {
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                mutations,
            }),
        }
    }

    /// A prompt field and a generate button; clicks complete after `latency`.
    pub fn demo(latency: Duration) -> Self {
        let page = Self::new();
        page.add_element(r#"<textarea placeholder="Describe the image you want"></textarea>"#);
        page.add_element(r#"<button aria-label="Generate">Generate</button>"#);
        page.set_auto_complete(Some(latency));
        page
    }

    /// Adds an element described by a single-root HTML snippet.
    pub fn add_element(&self, html: &str) -> ElementHandle {
        self.shared.inner.lock().register(html)
    }

    pub fn remove(&self, handle: ElementHandle) {
        self.shared.inner.lock().elements.remove(&handle);
    }

    pub fn set_disabled(&self, handle: ElementHandle, disabled: bool) {
        if let Some(element) = self.shared.inner.lock().elements.get_mut(&handle) {
            element.disabled = disabled;
        }
    }

    pub fn set_value(&self, handle: ElementHandle, value: &str) {
        if let Some(element) = self.shared.inner.lock().elements.get_mut(&handle) {
            element.value = value.to_string();
        }
    }

    pub fn value(&self, handle: ElementHandle) -> Option<String> {
        self.shared
            .inner
            .lock()
            .elements
            .get(&handle)
            .map(|element| element.value.clone())
    }

    pub fn set_framework_mode(&self, mode: FrameworkMode) {
        self.shared.inner.lock().framework = mode;
    }

    /// Makes every paste overwrite the target's value, like hosts that drop
    /// the typed text when an image lands.
    pub fn set_replace_value_on_paste(&self, value: Option<&str>) {
        self.shared.inner.lock().replace_value_on_paste = value.map(str::to_string);
    }

    pub fn set_auto_complete(&self, latency: Option<Duration>) {
        self.shared.inner.lock().auto_complete = latency;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.shared.inner.lock().calls.clone()
    }

    pub fn pasted(&self) -> Vec<String> {
        self.shared
            .inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Pasted { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clicks delivered either natively or through the framework handler.
    pub fn clicks(&self) -> usize {
        self.shared
            .inner
            .lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(call, HostCall::Dispatch { event: "click", .. })
                    || matches!(call, HostCall::Handler { handler: "onClick", .. })
            })
            .count()
    }

    pub fn completions(&self) -> usize {
        self.shared.inner.lock().completions
    }

    pub fn emit(&self, batch: MutationBatch) {
        // No subscribers is not an error for a page.
        let _ = self.shared.mutations.send(batch);
    }

    /// Removes a progress spinner and renders a new tile at index 0.
    pub fn emit_completion(&self) {
        let tile_html = r#"<div class="media-tile" data-index="0"><img src="result.png"></div>"#;
        let handle = {
            let mut inner = self.shared.inner.lock();
            inner.completions += 1;
            inner.register(tile_html)
        };
        let removed = DomNode::parse_fragment(r#"<svg class="MuiCircularProgress-svg"></svg>"#);
        let added = DomNode::parse_fragment(tile_html)
            .into_iter()
            .map(|node| node.with_handle(handle))
            .collect();
        self.emit(MutationBatch { added, removed });
    }

    fn on_click(&self) {
        let latency = self.shared.inner.lock().auto_complete;
        if let Some(latency) = latency {
            let page = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                page.emit_completion();
            });
        }
    }

    fn query_now(&self, selector: &str) -> Result<Vec<ElementInfo>, HostError> {
        let parsed = Selector::parse(selector)
            .map_err(|_| HostError::InvalidSelector(selector.to_string()))?;
        let inner = self.shared.inner.lock();
        let mut found = Vec::new();
        for (handle, element) in &inner.elements {
            let fragment = Html::parse_fragment(&element.html);
            let Some(root) = fragment
                .root_element()
                .children()
                .find_map(ElementRef::wrap)
            else {
                continue;
            };
            if !parsed.matches(&root) {
                continue;
            }
            found.push(ElementInfo {
                handle: *handle,
                tag: root.value().name().to_string(),
                text: root.text().collect::<String>().trim().to_string(),
                disabled: element.disabled || root.value().attr("disabled").is_some(),
            });
        }
        Ok(found)
    }
}

#[async_trait::async_trait]
impl HostPage for SimulatedPage {
    async fn query(&self, selector: &str) -> Result<Vec<ElementInfo>, HostError> {
        self.query_now(selector)
    }

    async fn read_value(&self, element: ElementHandle) -> Result<String, HostError> {
        let mut inner = self.shared.inner.lock();
        Ok(inner.element_mut(element)?.value.clone())
    }

    async fn native_set_value(&self, element: ElementHandle, value: &str) -> Result<(), HostError> {
        let mut inner = self.shared.inner.lock();
        inner.element_mut(element)?.value = value.to_string();
        inner.calls.push(HostCall::NativeSet {
            element,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn dispatch(&self, element: ElementHandle, event: DomEvent) -> Result<(), HostError> {
        {
            let mut inner = self.shared.inner.lock();
            let replacement = inner.replace_value_on_paste.clone();
            let target = inner.element_mut(element)?;
            let call = match &event {
                DomEvent::Paste(attachment) => {
                    if let Some(replacement) = replacement {
                        target.value = replacement;
                    }
                    HostCall::Pasted {
                        element,
                        name: attachment.name.clone(),
                    }
                }
                other => HostCall::Dispatch {
                    element,
                    event: other.name(),
                },
            };
            inner.calls.push(call);
        }
        run_trace!("simulated {} on {}", event.name(), element);
        if event == DomEvent::Click {
            self.on_click();
        }
        Ok(())
    }

    async fn invoke_framework_handler(
        &self,
        element: ElementHandle,
        handler: FrameworkHandler,
    ) -> Result<bool, InteropError> {
        let mode = self.shared.inner.lock().framework;
        match mode {
            FrameworkMode::Absent => Ok(false),
            FrameworkMode::Failing => Err(InteropError {
                handler: handler.name(),
                message: "handler threw".to_string(),
            }),
            FrameworkMode::Present => {
                {
                    let mut inner = self.shared.inner.lock();
                    let Ok(target) = inner.element_mut(element) else {
                        return Err(InteropError {
                            handler: handler.name(),
                            message: format!("element {element} is detached"),
                        });
                    };
                    if let FrameworkHandler::Change { value } = &handler {
                        target.value = value.clone();
                    }
                    inner.calls.push(HostCall::Handler {
                        element,
                        handler: handler.name(),
                    });
                }
                if handler == FrameworkHandler::Click {
                    self.on_click();
                }
                Ok(true)
            }
        }
    }

    async fn attach_selection_overlay(&self, tile: ElementHandle) -> Result<(), HostError> {
        let mut inner = self.shared.inner.lock();
        inner.element_mut(tile)?;
        inner.calls.push(HostCall::OverlayAttached(tile));
        Ok(())
    }

    async fn remove_element(&self, element: ElementHandle) -> Result<(), HostError> {
        let mut inner = self.shared.inner.lock();
        inner
            .elements
            .remove(&element)
            .ok_or(HostError::Detached(element))?;
        inner.calls.push(HostCall::Removed(element));
        Ok(())
    }

    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
        self.shared.mutations.subscribe()
    }
}
