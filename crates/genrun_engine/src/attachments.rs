use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use genrun_logging::{run_debug, run_info};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::wait::settle;
use crate::{
    Attachment, CaptureOutcome, ClipboardEvent, DomBridge, DomEvent, ElementHandle, HostPage,
    Page, PasteError, RunSettings,
};

#[derive(Debug, Default)]
struct Slots {
    items: Vec<Attachment>,
    /// `0 <= cursor < items.len()`, or 0 when empty.
    cursor: usize,
}

/// Ordered image attachments with a rotating paste cursor.
///
/// Only one paste runs at a time; a second caller gets [`PasteError::Busy`]
/// instead of waiting.
#[derive(Debug)]
pub struct AttachmentStore {
    slots: Mutex<Slots>,
    busy: AtomicBool,
    persistence: AtomicBool,
    focus_settle: Duration,
    cooldown: Duration,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AttachmentStore {
    pub fn new(persistence: bool, focus_settle: Duration, cooldown: Duration) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            busy: AtomicBool::new(false),
            persistence: AtomicBool::new(persistence),
            focus_settle,
            cooldown,
        }
    }

    pub fn from_settings(settings: &RunSettings, persistence: bool) -> Self {
        Self::new(persistence, settings.focus_settle, settings.paste_cooldown)
    }

    /// Appends to the tail and returns the new item's index.
    pub fn append(&self, attachment: Attachment) -> usize {
        let mut slots = self.slots.lock();
        if slots.items.is_empty() {
            slots.cursor = 0;
        }
        run_debug!(
            "stored attachment {} ({}, {} bytes, sha {})",
            attachment.name,
            attachment.mime,
            attachment.bytes.len(),
            attachment.short_digest()
        );
        slots.items.push(attachment);
        slots.items.len() - 1
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        slots.items.clear();
        slots.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.slots.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.slots.lock().cursor
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence.load(Ordering::Acquire)
    }

    pub fn set_persistence(&self, enabled: bool) {
        self.persistence.store(enabled, Ordering::Release);
    }

    pub fn snapshot(&self) -> Vec<Attachment> {
        self.slots.lock().items.clone()
    }

    fn try_acquire(&self) -> Result<BusyGuard<'_>, PasteError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| PasteError::Busy)
    }

    /// Pastes the item under the cursor, then advances the cursor.
    /// Returns the index that was pasted.
    pub async fn paste_one(
        &self,
        page: &Page,
        cancel: &CancellationToken,
    ) -> Result<usize, PasteError> {
        let _guard = self.try_acquire()?;
        let (index, item) = {
            let slots = self.slots.lock();
            let item = slots.items.get(slots.cursor).cloned().ok_or(PasteError::Empty)?;
            (slots.cursor, item)
        };
        let field = page
            .find_prompt_field()
            .await?
            .ok_or(PasteError::NoPromptField)?;

        self.paste_item(page.host.as_ref(), field, &item, cancel).await?;
        {
            let mut slots = self.slots.lock();
            if !slots.items.is_empty() {
                slots.cursor = (index + 1) % slots.items.len();
            }
        }
        // The paste already landed; a stop during cool-down does not undo it.
        settle(self.cooldown, cancel).await;
        Ok(index)
    }

    /// Pastes every item in insertion order, `delay` apart.
    /// Returns the number of items pasted.
    pub async fn paste_all_sequential(
        &self,
        page: &Page,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<usize, PasteError> {
        let _guard = self.try_acquire()?;
        let items = self.snapshot();
        if items.is_empty() {
            return Err(PasteError::Empty);
        }
        let field = page
            .find_prompt_field()
            .await?
            .ok_or(PasteError::NoPromptField)?;

        for (position, item) in items.iter().enumerate() {
            if position > 0 && !settle(delay, cancel).await {
                run_info!("paste sequence stopped after {} of {}", position, items.len());
                return Err(PasteError::Cancelled);
            }
            self.paste_item(page.host.as_ref(), field, item, cancel).await?;
        }
        Ok(items.len())
    }

    /// Handles an image pasted by the user onto the prompt field.
    pub async fn capture_from_clipboard_event(
        &self,
        page: &Page,
        bridge: &DomBridge,
        event: ClipboardEvent,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, PasteError> {
        let Some(image) = event.files.into_iter().find(Attachment::is_image) else {
            return Ok(CaptureOutcome::NoImage);
        };
        let host = page.host.as_ref();
        let persistence = self.persistence_enabled();
        // A one-shot paste must own the busy flag before the field is edited.
        let guard = if persistence {
            None
        } else {
            Some(self.try_acquire()?)
        };
        let field = page.find_prompt_field().await?;

        if let (Some(field), Some(placeholder)) = (field, event.placeholder_text) {
            let value = host.read_value(field).await?;
            if !placeholder.is_empty() && value.contains(&placeholder) {
                let cleaned = value.replacen(&placeholder, "", 1);
                bridge.set_managed_text_value(host, field, &cleaned).await?;
            }
        }

        if persistence {
            let index = self.append(image);
            return Ok(CaptureOutcome::Stored {
                index,
                len: self.len(),
            });
        }

        let _guard = guard;
        let field = field.ok_or(PasteError::NoPromptField)?;
        self.slots.lock().items.push(image.clone());
        let pasted = self.paste_item(host, field, &image, cancel).await;
        {
            let mut slots = self.slots.lock();
            if let Some(position) = slots.items.iter().rposition(|item| item == &image) {
                slots.items.remove(position);
            }
            if slots.cursor >= slots.items.len() {
                slots.cursor = 0;
            }
        }
        pasted.map(|()| CaptureOutcome::PastedOnce)
    }

    async fn paste_item(
        &self,
        host: &dyn HostPage,
        field: ElementHandle,
        item: &Attachment,
        cancel: &CancellationToken,
    ) -> Result<(), PasteError> {
        host.dispatch(field, DomEvent::Focus).await?;
        if !settle(self.focus_settle, cancel).await {
            return Err(PasteError::Cancelled);
        }
        host.dispatch(field, DomEvent::Paste(item.clone())).await?;
        run_debug!("pasted {} (sha {}) into {}", item.name, item.short_digest(), field);
        Ok(())
    }
}
