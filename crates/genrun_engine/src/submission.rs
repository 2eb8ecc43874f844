use std::sync::Arc;

use genrun_core::{FailureKind, SubmitOutcome};
use genrun_logging::{run_debug, run_error, run_warn};
use tokio_util::sync::CancellationToken;

use crate::wait::settle;
use crate::{AttachmentStore, BridgeError, DomBridge, HostError, Page, PasteError, RunSettings};

/// Everything one submission sequence needs, detached from the controller.
#[derive(Clone)]
pub(crate) struct SubmissionTask {
    pub(crate) page: Page,
    pub(crate) bridge: DomBridge,
    pub(crate) store: Arc<AttachmentStore>,
    pub(crate) settings: RunSettings,
    pub(crate) cancel: CancellationToken,
}

impl SubmissionTask {
    pub(crate) async fn run(&self, prompt: &str) -> SubmitOutcome {
        match self.drive(prompt).await {
            Ok(outcome) => outcome,
            Err(err) => {
                run_error!("submission aborted: {}", err);
                SubmitOutcome::Failed(FailureKind::Host(err.to_string()))
            }
        }
    }

    /// Text -> attachments -> verify -> settle -> click, checking for stop at
    /// every wait.
    async fn drive(&self, prompt: &str) -> Result<SubmitOutcome, HostError> {
        let host = self.page.host.as_ref();
        let Some(field) = self.page.find_prompt_field().await? else {
            run_error!("prompt field not found; stopping run");
            return Ok(SubmitOutcome::Failed(FailureKind::PromptFieldMissing));
        };

        self.bridge.set_managed_text_value(host, field, prompt).await?;
        if !settle(self.settings.field_settle, &self.cancel).await {
            return Ok(SubmitOutcome::Cancelled);
        }

        let mut pasted = 0;
        if self.store.persistence_enabled() && !self.store.is_empty() {
            match self
                .store
                .paste_all_sequential(&self.page, self.settings.inter_paste_delay, &self.cancel)
                .await
            {
                Ok(count) => pasted = count,
                Err(PasteError::Cancelled) => return Ok(SubmitOutcome::Cancelled),
                Err(err) => run_warn!("attachments skipped for this submission: {}", err),
            }
        }

        // Some hosts clear the text when an image lands. With attachments
        // present the field now holds their placeholders, so the prompt goes
        // in front instead of replacing them.
        let current = host.read_value(field).await?;
        if !current.contains(prompt) {
            let restored = if pasted > 0 && !current.trim().is_empty() {
                format!("{prompt} {current}")
            } else {
                prompt.to_string()
            };
            run_warn!("prompt text missing after paste; re-asserting");
            self.bridge.set_managed_text_value(host, field, &restored).await?;
        }

        let wait = if pasted > 1 {
            self.settings.multi_attachment_settle
        } else {
            self.settings.submit_settle
        };
        if !settle(wait, &self.cancel).await {
            return Ok(SubmitOutcome::Cancelled);
        }

        match self
            .bridge
            .invoke_submit(&self.page, self.settings.submit_wait_budget, &self.cancel)
            .await
        {
            Ok(control) => {
                run_debug!("submitted via {} with {} attachments", control, pasted);
                Ok(SubmitOutcome::Submitted)
            }
            Err(BridgeError::Cancelled) => Ok(SubmitOutcome::Cancelled),
            Err(BridgeError::SubmitControlNotFound(budget)) => {
                run_error!("submit control not found within {:?}; stopping run", budget);
                Ok(SubmitOutcome::Failed(FailureKind::SubmitControlMissing))
            }
            Err(BridgeError::Host(err)) => Err(err),
        }
    }
}
