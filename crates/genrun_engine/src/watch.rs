use std::sync::Arc;

use genrun_core::{CompletionCue, Msg};
use genrun_logging::{run_debug, run_trace, run_warn};
use tokio::sync::{broadcast, mpsc};

use crate::{MutationBatch, Page, PageAdapter};

/// Turns mutation batches into completion cues for the run state machine.
///
/// Holds no run state: gating on "generating" and the AND-join both live
/// in the core.
#[derive(Clone)]
pub struct CompletionWatcher {
    adapter: Arc<dyn PageAdapter>,
}

impl CompletionWatcher {
    pub fn new(adapter: Arc<dyn PageAdapter>) -> Self {
        Self { adapter }
    }

    pub fn classify(&self, batch: &MutationBatch) -> Vec<CompletionCue> {
        let mut cues = Vec::new();
        if batch
            .removed
            .iter()
            .any(|node| self.adapter.is_completion_indicator_removal(node))
        {
            cues.push(CompletionCue::IndicatorRemoved);
        }
        if batch
            .added
            .iter()
            .any(|node| self.adapter.is_new_result_tile(node))
        {
            cues.push(CompletionCue::NewTileAppeared);
        }
        cues
    }

    pub async fn run(
        self,
        mut mutations: broadcast::Receiver<MutationBatch>,
        msg_tx: mpsc::UnboundedSender<Msg>,
    ) {
        loop {
            match mutations.recv().await {
                Ok(batch) => {
                    for cue in self.classify(&batch) {
                        run_trace!("completion cue {:?}", cue);
                        if msg_tx.send(Msg::Completion(cue)).is_err() {
                            return;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    run_warn!("completion watcher skipped {} mutation batches", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayPass {
    pub attached: usize,
    pub removed_native: usize,
}

/// Keeps selection overlays on freshly rendered result tiles.
/// Runs for the lifetime of the controller, independent of run state.
#[derive(Clone)]
pub struct SelectionOverlayWatcher {
    page: Page,
}

impl SelectionOverlayWatcher {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub async fn handle_batch(&self, batch: &MutationBatch) -> OverlayPass {
        let adapter = self.page.adapter.as_ref();
        let host = self.page.host.as_ref();
        let mut pass = OverlayPass::default();

        for node in &batch.added {
            for element in node.elements() {
                if !adapter.is_native_selection_ui(element) {
                    continue;
                }
                let Some(handle) = element.handle else {
                    continue;
                };
                match host.remove_element(handle).await {
                    Ok(()) => pass.removed_native += 1,
                    Err(err) => {
                        run_warn!("could not remove native selection UI {}: {}", handle, err)
                    }
                }
            }

            for tile in adapter.result_tiles(node) {
                if adapter.has_selection_control(tile) || adapter.is_task_placeholder(tile) {
                    continue;
                }
                let Some(handle) = tile.handle else {
                    run_trace!("tile without host handle skipped");
                    continue;
                };
                match host.attach_selection_overlay(handle).await {
                    Ok(()) => pass.attached += 1,
                    Err(err) => run_warn!("could not attach overlay to {}: {}", handle, err),
                }
            }
        }
        pass
    }

    pub async fn run(self, mut mutations: broadcast::Receiver<MutationBatch>) {
        loop {
            match mutations.recv().await {
                Ok(batch) => {
                    let pass = self.handle_batch(&batch).await;
                    if pass != OverlayPass::default() {
                        run_debug!(
                            "overlays attached={} native removed={}",
                            pass.attached,
                            pass.removed_native
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    run_warn!("overlay watcher skipped {} mutation batches", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}
