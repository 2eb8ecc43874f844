use std::time::Duration;

use genrun_core::{Msg, SubmissionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The single outstanding generation timer.
#[derive(Debug, Default)]
pub struct GenerationTimeout {
    armed: Option<(SubmissionId, JoinHandle<()>)>,
}

impl GenerationTimeout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer for `submission_id`, aborting any previous one.
    pub fn arm(
        &mut self,
        submission_id: SubmissionId,
        after: Duration,
        msg_tx: mpsc::UnboundedSender<Msg>,
    ) {
        self.clear();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = msg_tx.send(Msg::TimeoutFired { submission_id });
        });
        self.armed = Some((submission_id, timer));
    }

    pub fn clear(&mut self) {
        if let Some((_, timer)) = self.armed.take() {
            timer.abort();
        }
    }

    pub fn armed_for(&self) -> Option<SubmissionId> {
        self.armed.as_ref().map(|(id, _)| *id)
    }
}

impl Drop for GenerationTimeout {
    fn drop(&mut self) {
        self.clear();
    }
}
