use std::sync::Arc;

use genrun_core::{update, AppState, Effect, Msg, RunNotice};
use genrun_logging::{run_error, run_info, run_warn, set_submission_tag};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::submission::SubmissionTask;
use crate::{
    AttachmentStore, Command, CompletionWatcher, DomBridge, GenerationTimeout, MutationBatch, Page,
    RunEvent, RunSettings, SelectionOverlayWatcher,
};

/// Owns the run context and executes the core's effects.
pub struct RunController {
    state: AppState,
    page: Page,
    bridge: DomBridge,
    store: Arc<AttachmentStore>,
    settings: RunSettings,
    timeout: GenerationTimeout,
    paste_cancel: CancellationToken,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<RunEvent>,
    completion_rx: Option<broadcast::Receiver<MutationBatch>>,
    overlay_rx: Option<broadcast::Receiver<MutationBatch>>,
}

/// Caller side of a [`RunController`].
pub struct ControllerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<RunEvent>,
    store: Arc<AttachmentStore>,
}

impl ControllerHandle {
    /// Returns `false` once the controller has shut down.
    pub fn send(&self, command: Command) -> bool {
        self.cmd_tx.send(command).is_ok()
    }

    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    pub fn try_event(&mut self) -> Option<RunEvent> {
        self.events.try_recv().ok()
    }

    /// Blocks the calling thread; must not be called from inside the runtime.
    pub fn blocking_event(&mut self) -> Option<RunEvent> {
        self.events.blocking_recv()
    }

    pub fn attachments(&self) -> &Arc<AttachmentStore> {
        &self.store
    }
}

impl RunController {
    /// Builds a controller and subscribes both watchers to the page's
    /// mutations. Nothing runs until [`RunController::run`] is awaited.
    pub fn new(settings: RunSettings, page: Page, persistence: bool) -> (Self, ControllerHandle) {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let store = Arc::new(AttachmentStore::from_settings(&settings, persistence));
        let completion_rx = Some(page.host.subscribe_mutations());
        let overlay_rx = Some(page.host.subscribe_mutations());

        let controller = Self {
            state: AppState::new(),
            bridge: DomBridge::new(settings.submit_poll_interval),
            page,
            store: store.clone(),
            settings,
            timeout: GenerationTimeout::new(),
            paste_cancel: CancellationToken::new(),
            msg_tx,
            msg_rx,
            cmd_rx,
            event_tx,
            completion_rx,
            overlay_rx,
        };
        let handle = ControllerHandle {
            cmd_tx,
            events,
            store,
        };
        (controller, handle)
    }

    pub async fn run(mut self) {
        let mut watchers: Vec<JoinHandle<()>> = Vec::new();
        if let Some(mutations) = self.completion_rx.take() {
            let watcher = CompletionWatcher::new(self.page.adapter.clone());
            watchers.push(tokio::spawn(watcher.run(mutations, self.msg_tx.clone())));
        }
        if let Some(mutations) = self.overlay_rx.take() {
            let watcher = SelectionOverlayWatcher::new(self.page.clone());
            watchers.push(tokio::spawn(watcher.run(mutations)));
        }

        loop {
            tokio::select! {
                Some(msg) = self.msg_rx.recv() => self.dispatch(msg),
                command = self.cmd_rx.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        self.timeout.clear();
        self.paste_cancel.cancel();
        for watcher in watchers {
            watcher.abort();
        }
        set_submission_tag(None);
        run_info!("run controller shut down");
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Submit {
                submission_id,
                prompt,
            } => {
                set_submission_tag(Some(submission_id.0));
                run_info!("submitting prompt {:?}", prompt);
                let task = self.submission_task();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let outcome = task.run(&prompt).await;
                    let _ = msg_tx.send(Msg::SubmissionFinished {
                        submission_id,
                        outcome,
                    });
                });
            }
            Effect::ArmTimeout { submission_id } => {
                self.timeout.arm(
                    submission_id,
                    self.settings.generation_timeout,
                    self.msg_tx.clone(),
                );
            }
            Effect::ClearTimeout => self.timeout.clear(),
            Effect::CancelPastes => {
                self.paste_cancel.cancel();
                self.paste_cancel = CancellationToken::new();
            }
            Effect::Report(notice) => {
                log_notice(&notice);
                if matches!(notice, RunNotice::Stopped { .. }) {
                    set_submission_tag(None);
                }
                let _ = self.event_tx.send(RunEvent::Notice(notice));
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { prompts, looping } => {
                self.dispatch(Msg::StartRequested { prompts, looping })
            }
            Command::Stop => self.dispatch(Msg::StopRequested),
            Command::SetLooping(looping) => self.dispatch(Msg::LoopingChanged(looping)),
            Command::SetPersistence(enabled) => {
                run_info!("attachment persistence {}", if enabled { "on" } else { "off" });
                self.store.set_persistence(enabled);
            }
            Command::Capture(event) => {
                let task = self.submission_task();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = task
                        .store
                        .capture_from_clipboard_event(&task.page, &task.bridge, event, &task.cancel)
                        .await;
                    if let Err(err) = &result {
                        run_warn!("clipboard capture failed: {}", err);
                    }
                    let _ = event_tx.send(RunEvent::Captured(result));
                });
            }
            Command::PasteOne => {
                let task = self.submission_task();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = task
                        .store
                        .paste_one(&task.page, &task.cancel)
                        .await
                        .map(|_| 1);
                    if let Err(err) = &result {
                        run_warn!("paste failed: {}", err);
                    }
                    let _ = event_tx.send(RunEvent::PasteFinished(result));
                });
            }
            Command::PasteAll => {
                let task = self.submission_task();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = task
                        .store
                        .paste_all_sequential(
                            &task.page,
                            task.settings.inter_paste_delay,
                            &task.cancel,
                        )
                        .await;
                    if let Err(err) = &result {
                        run_warn!("paste-all failed: {}", err);
                    }
                    let _ = event_tx.send(RunEvent::PasteFinished(result));
                });
            }
            Command::ClearAttachments => {
                self.store.clear();
                let _ = self.event_tx.send(RunEvent::AttachmentsCleared);
            }
            Command::Shutdown => {}
        }
    }

    fn submission_task(&self) -> SubmissionTask {
        SubmissionTask {
            page: self.page.clone(),
            bridge: self.bridge.clone(),
            store: self.store.clone(),
            settings: self.settings.clone(),
            cancel: self.paste_cancel.clone(),
        }
    }
}

fn log_notice(notice: &RunNotice) {
    match notice {
        RunNotice::Started { prompts, looping } => {
            run_info!("run started with {} prompts (loop={})", prompts, looping)
        }
        RunNotice::StartRejected { reason } => run_warn!("start rejected: {}", reason),
        RunNotice::Submitted { submission_id } => {
            run_info!("{} submitted; waiting for completion", submission_id)
        }
        RunNotice::Completed { submission_id } => run_info!("{} completed", submission_id),
        RunNotice::Stalled { submission_id } => {
            run_warn!("{} stalled: no completion before timeout", submission_id)
        }
        RunNotice::Refilled { prompts } => {
            run_info!("queue drained; looping over {} prompts", prompts)
        }
        RunNotice::Stopped { reason } if reason.is_fatal() => run_error!("run stopped: {}", reason),
        RunNotice::Stopped { reason } => run_info!("run stopped: {}", reason),
    }
}
