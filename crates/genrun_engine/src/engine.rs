use std::io;
use std::sync::Arc;
use std::thread;

use crate::{AttachmentStore, Command, ControllerHandle, Page, RunController, RunEvent, RunSettings};

/// Runs a [`RunController`] on its own thread with a single-threaded runtime,
/// so every state transition happens on one event loop.
pub struct RunnerHandle {
    controller: ControllerHandle,
    worker: Option<thread::JoinHandle<()>>,
}

impl RunnerHandle {
    pub fn new(settings: RunSettings, page: Page, persistence: bool) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (controller, handle) = RunController::new(settings, page, persistence);
        let worker = thread::Builder::new()
            .name("genrun-controller".to_string())
            .spawn(move || runtime.block_on(controller.run()))?;

        Ok(Self {
            controller: handle,
            worker: Some(worker),
        })
    }

    pub fn send(&self, command: Command) -> bool {
        self.controller.send(command)
    }

    pub fn try_recv(&mut self) -> Option<RunEvent> {
        self.controller.try_event()
    }

    /// Waits for the next event; `None` once the controller has exited.
    pub fn blocking_recv(&mut self) -> Option<RunEvent> {
        self.controller.blocking_event()
    }

    pub fn attachments(&self) -> &Arc<AttachmentStore> {
        self.controller.attachments()
    }

    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.controller.send(Command::Shutdown);
            let _ = worker.join();
        }
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
