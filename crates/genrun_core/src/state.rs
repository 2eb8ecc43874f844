use std::fmt;

use crate::view_model::RunViewModel;
use crate::{CompletionSignal, PromptQueue, StopReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// Stop requested while a submission sequence is still in flight.
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub submitted: u64,
    pub completed: u64,
    pub stalled: u64,
    pub refills: u64,
}

/// Run-level context owned by the run controller.
///
/// Invariants: `generating` implies `RunState::Running`; `timeout_armed` is
/// only `Some` while `generating`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    run_state: RunState,
    looping: bool,
    generating: bool,
    queue: PromptQueue,
    signal: CompletionSignal,
    /// Submission whose sequence task has not reported back yet.
    in_flight: Option<SubmissionId>,
    /// Submission whose completion is pending.
    current: Option<SubmissionId>,
    timeout_armed: Option<SubmissionId>,
    next_id: u64,
    stats: RunStats,
    last_stop: Option<StopReason>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> RunViewModel {
        RunViewModel {
            run_state: self.run_state,
            looping: self.looping,
            generating: self.generating,
            remaining: self.queue.remaining(),
            total: self.queue.original_len(),
            current: self.current,
            stats: self.stats,
            last_stop: self.last_stop.clone(),
            dirty: self.dirty,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn queue(&self) -> &PromptQueue {
        &self.queue
    }

    pub fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    pub fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    pub fn current(&self) -> Option<SubmissionId> {
        self.current
    }

    pub fn timeout_armed(&self) -> Option<SubmissionId> {
        self.timeout_armed
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn last_stop(&self) -> Option<&StopReason> {
        self.last_stop.as_ref()
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn start_run(&mut self, prompts: Vec<String>, looping: bool) {
        self.run_state = RunState::Running;
        self.looping = looping;
        self.generating = false;
        self.queue = PromptQueue::new(prompts);
        self.signal.reset();
        self.current = None;
        self.timeout_armed = None;
        self.stats = RunStats::default();
        self.last_stop = None;
        self.dirty = true;
    }

    pub(crate) fn set_looping(&mut self, looping: bool) {
        if self.looping != looping {
            self.looping = looping;
            self.dirty = true;
        }
    }

    pub(crate) fn queue_mut(&mut self) -> &mut PromptQueue {
        self.dirty = true;
        &mut self.queue
    }

    pub(crate) fn note_refill(&mut self) {
        self.stats.refills += 1;
    }

    pub(crate) fn begin_submission(&mut self) -> SubmissionId {
        self.next_id += 1;
        let id = SubmissionId(self.next_id);
        self.in_flight = Some(id);
        self.dirty = true;
        id
    }

    /// Clears the in-flight marker if it belongs to `id`.
    pub(crate) fn finish_submission(&mut self, id: SubmissionId) -> bool {
        if self.in_flight == Some(id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn begin_generating(&mut self, id: SubmissionId) {
        self.generating = true;
        self.current = Some(id);
        self.timeout_armed = Some(id);
        self.signal.reset();
        self.stats.submitted += 1;
        self.dirty = true;
    }

    pub(crate) fn latch(&mut self, cue: crate::CompletionCue) -> bool {
        self.signal.latch(cue)
    }

    /// Ends the pending generation; returns the id it belonged to.
    pub(crate) fn end_generating(&mut self) -> Option<SubmissionId> {
        self.generating = false;
        self.timeout_armed = None;
        self.signal.reset();
        self.dirty = true;
        self.current.take()
    }

    pub(crate) fn note_completed(&mut self) {
        self.stats.completed += 1;
    }

    pub(crate) fn note_stalled(&mut self) {
        self.stats.stalled += 1;
    }

    pub(crate) fn enter_stopping(&mut self, reason: StopReason) {
        self.run_state = RunState::Stopping;
        self.last_stop = Some(reason);
        self.dirty = true;
    }

    pub(crate) fn enter_idle(&mut self, reason: StopReason) {
        self.run_state = RunState::Idle;
        self.last_stop = Some(reason);
        self.dirty = true;
    }
}
