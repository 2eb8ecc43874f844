use crate::{RunState, RunStats, StopReason, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunViewModel {
    pub run_state: RunState,
    pub looping: bool,
    pub generating: bool,
    pub remaining: usize,
    pub total: usize,
    pub current: Option<SubmissionId>,
    pub stats: RunStats,
    pub last_stop: Option<StopReason>,
    pub dirty: bool,
}
