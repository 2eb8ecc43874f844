use std::time::Duration;

/// Timing knobs of a run.
///
/// The defaults are tuned against one host application's latency profile;
/// other hosts will usually need different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Time a submission may stay generating before it counts as a stall.
    pub generation_timeout: Duration,
    /// Pause after writing the prompt text, before pasting attachments.
    pub field_settle: Duration,
    /// Pause between focusing the field and dispatching a paste.
    pub focus_settle: Duration,
    /// Pause after a paste before the next one may start.
    pub paste_cooldown: Duration,
    /// Gap between consecutive pastes of a sequential paste-all.
    pub inter_paste_delay: Duration,
    /// Pause before clicking submit.
    pub submit_settle: Duration,
    /// Pause before clicking submit when more than one attachment was pasted.
    pub multi_attachment_settle: Duration,
    /// How long to keep looking for an enabled submit control.
    pub submit_wait_budget: Duration,
    pub submit_poll_interval: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(180),
            field_settle: Duration::from_millis(300),
            focus_settle: Duration::from_millis(100),
            paste_cooldown: Duration::from_millis(500),
            inter_paste_delay: Duration::from_millis(1500),
            submit_settle: Duration::from_millis(500),
            multi_attachment_settle: Duration::from_millis(2000),
            submit_wait_budget: Duration::from_secs(5),
            submit_poll_interval: Duration::from_millis(250),
        }
    }
}
