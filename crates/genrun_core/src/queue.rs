use std::collections::VecDeque;

/// Pending prompts of a run plus the immutable list they were started from.
///
/// `pending` only ever shrinks from the head, and is only refilled wholesale
/// from `original`, so `pending.len() <= original.len()` holds at all times.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptQueue {
    pending: VecDeque<String>,
    original: Vec<String>,
}

impl PromptQueue {
    pub fn new(prompts: Vec<String>) -> Self {
        Self {
            pending: prompts.iter().cloned().collect(),
            original: prompts,
        }
    }

    pub fn dequeue(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Restores the pending list from the original list.
    pub fn refill(&mut self) {
        self.pending = self.original.iter().cloned().collect();
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }
}
