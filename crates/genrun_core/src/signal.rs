use crate::CompletionCue;

/// Two-signal AND-join used as the completion proxy.
///
/// Neither cue alone means the job finished: the progress indicator can
/// vanish without a result, and tile reordering can insert an index-0 node
/// mid-generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSignal {
    indicator_removed: bool,
    new_tile_appeared: bool,
}

impl CompletionSignal {
    /// Latches `cue`. Returns `true` exactly once when both cues are set,
    /// and clears both before returning.
    pub fn latch(&mut self, cue: CompletionCue) -> bool {
        match cue {
            CompletionCue::IndicatorRemoved => self.indicator_removed = true,
            CompletionCue::NewTileAppeared => self.new_tile_appeared = true,
        }
        if self.indicator_removed && self.new_tile_appeared {
            self.reset();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.indicator_removed = false;
        self.new_tile_appeared = false;
    }

    pub fn indicator_removed(&self) -> bool {
        self.indicator_removed
    }

    pub fn new_tile_appeared(&self) -> bool {
        self.new_tile_appeared
    }
}
