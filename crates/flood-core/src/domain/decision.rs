use serde::Serialize;

use super::SubjectId;

/// Outcome of a single flood check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloodDecision {
    pub subject_id: SubjectId,
    pub allowed: bool,
    /// Events inside the window, including the attempt just recorded.
    pub count: u64,
    pub max_events: u32,
}

impl FloodDecision {
    pub fn new(subject_id: SubjectId, count: u64, max_events: u32) -> Self {
        Self {
            subject_id,
            allowed: count <= u64::from(max_events),
            count,
            max_events,
        }
    }

    /// Attempts still permitted in the current window.
    pub fn remaining(&self) -> u64 {
        u64::from(self.max_events).saturating_sub(self.count)
    }
}
