//! Autosplitter state types

use serde::{Deserialize, Serialize};

use super::events::SplitEvent;

/// Current state of the autosplitter, as exported to observers
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AutosplitterState {
    /// Whether the background runner is running
    pub running: bool,
    /// Whether a game process is currently attached
    pub process_attached: bool,
    /// Process ID if attached
    pub process_id: Option<u32>,
    /// Whether address resolution finished and the game model is live
    pub ready: bool,
    /// Whether a session (timer run) is in progress
    pub session_active: bool,
    /// Whether the game reports a load
    pub loading: bool,
    /// Splits taken in the current session, in order
    pub splits: Vec<SplitEvent>,
    /// Rules not yet consumed in the current session
    pub remaining: usize,
    /// Last resolution or attach problem, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl AutosplitterState {
    /// Create a new default state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of splits taken this session
    pub fn split_count(&self) -> usize {
        self.splits.len()
    }

    /// Clear per-session progress
    pub fn reset(&mut self) {
        self.session_active = false;
        self.splits.clear();
        self.remaining = 0;
    }

    /// Clear everything tied to the attached process
    pub fn detach(&mut self) {
        self.process_attached = false;
        self.process_id = None;
        self.ready = false;
        self.loading = false;
    }
}
