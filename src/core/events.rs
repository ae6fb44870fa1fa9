//! Events emitted by the autosplitter

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::triggers::{SplitCategory, SplitRule};

/// Event emitted when a split rule was consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// Category of the consumed rule
    pub category: SplitCategory,
    /// Identifier of the consumed rule (empty for TruthEnding)
    pub identifier: String,
    /// Zero-based index of this split within the current session
    pub split_index: usize,
    /// Wall-clock time of the split, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

impl SplitEvent {
    /// Create a split event for `rule`, stamped now
    pub fn new(rule: &SplitRule, split_index: usize) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            category: rule.category,
            identifier: rule.identifier.clone(),
            split_index,
            timestamp_ms,
        }
    }

    /// The rule this split consumed
    pub fn rule(&self) -> SplitRule {
        SplitRule::new(self.category, self.identifier.clone())
    }
}

/// Timer actions reported to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// A new session started
    Started,
    /// A split fired
    Split(SplitEvent),
    /// The session was reset
    Reset,
    /// Loading state changed
    LoadingChanged(bool),
}

/// Callback type for timer events
pub type EventCallback = Box<dyn Fn(&TimerEvent) + Send + Sync>;

/// Callback type for split events
pub type SplitCallback = Box<dyn Fn(SplitEvent) + Send + Sync>;

/// Event handler that can have multiple listeners
pub struct EventHandler {
    callbacks: Vec<EventCallback>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback for every timer event
    pub fn on_event(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    /// Add a callback for split events only
    pub fn on_split(&mut self, callback: SplitCallback) {
        self.callbacks.push(Box::new(move |event| {
            if let TimerEvent::Split(split) = event {
                callback(split.clone());
            }
        }));
    }

    /// Emit an event to all listeners
    pub fn emit(&self, event: &TimerEvent) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    /// Check if there are any listeners
    pub fn has_listeners(&self) -> bool {
        !self.callbacks.is_empty()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
