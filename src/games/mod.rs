//! Game model trait and the Death's Door implementation
//!
//! A game model owns the per-tick snapshots of one attached process and
//! exposes the session and split signals the splitter consumes.

pub mod deaths_door;

pub use deaths_door::{DeathsDoorFactory, DeathsDoorLayout, DeathsDoorMemory};

use crate::error::Result;
use crate::memory::{NamedPointers, ProcessContext};
use crate::triggers::GameSignals;

/// Snapshot-driven view of a running game
pub trait GameMemory: GameSignals + Send {
    /// Human-readable game name
    fn name(&self) -> &'static str;

    /// Refresh every snapshot for this tick
    ///
    /// Returns false when the process is gone and nothing was read.
    fn update(&mut self) -> bool;

    /// A new-save transition started on a slot with no play time
    fn new_save_transition_started(&self) -> bool;

    /// An empty slot was selected in the save menu this tick
    fn empty_slot_selected(&self) -> bool;

    /// A save slot went from a nonzero play time to zero since the last tick
    fn save_deleted(&mut self) -> bool;

    /// The save menu appeared this tick
    fn save_menu_entered(&self) -> bool;

    /// Loading screen or scene load in progress
    fn is_loading(&self) -> bool;

    /// Forget tracked tables and save initialisation, called on session start
    fn reset_data(&mut self);

    /// Whether the attached process is still alive
    fn is_alive(&self) -> bool;
}

/// Type alias for boxed game
pub type BoxedGame = Box<dyn GameMemory>;

/// Factory for creating game models once addresses are resolved
pub trait GameFactory: Send + Sync {
    /// Human-readable game name
    fn game_name(&self) -> &'static str;

    /// Create a model bound to `process` using the resolved `pointers`
    fn create(&self, process: &ProcessContext, pointers: &NamedPointers) -> Result<BoxedGame>;
}
