//! Readers for game-side data structures
//!
//! These understand the layout of specific managed objects and turn them
//! into change events, independent of how their addresses were found.

mod dictionary;
mod save_slots;

pub use dictionary::{ChangeTrackingTable, DictionaryLayout, TableChange, TableChanges, MAX_TABLE_ENTRIES};
pub use save_slots::{read_slot_time, slot_time_or_empty, slot_time_pointer, SaveSlotTimes, SLOT_COUNT};
