//! Save slot play-time tracking
//!
//! The title screen save menu holds a fixed array of slot buttons, each
//! pointing at the save data shown on it. A slot whose play time drops from
//! a nonzero value to zero has been deleted.

use crate::memory::{MemoryReader, Pointer};

/// Number of save slots on the title screen
pub const SLOT_COUNT: usize = 3;

// slot array -> button[i] -> save data -> save -> play time
const SLOT_ELEMENT_BASE: i64 = 0x20;
const SLOT_ELEMENT_STRIDE: i64 = 0x8;
const SLOT_TIME_CHAIN: [i64; 3] = [0x18, 0x18, 0x40];

/// Pointer chain to the play time of `slot` inside the slot array at `save_slots`
pub fn slot_time_pointer(save_slots: usize, slot: usize) -> Pointer {
    let mut offsets = vec![SLOT_ELEMENT_BASE + SLOT_ELEMENT_STRIDE * slot as i64];
    offsets.extend_from_slice(&SLOT_TIME_CHAIN);
    Pointer::with_values(save_slots as i64, offsets, true)
}

/// Read a slot's play time, `None` when the chain is broken
pub fn read_slot_time(reader: &dyn MemoryReader, save_slots: usize, slot: usize) -> Option<f32> {
    if save_slots == 0 || slot >= SLOT_COUNT {
        return None;
    }
    slot_time_pointer(save_slots, slot).read::<f32>(reader)
}

/// Play time of a slot, with a slot that has no readable save counting as empty
pub fn slot_time_or_empty(reader: &dyn MemoryReader, save_slots: usize, slot: usize) -> f32 {
    read_slot_time(reader, save_slots, slot).unwrap_or(0.0)
}

/// Last observed play time of every save slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSlotTimes {
    times: [f32; SLOT_COUNT],
}

impl SaveSlotTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current time of `slot`, returns true when it went nonzero -> zero
    pub fn observe(&mut self, slot: usize, time: f32) -> bool {
        let Some(stored) = self.times.get_mut(slot) else {
            return false;
        };
        let old = std::mem::replace(stored, time);
        old != 0.0 && time == 0.0
    }

    /// Last recorded time of `slot`
    pub fn time(&self, slot: usize) -> Option<f32> {
        self.times.get(slot).copied()
    }

    /// Poll every slot, returns the first slot found deleted
    ///
    /// Every slot is recorded even when an earlier one was deleted. Nothing is
    /// read while the slot array is absent.
    pub fn poll(&mut self, reader: &dyn MemoryReader, save_slots: usize) -> Option<usize> {
        if save_slots == 0 {
            return None;
        }
        let mut deleted = None;
        for slot in 0..SLOT_COUNT {
            if self.observe(slot, slot_time_or_empty(reader, save_slots, slot)) && deleted.is_none() {
                deleted = Some(slot);
            }
        }
        deleted
    }
}
