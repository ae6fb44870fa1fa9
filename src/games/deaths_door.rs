//! Death's Door game model
//!
//! Every value the splitter looks at is read once per tick into a
//! [`ValueSnapshot`]. Progression flags and counters live in two managed
//! dictionaries on the current save and are diffed through
//! [`ChangeTrackingTable`]s.

use std::sync::Arc;

use super::{BoxedGame, GameFactory, GameMemory};
use crate::core::ValueSnapshot;
use crate::error::{AutosplitterError, Result};
use crate::memory::{MemoryReader, NamedPointers, Pointer, ProcessContext};
use crate::readers::{slot_time_or_empty, ChangeTrackingTable, SaveSlotTimes, SLOT_COUNT};
use crate::triggers::{Color, GameSignals, Position3D, TriggerArea};

/// Names of the pointers the model needs from the resolver
pub mod names {
    /// `GameSceneManager.instance.isCurrentlyLoading`
    pub const IS_CURRENTLY_LOADING: &str = "is_currently_loading";
    /// `GameSceneManager.currentScene` (string reference)
    pub const CURRENT_SCENE: &str = "current_scene";
    /// `LoadingIcon.instance.show`
    pub const LOADING_ICON_SHOWN: &str = "loading_icon_shown";
    /// `TitleScreen.instance.saveMenu.saveSlots`
    pub const SAVE_SLOTS: &str = "save_slots";
    /// `TitleScreen.instance.saveMenu.index`
    pub const SLOT_INDEX: &str = "slot_index";
    /// `TitleScreen.instance.saveMenu.transitionButton`
    pub const SLOT_TRANSITION: &str = "slot_transition";
    /// `GameSave.currentSave.spawnId` (string reference)
    pub const SPAWN_ID: &str = "spawn_id";
    /// `GameSave.currentSave.boolKeys`
    pub const BOOL_KEYS: &str = "bool_keys";
    /// `GameSave.currentSave.countKeys`
    pub const COUNT_KEYS: &str = "count_keys";
    /// `ScreenFade.instance.fadeColor`
    pub const FADE_COLOR: &str = "fade_color";
    /// `ScreenFade.instance.timer`
    pub const FADE_TIMER: &str = "fade_timer";
    /// `ScreenFade.instance.maxTime`
    pub const FADE_MAX_TIME: &str = "fade_max_time";
    /// Player transform position
    pub const PLAYER_POSITION: &str = "player_position";

    pub const ALL: [&str; 13] = [
        IS_CURRENTLY_LOADING,
        CURRENT_SCENE,
        LOADING_ICON_SHOWN,
        SAVE_SLOTS,
        SLOT_INDEX,
        SLOT_TRANSITION,
        SPAWN_ID,
        BOOL_KEYS,
        COUNT_KEYS,
        FADE_COLOR,
        FADE_TIMER,
        FADE_MAX_TIME,
        PLAYER_POSITION,
    ];
}

/// Spawn id of a save that just left the intro bus
pub const NEW_SAVE_SPAWN_ID: &str = "bus_overridespawn";

/// Scene holding the truth ending trigger
pub const TRUTH_ENDING_SCENE: &str = "lvlConnect_Fortress_Mountaintops";

/// Truth ending trigger volume on the XZ plane
pub const TRUTH_TRIGGER: TriggerArea = TriggerArea {
    center_x: -128.9004,
    half_width: 6.1308,
    center_z: 789.7526,
    half_depth: 43.6074,
    padding: 1.0,
};

/// Resolved pointer for every value the model reads
#[derive(Debug, Clone, PartialEq)]
pub struct DeathsDoorLayout {
    pub is_currently_loading: Pointer,
    pub current_scene: Pointer,
    pub loading_icon_shown: Pointer,
    pub save_slots: Pointer,
    pub slot_index: Pointer,
    pub slot_transition: Pointer,
    pub spawn_id: Pointer,
    pub bool_keys: Pointer,
    pub count_keys: Pointer,
    pub fade_color: Pointer,
    pub fade_timer: Pointer,
    pub fade_max_time: Pointer,
    pub player_position: Pointer,
}

impl DeathsDoorLayout {
    /// Pick the model's pointers out of a resolver result
    pub fn from_named(pointers: &NamedPointers) -> Result<Self> {
        let missing: Vec<&str> = names::ALL
            .iter()
            .copied()
            .filter(|name| !pointers.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(AutosplitterError::resolution(format!(
                "missing pointers: {}",
                missing.join(", ")
            )));
        }

        let get = |name: &str| pointers.get(name).cloned().unwrap_or_default();
        Ok(Self {
            is_currently_loading: get(names::IS_CURRENTLY_LOADING),
            current_scene: get(names::CURRENT_SCENE),
            loading_icon_shown: get(names::LOADING_ICON_SHOWN),
            save_slots: get(names::SAVE_SLOTS),
            slot_index: get(names::SLOT_INDEX),
            slot_transition: get(names::SLOT_TRANSITION),
            spawn_id: get(names::SPAWN_ID),
            bool_keys: get(names::BOOL_KEYS),
            count_keys: get(names::COUNT_KEYS),
            fade_color: get(names::FADE_COLOR),
            fade_timer: get(names::FADE_TIMER),
            fade_max_time: get(names::FADE_MAX_TIME),
            player_position: get(names::PLAYER_POSITION),
        })
    }
}

/// Per-tick view of a running Death's Door process
pub struct DeathsDoorMemory {
    reader: Arc<dyn MemoryReader>,
    layout: DeathsDoorLayout,

    pub loading_icon_shown: ValueSnapshot<bool>,
    pub is_currently_loading: ValueSnapshot<bool>,
    pub scene: ValueSnapshot<String>,

    pub save_slots: ValueSnapshot<usize>,
    pub slot_index: ValueSnapshot<i32>,
    pub slot_transition: ValueSnapshot<usize>,
    pub spawn_id: ValueSnapshot<String>,

    pub fade_color: ValueSnapshot<Color>,
    pub fade_timer: ValueSnapshot<f32>,
    pub fade_max_time: ValueSnapshot<f32>,
    pub player_position: ValueSnapshot<Position3D>,

    bool_table: ValueSnapshot<usize>,
    count_table: ValueSnapshot<usize>,
    bool_keys: ChangeTrackingTable<bool>,
    count_keys: ChangeTrackingTable<i32>,

    slot_times: SaveSlotTimes,
    deleted_slot: Option<usize>,
    save_initialized: bool,
}

impl DeathsDoorMemory {
    pub fn new(reader: Arc<dyn MemoryReader>, layout: DeathsDoorLayout) -> Self {
        Self {
            reader,
            layout,
            loading_icon_shown: ValueSnapshot::new(),
            is_currently_loading: ValueSnapshot::new(),
            scene: ValueSnapshot::new(),
            save_slots: ValueSnapshot::new(),
            slot_index: ValueSnapshot::new(),
            slot_transition: ValueSnapshot::new(),
            spawn_id: ValueSnapshot::new(),
            fade_color: ValueSnapshot::new(),
            fade_timer: ValueSnapshot::new(),
            fade_max_time: ValueSnapshot::new(),
            player_position: ValueSnapshot::new(),
            bool_table: ValueSnapshot::new(),
            count_table: ValueSnapshot::new(),
            bool_keys: ChangeTrackingTable::new(),
            count_keys: ChangeTrackingTable::new(),
            slot_times: SaveSlotTimes::new(),
            deleted_slot: None,
            save_initialized: false,
        }
    }

    /// The current save has been seen leaving the intro bus this session
    pub fn save_initialized(&self) -> bool {
        self.save_initialized
    }

    pub fn bool_keys(&self) -> &ChangeTrackingTable<bool> {
        &self.bool_keys
    }

    pub fn count_keys(&self) -> &ChangeTrackingTable<i32> {
        &self.count_keys
    }

    /// Object references read as null when their chain is broken
    fn read_reference(&self, pointer: &Pointer) -> usize {
        pointer.read::<usize>(&*self.reader).unwrap_or(0)
    }

    /// The slot under the save menu cursor has no play time
    fn selected_slot_is_empty(&self) -> bool {
        match usize::try_from(self.slot_index.new) {
            Ok(slot) if slot < SLOT_COUNT => {
                slot_time_or_empty(&*self.reader, self.save_slots.new, slot) == 0.0
            }
            _ => false,
        }
    }
}

impl GameSignals for DeathsDoorMemory {
    fn scene(&self) -> &ValueSnapshot<String> {
        &self.scene
    }

    fn has_started_fading(&self, color: Color, max_time: f32) -> bool {
        self.fade_timer.increased() && self.fade_max_time.new == max_time && self.fade_color.new == color
    }

    fn new_bool_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_> {
        if !self.save_initialized {
            return Box::new(std::iter::empty());
        }
        let changes = self.bool_keys.poll(&*self.reader, self.bool_table.new);
        Box::new(changes.filter_map(|(key, value)| value.then_some(key)))
    }

    fn new_count_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_> {
        if !self.save_initialized {
            return Box::new(std::iter::empty());
        }
        let changes = self.count_keys.poll(&*self.reader, self.count_table.new);
        Box::new(changes.map(|(key, value)| format!("{}_{}", key, value)))
    }

    fn is_in_truth_trigger(&self) -> bool {
        self.scene.new == TRUTH_ENDING_SCENE && TRUTH_TRIGGER.contains(&self.player_position.new)
    }
}

impl GameMemory for DeathsDoorMemory {
    fn name(&self) -> &'static str {
        "Death's Door"
    }

    fn update(&mut self) -> bool {
        if !self.reader.is_valid() {
            return false;
        }

        let reader = &*self.reader;
        let layout = &self.layout;

        self.is_currently_loading.update(layout.is_currently_loading.read(reader));
        self.loading_icon_shown.update(layout.loading_icon_shown.read(reader));
        self.scene.update(layout.current_scene.read_string(reader));
        if self.scene.changed() {
            log::debug!("Scene '{}' -> '{}'", self.scene.old, self.scene.new);
        }

        let save_slots = self.read_reference(&self.layout.save_slots);
        let slot_transition = self.read_reference(&self.layout.slot_transition);
        let bool_table = self.read_reference(&self.layout.bool_keys);
        let count_table = self.read_reference(&self.layout.count_keys);
        self.save_slots.refresh(save_slots);
        self.slot_transition.refresh(slot_transition);
        self.bool_table.refresh(bool_table);
        self.count_table.refresh(count_table);

        // Sampled every tick, sessions or not, so deletions compare adjacent ticks
        self.deleted_slot = self.slot_times.poll(&*self.reader, save_slots);
        if let Some(slot) = self.deleted_slot {
            log::debug!("Save slot {} went empty", slot);
        }

        let reader = &*self.reader;
        let layout = &self.layout;
        self.slot_index.update(layout.slot_index.read(reader));
        self.spawn_id.update(layout.spawn_id.read_string(reader));
        self.fade_color.update(layout.fade_color.read(reader));
        self.fade_timer.update(layout.fade_timer.read(reader));
        self.fade_max_time.update(layout.fade_max_time.read(reader));
        self.player_position.update(layout.player_position.read(reader));

        if !self.save_initialized && self.spawn_id.new == NEW_SAVE_SPAWN_ID {
            log::debug!("Save initialized (spawn id {})", NEW_SAVE_SPAWN_ID);
            self.save_initialized = true;
        }

        true
    }

    fn new_save_transition_started(&self) -> bool {
        self.slot_transition.new != 0 && self.selected_slot_is_empty()
    }

    fn empty_slot_selected(&self) -> bool {
        self.save_slots.new != 0 && self.slot_index.changed() && self.selected_slot_is_empty()
    }

    fn save_deleted(&mut self) -> bool {
        match self.deleted_slot {
            Some(slot) => {
                log::info!("Save slot {} deleted", slot);
                true
            }
            None => false,
        }
    }

    fn save_menu_entered(&self) -> bool {
        self.save_slots.became(|p| *p != 0)
    }

    fn is_loading(&self) -> bool {
        self.loading_icon_shown.new || self.is_currently_loading.new
    }

    fn reset_data(&mut self) {
        self.save_initialized = false;
        self.bool_keys.clear();
        self.count_keys.clear();
    }

    fn is_alive(&self) -> bool {
        self.reader.is_valid()
    }
}

/// Factory for [`DeathsDoorMemory`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DeathsDoorFactory;

impl GameFactory for DeathsDoorFactory {
    fn game_name(&self) -> &'static str {
        "Death's Door"
    }

    fn create(&self, process: &ProcessContext, pointers: &NamedPointers) -> Result<BoxedGame> {
        let layout = DeathsDoorLayout::from_named(pointers)?;
        Ok(Box::new(DeathsDoorMemory::new(process.reader(), layout)))
    }
}
