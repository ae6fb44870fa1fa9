//! Fake Death's Door process for driving a `Splitter` tick by tick

#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use deaths_door_autosplitter::games::deaths_door::{names, NEW_SAVE_SPAWN_ID};
use deaths_door_autosplitter::memory::{
    AddressResolver, MockMemoryReader, MockProcessFinder, NamedPointers, ProcessInfo,
};
use deaths_door_autosplitter::triggers::{Color, Position3D};
use deaths_door_autosplitter::{
    AutosplitterConfig, DeathsDoorFactory, Pointer, ProcessContext, Result, SplitRuleConfig, Splitter,
    TickReport,
};

pub const PID: u32 = 4242;

const LOADING: usize = 0x1000;
const ICON: usize = 0x1008;
const SCENE: usize = 0x1010;
const SAVE_SLOTS: usize = 0x1018;
const SLOT_INDEX: usize = 0x1020;
const TRANSITION: usize = 0x1028;
const SPAWN: usize = 0x1030;
const BOOLS: usize = 0x1038;
const COUNTS: usize = 0x1040;
const COLOR: usize = 0x1050;
const TIMER: usize = 0x1060;
const MAX_TIME: usize = 0x1064;
const POSITION: usize = 0x1070;

const SLOT_ARRAY: usize = 0x4000;
const BOOL_TABLE: usize = 0x9000;
const COUNT_TABLE: usize = 0xC000;
const HEAP: usize = 0x10_0000;

/// Resolver handing out fixed absolute addresses
pub struct FixedResolver(pub NamedPointers);

impl AddressResolver for FixedResolver {
    fn resolve(&self, _process: &ProcessContext, _cancel: &AtomicBool) -> Result<NamedPointers> {
        Ok(self.0.clone())
    }
}

pub fn fixed_pointers() -> NamedPointers {
    [
        (names::IS_CURRENTLY_LOADING, LOADING),
        (names::LOADING_ICON_SHOWN, ICON),
        (names::CURRENT_SCENE, SCENE),
        (names::SAVE_SLOTS, SAVE_SLOTS),
        (names::SLOT_INDEX, SLOT_INDEX),
        (names::SLOT_TRANSITION, TRANSITION),
        (names::SPAWN_ID, SPAWN),
        (names::BOOL_KEYS, BOOLS),
        (names::COUNT_KEYS, COUNTS),
        (names::FADE_COLOR, COLOR),
        (names::FADE_TIMER, TIMER),
        (names::FADE_MAX_TIME, MAX_TIME),
        (names::PLAYER_POSITION, POSITION),
    ]
    .into_iter()
    .map(|(name, address)| (name.to_string(), Pointer::absolute(address)))
    .collect()
}

pub fn config(splits: &[(&str, &str)]) -> AutosplitterConfig {
    AutosplitterConfig {
        attach_retry_ms: 0,
        tick_interval_ms: 1,
        splits: splits
            .iter()
            .map(|(category, identifier)| SplitRuleConfig::new(*category, *identifier))
            .collect(),
        ..Default::default()
    }
}

pub struct Harness {
    pub memory: MockMemoryReader,
    pub finder: Arc<MockProcessFinder>,
    pub splitter: Splitter,
    heap: usize,
}

impl Harness {
    pub fn new(splits: &[(&str, &str)]) -> Self {
        Self::with_config(config(splits))
    }

    /// Attached and resolved, one snapshot refresh done
    pub fn with_config(config: AutosplitterConfig) -> Self {
        let memory = MockMemoryReader::new();
        let finder = Arc::new(MockProcessFinder::new());
        let splitter = Splitter::with_components(
            config,
            finder.clone(),
            Arc::new(FixedResolver(fixed_pointers())),
            Arc::new(DeathsDoorFactory),
        )
        .expect("valid config");

        let mut harness = Self {
            memory,
            finder,
            splitter,
            heap: HEAP,
        };
        harness.write_title_screen();
        harness.attach();
        harness
    }

    fn write_title_screen(&mut self) {
        self.memory.write_bool(LOADING, false);
        self.memory.write_bool(ICON, false);
        self.set_scene("");
        self.memory.write_ptr(SAVE_SLOTS, 0);
        self.memory.write_i32(SLOT_INDEX, 0);
        self.memory.write_ptr(TRANSITION, 0);
        self.set_spawn("");
        self.memory.write_ptr(BOOLS, 0);
        self.memory.write_ptr(COUNTS, 0);
        self.fade(Color::BLACK, 0.0, 0.0);
        self.set_position(Position3D::default());
    }

    /// Register the process and wait for resolution to finish
    pub fn attach(&mut self) {
        self.finder.add_process(
            ProcessInfo::new(PID, "DeathsDoor.exe", 0x40_0000, 0x1000),
            self.memory.clone(),
        );
        for _ in 0..1000 {
            if self.splitter.update() {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("splitter never became ready: {:?}", self.splitter.last_error());
    }

    /// Simulate the game being restarted after the old process exited
    pub fn relaunch(&mut self) {
        self.memory = MockMemoryReader::new();
        self.heap = HEAP;
        self.write_title_screen();
        self.attach();
    }

    /// Hand the attached splitter to someone else, leaving an idle one behind
    pub fn take_splitter(&mut self) -> Splitter {
        let idle = Splitter::with_components(
            config(&[]),
            Arc::new(MockProcessFinder::new()),
            Arc::new(FixedResolver(fixed_pointers())),
            Arc::new(DeathsDoorFactory),
        )
        .expect("valid config");
        std::mem::replace(&mut self.splitter, idle)
    }

    pub fn tick(&mut self) -> TickReport {
        self.splitter.tick()
    }

    fn alloc(&mut self) -> usize {
        let address = self.heap;
        self.heap += 0x100;
        address
    }

    fn write_string_field(&mut self, field: usize, value: &str) {
        let object = self.alloc();
        self.memory.write_managed_string(object, value);
        self.memory.write_ptr(field, object);
    }

    pub fn set_scene(&mut self, scene: &str) {
        self.write_string_field(SCENE, scene);
    }

    pub fn set_spawn(&mut self, spawn: &str) {
        self.write_string_field(SPAWN, spawn);
    }

    pub fn set_loading(&self, loading: bool) {
        self.memory.write_bool(LOADING, loading);
    }

    pub fn set_loading_icon(&self, shown: bool) {
        self.memory.write_bool(ICON, shown);
    }

    pub fn open_save_menu(&self) {
        self.memory.write_ptr(SAVE_SLOTS, SLOT_ARRAY);
    }

    pub fn close_save_menu(&self) {
        self.memory.write_ptr(SAVE_SLOTS, 0);
        self.memory.write_ptr(TRANSITION, 0);
    }

    pub fn set_slot_time(&self, slot: usize, time: f32) {
        let button = 0x5000 + slot * 0x100;
        let data = 0x6000 + slot * 0x100;
        let save = 0x7000 + slot * 0x100;
        self.memory.write_ptr(SLOT_ARRAY + 0x20 + 0x8 * slot, button);
        self.memory.write_ptr(button + 0x18, data);
        self.memory.write_ptr(data + 0x18, save);
        self.memory.write_f32(save + 0x40, time);
    }

    pub fn select_slot(&self, slot: i32) {
        self.memory.write_i32(SLOT_INDEX, slot);
    }

    pub fn begin_transition(&self) {
        self.memory.write_ptr(TRANSITION, 0xDEAD0);
    }

    pub fn fade(&self, color: Color, max_time: f32, timer: f32) {
        for (i, v) in [color.r, color.g, color.b, color.a].into_iter().enumerate() {
            self.memory.write_f32(COLOR + i * 4, v);
        }
        self.memory.write_f32(MAX_TIME, max_time);
        self.memory.write_f32(TIMER, timer);
    }

    pub fn set_position(&self, position: Position3D) {
        self.memory.write_f32(POSITION, position.x);
        self.memory.write_f32(POSITION + 4, position.y);
        self.memory.write_f32(POSITION + 8, position.z);
    }

    fn write_table_header(&mut self, field: usize, table: usize, version: i32, count: usize) -> usize {
        let entries = table + 0x100;
        self.memory.write_ptr(field, table);
        self.memory.write_ptr(table + 0x18, entries);
        self.memory.write_i32(table + 0x40, count as i32);
        self.memory.write_i32(table + 0x44, version);
        entries
    }

    fn write_entry_key(&mut self, entries: usize, index: usize, key: &str) -> usize {
        let entry = entries + 0x20 + 0x18 * index;
        let object = self.alloc();
        self.memory.write_managed_string(object, key);
        self.memory.write_ptr(entry + 0x08, object);
        entry + 0x10
    }

    /// Rewrite the save's bool dictionary
    pub fn write_bools(&mut self, version: i32, entries: &[(&str, bool)]) {
        let base = self.write_table_header(BOOLS, BOOL_TABLE, version, entries.len());
        for (i, (key, value)) in entries.iter().enumerate() {
            let slot = self.write_entry_key(base, i, key);
            self.memory.write_bool(slot, *value);
        }
    }

    /// Rewrite the save's count dictionary
    pub fn write_counts(&mut self, version: i32, entries: &[(&str, i32)]) {
        let base = self.write_table_header(COUNTS, COUNT_TABLE, version, entries.len());
        for (i, (key, value)) in entries.iter().enumerate() {
            let slot = self.write_entry_key(base, i, key);
            self.memory.write_i32(slot, *value);
        }
    }

    /// Put the title screen into a new-save transition on an empty slot 0
    pub fn begin_new_save(&self) {
        self.open_save_menu();
        for slot in 0..3 {
            self.set_slot_time(slot, 0.0);
        }
        self.select_slot(0);
        self.begin_transition();
    }

    /// Start a fresh save from the title screen and step into the game
    pub fn start_session(&mut self) {
        self.begin_new_save();
        let report = self.tick();
        assert!(report.started, "session did not start");

        self.close_save_menu();
        self.set_spawn(NEW_SAVE_SPAWN_ID);
        let report = self.tick();
        assert!(!report.reset);
        assert!(self.splitter.session_active());
    }

    /// Tick `n` times and collect the reports
    pub fn run(&mut self, n: usize) -> Vec<TickReport> {
        (0..n).map(|_| self.tick()).collect()
    }
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("condition not reached in time");
}
