//! Death's Door Autosplitter
//!
//! A memory-reading autosplitter engine for Death's Door. Each tick it reads
//! a handful of game values into previous/current snapshots, diffs the
//! save's progression dictionaries, and matches the results against an
//! ordered list of split rules.
//!
//! This crate can be used as:
//! - A Rust library (rlib) driven by a timer host through [`Splitter`]
//! - A dynamic library (cdylib) for FFI-based loading, see [`ffi`]
//!
//! ```no_run
//! use deaths_door_autosplitter::{AutosplitterConfig, Splitter};
//!
//! let config = AutosplitterConfig::load("deaths_door.toml")?;
//! let mut splitter = Splitter::new(config)?;
//! loop {
//!     let report = splitter.tick();
//!     if let Some(split) = report.split {
//!         println!("split: {:?} {}", split.category, split.identifier);
//!     }
//!     std::thread::sleep(splitter.config().tick_interval());
//! }
//! # Ok::<(), deaths_door_autosplitter::AutosplitterError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod ffi;
pub mod games;
pub mod memory;
pub mod readers;
pub mod triggers;

pub use config::{AutosplitterConfig, LifecycleConfig, PointerPathConfig, SplitRuleConfig};
pub use self::core::{
    Autosplitter, AutosplitterState, SessionLifecycle, SplitEvent, Splitter, TickReport, TimerEvent,
    ValueSnapshot,
};
pub use error::{AutosplitterError, Result};
pub use games::{DeathsDoorFactory, DeathsDoorMemory, GameFactory, GameMemory};
pub use memory::{parse_pattern, scan_pattern, MemoryReader, Pointer, ProcessContext};
pub use readers::{ChangeTrackingTable, SaveSlotTimes};
pub use triggers::{SplitCategory, SplitEvaluator, SplitRule, SplitRuleSet};
