//! Core autosplitter abstractions
//!
//! This module contains the main types for the autosplitter:
//! - `ValueSnapshot` - Previous/current pair for one game value
//! - `SessionLifecycle` - Start and reset decisions
//! - `Splitter` - Host-driven per-tick entry points
//! - `Autosplitter` - Background runner around a `Splitter`
//! - `SplitEvent` / `TimerEvent` - Events emitted to listeners

mod events;
mod runner;
mod session;
mod snapshot;
mod splitter;
mod state;

pub use events::{EventCallback, EventHandler, SplitCallback, SplitEvent, TimerEvent};
pub use runner::Autosplitter;
pub use session::SessionLifecycle;
pub use snapshot::ValueSnapshot;
pub use splitter::{Splitter, TickReport};
pub use state::AutosplitterState;
