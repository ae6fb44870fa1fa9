//! Background autosplitter runner

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use super::events::{EventCallback, EventHandler, SplitCallback, TimerEvent};
use super::splitter::Splitter;
use super::state::AutosplitterState;
use crate::config::AutosplitterConfig;
use crate::{AutosplitterError, Result};

/// Runs a [`Splitter`] on a background thread and publishes its state
pub struct Autosplitter {
    /// Configuration used by the next `start`
    config: Mutex<AutosplitterConfig>,
    /// Current state
    state: Arc<Mutex<AutosplitterState>>,
    /// Whether the autosplitter is running
    running: Arc<AtomicBool>,
    /// Signal to end the current session on the next tick
    reset_requested: Arc<AtomicBool>,
    /// Event handler for timer callbacks
    events: Arc<Mutex<EventHandler>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Autosplitter {
    /// Create a stopped autosplitter
    pub fn new(config: AutosplitterConfig) -> Self {
        Self {
            config: Mutex::new(config),
            state: Arc::new(Mutex::new(AutosplitterState::default())),
            running: Arc::new(AtomicBool::new(false)),
            reset_requested: Arc::new(AtomicBool::new(false)),
            events: Arc::new(Mutex::new(EventHandler::new())),
            handle: Mutex::new(None),
        }
    }

    /// Get the current state
    pub fn state(&self) -> AutosplitterState {
        self.state.lock().clone()
    }

    /// Check if the autosplitter is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> AutosplitterConfig {
        self.config.lock().clone()
    }

    /// Replace the configuration, used by the next `start`
    pub fn set_config(&self, config: AutosplitterConfig) -> Result<()> {
        config.validate()?;
        *self.config.lock() = config;
        Ok(())
    }

    /// Replace the split list from a JSON array, used by the next `start`
    pub fn set_splits_json(&self, json: &str) -> Result<()> {
        self.config.lock().set_splits_from_json(json)
    }

    /// Register a callback for split events
    pub fn on_split(&self, callback: SplitCallback) {
        self.events.lock().on_split(callback);
    }

    /// Register a callback for every timer event
    pub fn on_event(&self, callback: EventCallback) {
        self.events.lock().on_event(callback);
    }

    /// Start polling the real game process
    pub fn start(&self) -> Result<()> {
        let splitter = Splitter::new(self.config())?;
        self.start_with(splitter)
    }

    /// Start polling with a prepared splitter
    pub fn start_with(&self, mut splitter: Splitter) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AutosplitterError::AlreadyRunning);
        }

        {
            let mut state = self.state.lock();
            *state = AutosplitterState::default();
            state.running = true;
        }
        self.reset_requested.store(false, Ordering::SeqCst);

        let interval = splitter.config().tick_interval();
        let running = self.running.clone();
        let reset_requested = self.reset_requested.clone();
        let state = self.state.clone();
        let events = self.events.clone();

        let spawned = std::thread::Builder::new()
            .name("autosplitter".into())
            .spawn(move || {
                let mut loading = false;
                while running.load(Ordering::SeqCst) {
                    let mut emitted = Vec::new();

                    if reset_requested.swap(false, Ordering::SeqCst) && splitter.session_active() {
                        splitter.on_reset();
                        emitted.push(TimerEvent::Reset);
                    }

                    let report = splitter.tick();
                    if report.started {
                        emitted.push(TimerEvent::Started);
                    }
                    if report.reset {
                        emitted.push(TimerEvent::Reset);
                    }
                    if let Some(split) = report.split {
                        emitted.push(TimerEvent::Split(split));
                    }
                    if report.loading != loading {
                        loading = report.loading;
                        emitted.push(TimerEvent::LoadingChanged(loading));
                    }

                    {
                        let mut state = state.lock();
                        splitter.fill_state(&mut state);
                    }

                    if !emitted.is_empty() {
                        let events = events.lock();
                        for event in &emitted {
                            events.emit(event);
                        }
                    }

                    std::thread::sleep(interval);
                }
                log::debug!("Autosplitter thread exiting");
            });

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                log::info!("Autosplitter started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.state.lock().running = false;
                Err(AutosplitterError::ThreadSpawn {
                    name: "autosplitter",
                    source: e,
                })
            }
        }
    }

    /// Stop the autosplitter and wait for the background thread
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }

        let mut state = self.state.lock();
        state.running = false;
        state.detach();

        log::info!("Autosplitter stopped");
    }

    /// End the current session on the next tick
    pub fn reset(&self) {
        self.reset_requested.store(true, Ordering::SeqCst);
        log::info!("Autosplitter reset requested");
    }
}

impl Default for Autosplitter {
    fn default() -> Self {
        Self::new(AutosplitterConfig::default())
    }
}

impl Drop for Autosplitter {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
