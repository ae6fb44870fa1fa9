//! Host-driven splitter
//!
//! [`Splitter`] owns everything tied to one attached process and exposes the
//! per-tick entry points a timer host calls: `update`, `should_start`,
//! `on_start`, `should_split`, `should_reset` and `is_loading`. [`Splitter::tick`]
//! runs them in host order for callers without their own timer state.

use std::sync::Arc;
use std::time::Instant;

use super::events::SplitEvent;
use super::session::SessionLifecycle;
use super::state::AutosplitterState;
use crate::config::AutosplitterConfig;
use crate::error::{AutosplitterError, Result};
use crate::games::{BoxedGame, DeathsDoorFactory, GameFactory};
use crate::memory::{AddressResolver, ProcessContext, ProcessFinder, ResolutionTask, SystemProcessFinder};
use crate::triggers::{SplitEvaluator, SplitRule, SplitRuleSet};

/// Outcome of one [`Splitter::tick`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The game model was live and refreshed this tick
    pub ready: bool,
    pub started: bool,
    pub split: Option<SplitEvent>,
    pub reset: bool,
    pub loading: bool,
}

pub struct Splitter {
    config: AutosplitterConfig,
    configured: Vec<SplitRule>,
    finder: Arc<dyn ProcessFinder>,
    resolver: Arc<dyn AddressResolver>,
    factory: Arc<dyn GameFactory>,
    process: Option<ProcessContext>,
    resolution: Option<ResolutionTask>,
    resolution_failed: bool,
    last_attach_attempt: Option<Instant>,
    game: Option<BoxedGame>,
    rules: SplitRuleSet,
    evaluator: SplitEvaluator,
    session: SessionLifecycle,
    splits: Vec<SplitEvent>,
    last_error: Option<String>,
}

impl Splitter {
    /// Splitter for the real game process using the configured pointer paths
    pub fn new(config: AutosplitterConfig) -> Result<Self> {
        let resolver = Arc::new(config.resolver());
        Self::with_components(config, Arc::new(SystemProcessFinder), resolver, Arc::new(DeathsDoorFactory))
    }

    /// Splitter with explicit process discovery, resolution and game model
    pub fn with_components(
        config: AutosplitterConfig,
        finder: Arc<dyn ProcessFinder>,
        resolver: Arc<dyn AddressResolver>,
        factory: Arc<dyn GameFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let configured = config.split_rules()?;
        let session = SessionLifecycle::new(config.lifecycle);

        Ok(Self {
            config,
            configured,
            finder,
            resolver,
            factory,
            process: None,
            resolution: None,
            resolution_failed: false,
            last_attach_attempt: None,
            game: None,
            rules: SplitRuleSet::new(),
            evaluator: SplitEvaluator::default(),
            session,
            splits: Vec::new(),
            last_error: None,
        })
    }

    pub fn config(&self) -> &AutosplitterConfig {
        &self.config
    }

    /// Replace the split list, applied on the next session start
    pub fn set_splits(&mut self, rules: Vec<SplitRule>) {
        self.configured = rules;
    }

    pub fn configured_splits(&self) -> &[SplitRule] {
        &self.configured
    }

    pub fn is_attached(&self) -> bool {
        self.process.is_some()
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().map(|p| p.process_id)
    }

    /// Whether addresses are resolved and the game model exists
    pub fn is_ready(&self) -> bool {
        self.game.is_some()
    }

    pub fn session_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn remaining_count(&self) -> usize {
        self.rules.remaining_count()
    }

    /// Splits taken in the current session
    pub fn splits(&self) -> &[SplitEvent] {
        &self.splits
    }

    pub fn last_split(&self) -> Option<&SplitEvent> {
        self.splits.last()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Attach, finish resolution and refresh every snapshot
    ///
    /// Returns true when the game model was refreshed and the remaining
    /// entry points may be called for this tick.
    pub fn update(&mut self) -> bool {
        if self.process.is_none() {
            self.try_attach();
            return false;
        }

        if !self.process.as_ref().map_or(false, ProcessContext::is_alive) {
            self.detach("process exited");
            return false;
        }

        if self.game.is_none() && !self.poll_resolution() {
            return false;
        }

        let refreshed = self.game.as_mut().map_or(false, |game| game.update());
        if !refreshed {
            self.detach("game memory unreadable");
        }
        refreshed
    }

    /// Whether a session should start this tick
    pub fn should_start(&self) -> bool {
        match &self.game {
            Some(game) => self.session.should_start(&**game),
            None => false,
        }
    }

    /// Start a session with the configured splits
    pub fn on_start(&mut self) {
        if let Some(game) = self.game.as_mut() {
            self.session.on_start(&mut **game, &mut self.rules, &self.configured);
            self.splits.clear();
        }
    }

    /// Evaluate the split rules, recording the split taken if any
    pub fn should_split(&mut self) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        match self.evaluator.evaluate(&mut self.rules, &mut **game) {
            Some(rule) => {
                let event = SplitEvent::new(&rule, self.splits.len());
                log::info!("Split #{}: {} ({} remaining)", event.split_index + 1, rule, self.rules.remaining_count());
                self.splits.push(event);
                true
            }
            None => false,
        }
    }

    /// Whether the session should reset this tick
    pub fn should_reset(&mut self) -> bool {
        match self.game.as_mut() {
            Some(game) => self.session.should_reset(&mut **game),
            None => false,
        }
    }

    /// End the current session
    pub fn on_reset(&mut self) {
        self.session.end();
        self.splits.clear();
        self.rules = SplitRuleSet::new();
    }

    pub fn is_loading(&self) -> bool {
        match &self.game {
            Some(game) => self.session.is_loading(&**game),
            None => false,
        }
    }

    /// Run one full tick in host order
    ///
    /// A tick that starts a session does not split. Split evaluation only
    /// happens while a session is active and no reset fired.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.update() {
            return report;
        }
        report.ready = true;

        if !self.session.is_active() {
            if self.should_start() {
                self.on_start();
                report.started = true;
            }
        } else if self.should_reset() {
            self.on_reset();
            report.reset = true;
        } else if self.should_split() {
            report.split = self.splits.last().cloned();
        }

        report.loading = self.is_loading();
        report
    }

    /// Copy the splitter's view into an exported state
    pub fn fill_state(&self, state: &mut AutosplitterState) {
        state.process_attached = self.is_attached();
        state.process_id = self.process_id();
        state.ready = self.is_ready();
        state.session_active = self.session_active();
        state.loading = self.is_loading();
        state.splits = self.splits.clone();
        state.remaining = self.remaining_count();
        state.last_error = self.last_error.clone();
    }

    fn try_attach(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_attach_attempt {
            if now.duration_since(last) < self.config.attach_retry() {
                return;
            }
        }
        self.last_attach_attempt = Some(now);

        let names = self.config.process_name_refs();
        match self.finder.attach(&names) {
            Ok(process) => {
                log::info!(
                    "Attached to {} (pid {}, base 0x{:X})",
                    process.name,
                    process.process_id,
                    process.base_address
                );
                self.resolution = Some(ResolutionTask::spawn(self.resolver.clone(), process.clone()));
                self.process = Some(process);
                self.resolution_failed = false;
                self.last_error = None;
            }
            Err(e @ AutosplitterError::ProcessNotFound(_)) => log::trace!("{}", e),
            Err(e) => {
                log::warn!("Attach failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Returns true once the game model exists
    fn poll_resolution(&mut self) -> bool {
        if self.resolution_failed {
            return false;
        }
        let Some(outcome) = self.resolution.as_mut().and_then(ResolutionTask::take_result) else {
            return false;
        };
        self.resolution = None;

        let Some(process) = self.process.as_ref() else {
            return false;
        };
        match outcome.and_then(|pointers| self.factory.create(process, &pointers)) {
            Ok(game) => {
                log::info!("{} ready", game.name());
                self.game = Some(game);
                true
            }
            Err(e) => {
                log::warn!("Address resolution failed for pid {}: {}", process.process_id, e);
                self.resolution_failed = true;
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn detach(&mut self, reason: &str) {
        if let Some(process) = self.process.take() {
            log::info!("Detached from pid {}: {}", process.process_id, reason);
        }
        self.resolution = None;
        self.resolution_failed = false;
        self.game = None;
        self.last_attach_attempt = None;
        if self.session.is_active() {
            self.on_reset();
        }
    }
}
