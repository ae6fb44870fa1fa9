//! Session boundaries: when a run starts and when it resets

use crate::config::LifecycleConfig;
use crate::games::GameMemory;
use crate::triggers::{SplitRule, SplitRuleSet};

/// Tracks whether a run is in progress and decides start/reset
#[derive(Debug, Clone, Default)]
pub struct SessionLifecycle {
    config: LifecycleConfig,
    active: bool,
}

impl SessionLifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config, active: false }
    }

    /// Whether a run is in progress
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// A new save was started, or an empty slot was picked in the save menu
    pub fn should_start(&self, game: &dyn GameMemory) -> bool {
        (self.config.start_on_new_save && game.new_save_transition_started())
            || (self.config.start_on_empty_slot && game.empty_slot_selected())
    }

    /// Begin a run: clear tracked tables, reload rules, go active
    pub fn on_start(&mut self, game: &mut dyn GameMemory, rules: &mut SplitRuleSet, configured: &[SplitRule]) {
        game.reset_data();
        rules.setup(configured);
        self.active = true;
        log::info!("Session started with {} splits", configured.len());
    }

    /// A save was deleted this tick, or the save menu was entered
    pub fn should_reset(&self, game: &mut dyn GameMemory) -> bool {
        (self.config.reset_on_delete && game.save_deleted())
            || (self.config.reset_on_save_menu && game.save_menu_entered())
    }

    /// End the run
    pub fn end(&mut self) {
        if self.active {
            log::info!("Session ended");
        }
        self.active = false;
    }

    /// Loading screen visible or a scene load in progress
    pub fn is_loading(&self, game: &dyn GameMemory) -> bool {
        game.is_loading()
    }
}
