//! Split rules and per-tick split matching
//!
//! Rules come from configuration, are grouped by category in a
//! [`SplitRuleSet`] and consumed by the [`SplitEvaluator`] as the game
//! reports matching events.

mod evaluator;
mod rules;
mod types;

pub use evaluator::{
    FadeScene, FadeSplit, GameSignals, SplitEvaluator, BOSS_SCENE_PREFIX, LORD_OF_DOORS_ID,
    LORD_OF_DOORS_SCENE,
};
pub use rules::SplitRuleSet;
pub use types::{Color, Position3D, SplitCategory, SplitRule, TriggerArea};
