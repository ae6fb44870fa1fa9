//! Per-tick split matching
//!
//! The evaluator pulls edge events from the game model and tests them
//! against the remaining rules in category order. The first rule consumed
//! ends the tick, so at most one split fires per call.

use super::rules::SplitRuleSet;
use super::types::{Color, SplitCategory, SplitRule};
use crate::core::ValueSnapshot;

/// Scene name of the Lord of Doors arena
pub const LORD_OF_DOORS_SCENE: &str = "lvl_HallOfDoors_BOSSFIGHT";
/// Split identifier used for the Lord of Doors fade
pub const LORD_OF_DOORS_ID: &str = "lod";
/// Prefix shared by boss arena scenes
pub const BOSS_SCENE_PREFIX: &str = "boss_";

/// Edge events the evaluator needs from the game model
pub trait GameSignals {
    /// Current and previous scene name
    fn scene(&self) -> &ValueSnapshot<String>;

    /// Fade timer started rising this tick towards `max_time` with `color`
    fn has_started_fading(&self, color: Color, max_time: f32) -> bool;

    /// Boolean flags that became true since the last poll
    fn new_bool_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_>;

    /// Counters that changed since the last poll, as `{key}_{value}`
    fn new_count_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_>;

    /// Player stands inside the truth ending trigger
    fn is_in_truth_trigger(&self) -> bool;
}

/// Which scenes a fade split applies to
#[derive(Debug, Clone, PartialEq)]
pub enum FadeScene {
    /// Exactly this scene, splitting on a fixed identifier
    Exact { scene: String, identifier: String },
    /// Any scene with this prefix, splitting on the remainder of the name
    Prefix(String),
}

impl FadeScene {
    /// Identifier to consume when fading in `scene`, if this entry applies
    pub fn identifier_for(&self, scene: &str) -> Option<String> {
        match self {
            FadeScene::Exact { scene: s, identifier } if s == scene => Some(identifier.clone()),
            FadeScene::Prefix(prefix) => scene.strip_prefix(prefix.as_str()).map(str::to_string),
            _ => None,
        }
    }
}

/// A fade-to-colour that ends a boss fight
#[derive(Debug, Clone, PartialEq)]
pub struct FadeSplit {
    pub scene: FadeScene,
    pub max_time: f32,
    pub color: Color,
}

/// Matches game events against remaining split rules
#[derive(Debug, Clone)]
pub struct SplitEvaluator {
    fades: Vec<FadeSplit>,
}

impl Default for SplitEvaluator {
    fn default() -> Self {
        Self::new(vec![
            FadeSplit {
                scene: FadeScene::Exact {
                    scene: LORD_OF_DOORS_SCENE.to_string(),
                    identifier: LORD_OF_DOORS_ID.to_string(),
                },
                max_time: 2.0,
                color: Color::WHITE,
            },
            FadeSplit {
                scene: FadeScene::Prefix(BOSS_SCENE_PREFIX.to_string()),
                max_time: 1.5,
                color: Color::WHITE,
            },
        ])
    }
}

impl SplitEvaluator {
    /// Create an evaluator with custom fade splits, checked in order
    pub fn new(fades: Vec<FadeSplit>) -> Self {
        Self { fades }
    }

    /// Run one tick of matching, returns the rule consumed if any
    pub fn evaluate<G: GameSignals + ?Sized>(&self, rules: &mut SplitRuleSet, game: &mut G) -> Option<SplitRule> {
        if rules.remaining_count() == 0 {
            return None;
        }

        self.split_fade(rules, &*game)
            .or_else(|| Self::split_bool(rules, game))
            .or_else(|| Self::split_scene(rules, &*game))
            .or_else(|| Self::split_truth_ending(rules, &*game))
            .or_else(|| Self::split_count(rules, game))
    }

    fn split_fade<G: GameSignals + ?Sized>(&self, rules: &mut SplitRuleSet, game: &G) -> Option<SplitRule> {
        if !rules.has_category(SplitCategory::Fade) {
            return None;
        }

        let scene = &game.scene().new;
        let (fade, identifier) = self
            .fades
            .iter()
            .find_map(|f| f.scene.identifier_for(scene).map(|id| (f, id)))?;

        if !game.has_started_fading(fade.color, fade.max_time) {
            return None;
        }
        rules.take(SplitCategory::Fade, &identifier)
    }

    fn split_bool<G: GameSignals + ?Sized>(rules: &mut SplitRuleSet, game: &mut G) -> Option<SplitRule> {
        if !rules.has_category(SplitCategory::Bool) {
            return None;
        }
        game.new_bool_keys()
            .find_map(|key| rules.take(SplitCategory::Bool, &key))
    }

    fn split_scene<G: GameSignals + ?Sized>(rules: &mut SplitRuleSet, game: &G) -> Option<SplitRule> {
        if !rules.has_category(SplitCategory::Scene) {
            return None;
        }
        let scene = game.scene();
        if !scene.changed() {
            return None;
        }
        rules.take(SplitCategory::Scene, &scene.new)
    }

    fn split_truth_ending<G: GameSignals + ?Sized>(rules: &mut SplitRuleSet, game: &G) -> Option<SplitRule> {
        if !rules.has_category(SplitCategory::TruthEnding) || !game.is_in_truth_trigger() {
            return None;
        }
        rules.take(SplitCategory::TruthEnding, "")
    }

    fn split_count<G: GameSignals + ?Sized>(rules: &mut SplitRuleSet, game: &mut G) -> Option<SplitRule> {
        if !rules.has_category(SplitCategory::Count) {
            return None;
        }
        game.new_count_keys()
            .find_map(|key| rules.take(SplitCategory::Count, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeGame {
        scene: ValueSnapshot<String>,
        fading: Option<(Color, f32)>,
        bools: Vec<String>,
        counts: Vec<String>,
        in_truth: bool,
        bool_polls: usize,
    }

    impl FakeGame {
        fn in_scene(old: &str, new: &str) -> Self {
            let mut game = Self::default();
            game.scene.refresh(old.to_string());
            game.scene.refresh(new.to_string());
            game
        }
    }

    impl GameSignals for FakeGame {
        fn scene(&self) -> &ValueSnapshot<String> {
            &self.scene
        }

        fn has_started_fading(&self, color: Color, max_time: f32) -> bool {
            self.fading == Some((color, max_time))
        }

        fn new_bool_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_> {
            self.bool_polls += 1;
            Box::new(std::mem::take(&mut self.bools).into_iter())
        }

        fn new_count_keys(&mut self) -> Box<dyn Iterator<Item = String> + '_> {
            Box::new(std::mem::take(&mut self.counts).into_iter())
        }

        fn is_in_truth_trigger(&self) -> bool {
            self.in_truth
        }
    }

    fn set(rules: &[(SplitCategory, &str)]) -> SplitRuleSet {
        let rules: Vec<_> = rules.iter().map(|(c, i)| SplitRule::new(*c, *i)).collect();
        SplitRuleSet::from_rules(&rules)
    }

    #[test]
    fn test_fade_lord_of_doors() {
        let mut rules = set(&[(SplitCategory::Fade, "lod")]);
        let mut game = FakeGame::in_scene(LORD_OF_DOORS_SCENE, LORD_OF_DOORS_SCENE);
        game.fading = Some((Color::WHITE, 2.0));

        let hit = SplitEvaluator::default().evaluate(&mut rules, &mut game);
        assert_eq!(hit, Some(SplitRule::new(SplitCategory::Fade, "lod")));
    }

    #[test]
    fn test_fade_boss_prefix() {
        let mut rules = set(&[(SplitCategory::Fade, "gob")]);
        let mut game = FakeGame::in_scene("boss_gob", "boss_gob");
        game.fading = Some((Color::WHITE, 1.5));

        let hit = SplitEvaluator::default().evaluate(&mut rules, &mut game);
        assert_eq!(hit.map(|r| r.identifier), Some("gob".to_string()));
    }

    #[test]
    fn test_fade_wrong_duration_or_colour() {
        let evaluator = SplitEvaluator::default();
        let mut rules = set(&[(SplitCategory::Fade, "gob")]);

        let mut game = FakeGame::in_scene("boss_gob", "boss_gob");
        game.fading = Some((Color::WHITE, 2.0));
        assert!(evaluator.evaluate(&mut rules, &mut game).is_none());

        game.fading = Some((Color::BLACK, 1.5));
        assert!(evaluator.evaluate(&mut rules, &mut game).is_none());
        assert_eq!(rules.remaining_count(), 1);
    }

    #[test]
    fn test_fade_takes_priority_over_scene() {
        let mut rules = set(&[(SplitCategory::Scene, "boss_gob"), (SplitCategory::Fade, "gob")]);
        let mut game = FakeGame::in_scene("lvl_A", "boss_gob");
        game.fading = Some((Color::WHITE, 1.5));

        let evaluator = SplitEvaluator::default();
        assert_eq!(
            evaluator.evaluate(&mut rules, &mut game).map(|r| r.category),
            Some(SplitCategory::Fade)
        );
        // Scene edge is still there on the same snapshot; next call takes it
        game.fading = None;
        assert_eq!(
            evaluator.evaluate(&mut rules, &mut game).map(|r| r.category),
            Some(SplitCategory::Scene)
        );
    }

    #[test]
    fn test_bool_stops_on_first_consume() {
        let mut rules = set(&[(SplitCategory::Bool, "b"), (SplitCategory::Bool, "c")]);
        let mut game = FakeGame::default();
        game.bools = vec!["a".into(), "b".into(), "c".into()];

        let hit = SplitEvaluator::default().evaluate(&mut rules, &mut game);
        assert_eq!(hit.map(|r| r.identifier), Some("b".to_string()));
        assert_eq!(rules.remaining_count(), 1);
    }

    #[test]
    fn test_bool_table_not_polled_without_bool_rules() {
        let mut rules = set(&[(SplitCategory::Scene, "lvl_A")]);
        let mut game = FakeGame::in_scene("", "");
        SplitEvaluator::default().evaluate(&mut rules, &mut game);
        assert_eq!(game.bool_polls, 0);
    }

    #[test]
    fn test_scene_change() {
        let mut rules = set(&[(SplitCategory::Scene, "lvl_A")]);
        let evaluator = SplitEvaluator::default();

        let mut game = FakeGame::in_scene("lvl_A", "lvl_A");
        assert!(evaluator.evaluate(&mut rules, &mut game).is_none());

        let mut game = FakeGame::in_scene("", "lvl_A");
        assert!(evaluator.evaluate(&mut rules, &mut game).is_some());
        assert_eq!(rules.remaining_count(), 0);
    }

    #[test]
    fn test_truth_ending() {
        let mut rules = set(&[(SplitCategory::TruthEnding, "")]);
        let mut game = FakeGame::default();
        let evaluator = SplitEvaluator::default();
        assert!(evaluator.evaluate(&mut rules, &mut game).is_none());

        game.in_truth = true;
        assert_eq!(
            evaluator.evaluate(&mut rules, &mut game).map(|r| r.category),
            Some(SplitCategory::TruthEnding)
        );
    }

    #[test]
    fn test_count() {
        let mut rules = set(&[(SplitCategory::Count, "seeds_4")]);
        let mut game = FakeGame::default();
        game.counts = vec!["seeds_3".into(), "seeds_4".into()];

        let hit = SplitEvaluator::default().evaluate(&mut rules, &mut game);
        assert_eq!(hit.map(|r| r.identifier), Some("seeds_4".to_string()));
    }

    #[test]
    fn test_no_rules_no_work() {
        let mut rules = SplitRuleSet::new();
        let mut game = FakeGame::in_scene("", "lvl_A");
        game.in_truth = true;
        assert!(SplitEvaluator::default().evaluate(&mut rules, &mut game).is_none());
        assert_eq!(game.bool_polls, 0);
    }

    #[test]
    fn test_fade_scene_identifier() {
        let exact = FadeScene::Exact {
            scene: LORD_OF_DOORS_SCENE.into(),
            identifier: "lod".into(),
        };
        assert_eq!(exact.identifier_for(LORD_OF_DOORS_SCENE), Some("lod".into()));
        assert_eq!(exact.identifier_for("boss_gob"), None);

        let prefix = FadeScene::Prefix("boss_".into());
        assert_eq!(prefix.identifier_for("boss_frog"), Some("frog".into()));
        assert_eq!(prefix.identifier_for("lvl_frog"), None);
    }
}
