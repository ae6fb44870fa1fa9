//! Configuration types for the autosplitter
//!
//! These types define the structure of autosplitter configurations loaded from TOML files.
//!
//! ```toml
//! process_names = ["DeathsDoor"]
//! tick_interval_ms = 16
//!
//! [lifecycle]
//! reset_on_save_menu = false
//!
//! [[splits]]
//! category = "Scene"
//! identifier = "lvl_HallOfDoors"
//!
//! [[splits]]
//! category = "Fade"
//! identifier = "lod"
//!
//! [pointers.current_scene]
//! pattern = "48 8B 05 ?? ?? ?? ?? 48 8B 40 18"
//! offsets = [0x0, 0x20]
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AutosplitterError, Result};
use crate::memory::StaticAddressResolver;
use crate::triggers::SplitRule;

/// Default process name of the game
pub const DEFAULT_PROCESS_NAME: &str = "DeathsDoor";

/// Default polling interval, one frame at 60 Hz
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Default delay between attach attempts while the game is not running
pub const DEFAULT_ATTACH_RETRY_MS: u64 = 1000;

fn default_rip_offset() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// Static pointer path for one named game value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerPathConfig {
    /// Offset from the main module base, or added to the RIP target when `pattern` is set
    #[serde(default)]
    pub module_offset: u64,
    /// Byte pattern with wildcards locating a RIP-relative instruction
    #[serde(default)]
    pub pattern: Option<String>,
    /// Position of RIP-relative offset in the pattern
    #[serde(default = "default_rip_offset")]
    pub rip_offset: usize,
    /// Total instruction length for RIP resolution, 0 means `rip_offset + 4`
    #[serde(default)]
    pub instruction_len: usize,
    /// Pointer offset chain to apply after base resolution
    #[serde(default)]
    pub offsets: Vec<i64>,
}

impl Default for PointerPathConfig {
    fn default() -> Self {
        Self {
            module_offset: 0,
            pattern: None,
            rip_offset: default_rip_offset(),
            instruction_len: 0,
            offsets: Vec::new(),
        }
    }
}

/// Which session boundaries start and reset the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Start when a new save transition begins on an empty slot
    #[serde(default = "default_true")]
    pub start_on_new_save: bool,
    /// Start when an empty slot is selected in the save menu
    #[serde(default = "default_true")]
    pub start_on_empty_slot: bool,
    /// Reset when a save slot is deleted
    #[serde(default = "default_true")]
    pub reset_on_delete: bool,
    /// Reset when the save menu is entered
    #[serde(default = "default_true")]
    pub reset_on_save_menu: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_on_new_save: true,
            start_on_empty_slot: true,
            reset_on_delete: true,
            reset_on_save_menu: true,
        }
    }
}

/// A split as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRuleConfig {
    /// `Fade`, `Bool`, `Scene`, `TruthEnding` or `Count`
    pub category: String,
    #[serde(default)]
    pub identifier: String,
}

impl SplitRuleConfig {
    pub fn new(category: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            identifier: identifier.into(),
        }
    }
}

/// Complete autosplitter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosplitterConfig {
    /// Process names to attach to, first match wins
    #[serde(default = "default_process_names")]
    pub process_names: Vec<String>,
    /// Polling interval of the background runner
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Minimum delay between process scans while detached
    #[serde(default = "default_attach_retry_ms")]
    pub attach_retry_ms: u64,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Ordered split list
    #[serde(default)]
    pub splits: Vec<SplitRuleConfig>,
    /// Named static pointer paths
    #[serde(default)]
    pub pointers: HashMap<String, PointerPathConfig>,
}

fn default_process_names() -> Vec<String> {
    vec![DEFAULT_PROCESS_NAME.to_string()]
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_attach_retry_ms() -> u64 {
    DEFAULT_ATTACH_RETRY_MS
}

impl Default for AutosplitterConfig {
    fn default() -> Self {
        Self {
            process_names: default_process_names(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            attach_retry_ms: DEFAULT_ATTACH_RETRY_MS,
            lifecycle: LifecycleConfig::default(),
            splits: Vec::new(),
            pointers: HashMap::new(),
        }
    }
}

impl AutosplitterConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| AutosplitterError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded config from {} ({} splits, {} pointers)",
            path.display(),
            config.splits.len(),
            config.pointers.len()
        );
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AutosplitterError::config(e.to_string()))
    }

    /// Check the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.process_names.iter().all(|n| n.trim().is_empty()) {
            return Err(AutosplitterError::config("no process names configured"));
        }
        if self.tick_interval_ms == 0 {
            return Err(AutosplitterError::config("tick_interval_ms must be greater than zero"));
        }
        for (name, path) in &self.pointers {
            if let Some(pattern) = &path.pattern {
                if crate::memory::parse_pattern(pattern).map_or(true, |p| p.is_empty()) {
                    return Err(AutosplitterError::config(format!(
                        "pointer '{}' has a malformed pattern",
                        name
                    )));
                }
            }
        }
        self.split_rules().map(|_| ())
    }

    /// Parsed split rules in configured order
    pub fn split_rules(&self) -> Result<Vec<SplitRule>> {
        self.splits
            .iter()
            .enumerate()
            .map(|(i, s)| {
                SplitRule::parse(&s.category, &s.identifier)
                    .map_err(|e| AutosplitterError::config(format!("split #{}: {}", i + 1, e)))
            })
            .collect()
    }

    /// Replace the split list with rules from a JSON array
    pub fn set_splits_from_json(&mut self, json: &str) -> Result<()> {
        let splits: Vec<SplitRuleConfig> = serde_json::from_str(json)?;
        let previous = std::mem::replace(&mut self.splits, splits);
        if let Err(e) = self.split_rules() {
            self.splits = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Polling interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Delay between attach attempts
    pub fn attach_retry(&self) -> Duration {
        Duration::from_millis(self.attach_retry_ms)
    }

    /// Process names as borrowed strings
    pub fn process_name_refs(&self) -> Vec<&str> {
        self.process_names.iter().map(String::as_str).collect()
    }

    /// Resolver for the configured pointer paths
    pub fn resolver(&self) -> StaticAddressResolver {
        StaticAddressResolver::new(self.pointers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::SplitCategory;

    #[test]
    fn test_default_config() {
        let config = AutosplitterConfig::from_toml_str("").unwrap();
        assert_eq!(config, AutosplitterConfig::default());
        assert_eq!(config.process_names, vec!["DeathsDoor"]);
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert_eq!(config.attach_retry(), Duration::from_secs(1));
        assert!(config.lifecycle.start_on_new_save);
        assert!(config.lifecycle.reset_on_save_menu);
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
            process_names = ["DeathsDoor.exe"]
            tick_interval_ms = 33

            [lifecycle]
            reset_on_save_menu = false

            [[splits]]
            category = "Scene"
            identifier = "lvl_HallOfDoors"

            [[splits]]
            category = "TruthEnding"

            [pointers.current_scene]
            pattern = "48 8B 05 ?? ?? ?? ??"
            offsets = [0, 32]

            [pointers.is_loading]
            module_offset = 0x1234
            offsets = [0, 0x18]
        "#;

        let config = AutosplitterConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.tick_interval_ms, 33);
        assert!(!config.lifecycle.reset_on_save_menu);
        assert!(config.lifecycle.reset_on_delete);

        let rules = config.split_rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], SplitRule::new(SplitCategory::Scene, "lvl_HallOfDoors"));
        assert_eq!(rules[1].category, SplitCategory::TruthEnding);

        let scene = &config.pointers["current_scene"];
        assert_eq!(scene.rip_offset, 3);
        assert_eq!(scene.offsets, vec![0, 32]);
        assert_eq!(config.pointers["is_loading"].module_offset, 0x1234);
        assert_eq!(config.resolver().len(), 2);
    }

    #[test]
    fn test_rejects_unknown_category() {
        let toml_str = r#"
            [[splits]]
            category = "Boss"
            identifier = "gob"
        "#;
        let err = AutosplitterConfig::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, AutosplitterError::ConfigurationInvalid(_)));
        assert!(err.to_string().contains("split #1"));
    }

    #[test]
    fn test_rejects_missing_identifier() {
        let toml_str = r#"
            [[splits]]
            category = "Bool"
        "#;
        assert!(AutosplitterConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_rejects_zero_interval_and_bad_pattern() {
        assert!(AutosplitterConfig::from_toml_str("tick_interval_ms = 0").is_err());

        let toml_str = r#"
            [pointers.scene]
            pattern = "48 XX"
        "#;
        assert!(AutosplitterConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = AutosplitterConfig::from_toml_str("splits = [").unwrap_err();
        assert!(matches!(err, AutosplitterError::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AutosplitterConfig::load("/nonexistent/deaths_door.toml").unwrap_err();
        assert!(matches!(err, AutosplitterError::ConfigIo { .. }));
    }

    #[test]
    fn test_splits_from_json() {
        let mut config = AutosplitterConfig::default();
        config
            .set_splits_from_json(r#"[{"category": "Fade", "identifier": "lod"}, {"category": "TruthEnding"}]"#)
            .unwrap();
        assert_eq!(config.splits.len(), 2);

        let err = config.set_splits_from_json(r#"[{"category": "Nope", "identifier": "x"}]"#);
        assert!(err.is_err());
        assert_eq!(config.splits.len(), 2);

        let err = config.set_splits_from_json("not json").unwrap_err();
        assert!(matches!(err, AutosplitterError::SplitListParse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = AutosplitterConfig::default();
        config.splits.push(SplitRuleConfig::new("Count", "seeds_4"));
        config.pointers.insert("scene".into(), PointerPathConfig::default());

        let text = config.to_toml_string().unwrap();
        assert_eq!(AutosplitterConfig::from_toml_str(&text).unwrap(), config);
    }
}
