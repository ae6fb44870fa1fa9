//! Split rule and game value types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutosplitterError, Result};
use crate::memory::{f32_at, Readable};

/// Category of a split rule, also the evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SplitCategory {
    /// Boss fight fade-to-white
    Fade,
    /// Boolean progression flag became true
    Bool,
    /// Scene change
    Scene,
    /// Player entered the truth ending trigger
    TruthEnding,
    /// Progression counter reached a value
    Count,
}

impl SplitCategory {
    /// All categories in evaluation order
    pub const ALL: [SplitCategory; 5] = [
        SplitCategory::Fade,
        SplitCategory::Bool,
        SplitCategory::Scene,
        SplitCategory::TruthEnding,
        SplitCategory::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitCategory::Fade => "Fade",
            SplitCategory::Bool => "Bool",
            SplitCategory::Scene => "Scene",
            SplitCategory::TruthEnding => "TruthEnding",
            SplitCategory::Count => "Count",
        }
    }

    /// Whether rules of this category are matched by identifier
    pub fn takes_identifier(&self) -> bool {
        !matches!(self, SplitCategory::TruthEnding)
    }
}

impl fmt::Display for SplitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitCategory {
    type Err = AutosplitterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fade" => Ok(SplitCategory::Fade),
            "bool" => Ok(SplitCategory::Bool),
            "scene" => Ok(SplitCategory::Scene),
            "truthending" | "truth_ending" => Ok(SplitCategory::TruthEnding),
            "count" => Ok(SplitCategory::Count),
            _ => Err(AutosplitterError::config(format!("unknown split category '{}'", s))),
        }
    }
}

/// One configured split
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitRule {
    pub category: SplitCategory,
    /// Scene name, flag key, boss name or `{key}_{value}`; empty for TruthEnding
    #[serde(default)]
    pub identifier: String,
}

impl SplitRule {
    pub fn new(category: SplitCategory, identifier: impl Into<String>) -> Self {
        Self {
            category,
            identifier: identifier.into(),
        }
    }

    /// Build a rule from its textual form, validating the identifier
    pub fn parse(category: &str, identifier: &str) -> Result<Self> {
        let category: SplitCategory = category.parse()?;
        let identifier = identifier.trim();
        if category.takes_identifier() && identifier.is_empty() {
            return Err(AutosplitterError::config(format!(
                "{} split requires an identifier",
                category
            )));
        }
        Ok(Self::new(category, identifier))
    }
}

impl fmt::Display for SplitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identifier.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{}:{}", self.category, self.identifier)
        }
    }
}

/// RGBA colour as stored by the engine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Readable for Color {
    const SIZE: usize = 16;
    fn from_le_slice(bytes: &[u8]) -> Self {
        Self::new(f32_at(bytes, 0), f32_at(bytes, 1), f32_at(bytes, 2), f32_at(bytes, 3))
    }
}

/// A 3D position in game space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    /// Create a new position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Readable for Position3D {
    const SIZE: usize = 12;
    fn from_le_slice(bytes: &[u8]) -> Self {
        Self::new(f32_at(bytes, 0), f32_at(bytes, 1), f32_at(bytes, 2))
    }
}

/// Axis-aligned trigger rectangle on the XZ plane
///
/// The player is treated as a square of half-size `padding`, so the test is
/// an overlap check rather than a point-in-rectangle check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerArea {
    pub center_x: f32,
    pub half_width: f32,
    pub center_z: f32,
    pub half_depth: f32,
    pub padding: f32,
}

impl TriggerArea {
    pub fn contains(&self, pos: &Position3D) -> bool {
        pos.x - self.padding < self.center_x + self.half_width
            && pos.x + self.padding > self.center_x - self.half_width
            && pos.z - self.padding < self.center_z + self.half_depth
            && pos.z + self.padding > self.center_z - self.half_depth
    }
}
