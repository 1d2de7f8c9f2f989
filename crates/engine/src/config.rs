//! Engine configuration - environment defaults and per-level settings

use std::env;

use duck_castle_core::{CellRule, RuleSet};
use duck_castle_types::{LEVEL_CARDINALITY, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::LevelError;

/// The built-in level: a duck, a duckling, and two goals inside a small castle
pub const DEFAULT_LEVEL: &str = "0c052912c5eb6efdebc0f65bcba6f70abed63";

/// Screen area the board is fitted into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

/// Settings for one level load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    pub rules: RuleSet,
    pub cell_rule: CellRule,
    pub viewport: Viewport,
    pub cardinality: u8,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::classic(),
            cell_rule: CellRule::default(),
            viewport: Viewport::default(),
            cardinality: LEVEL_CARDINALITY,
        }
    }
}

impl LevelConfig {
    /// Replace the rule variant by name
    pub fn with_variant(mut self, name: &str) -> Result<Self, LevelError> {
        self.rules =
            RuleSet::for_variant(name).ok_or_else(|| LevelError::UnknownVariant(name.to_string()))?;
        Ok(self)
    }

    /// Replace the outline cell rule by name
    pub fn with_cell_rule(mut self, name: &str) -> Result<Self, LevelError> {
        self.cell_rule =
            CellRule::from_str(name).ok_or_else(|| LevelError::UnknownCellRule(name.to_string()))?;
        Ok(self)
    }
}

/// Process-wide defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub default_level: String,
    pub level: LevelConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL.to_string(),
            level: LevelConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read `CASTLE_*` variables; anything unset or unparsable keeps its default
    pub fn from_env() -> Self {
        let default_level = env::var("CASTLE_LEVEL")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) })
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        let rules = env::var("CASTLE_VARIANT")
            .ok()
            .and_then(|s| RuleSet::for_variant(s.trim()))
            .unwrap_or_default();

        let cell_rule = env::var("CASTLE_OUTLINE")
            .ok()
            .and_then(|s| CellRule::from_str(s.trim()))
            .unwrap_or_default();

        let width = env::var("CASTLE_SCREEN_WIDTH")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|w| *w > 0.0)
            .unwrap_or(SCREEN_WIDTH);
        let height = env::var("CASTLE_SCREEN_HEIGHT")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|h| *h > 0.0)
            .unwrap_or(SCREEN_HEIGHT);

        Self {
            default_level,
            level: LevelConfig {
                rules,
                cell_rule,
                viewport: Viewport { width, height },
                cardinality: LEVEL_CARDINALITY,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_from_env() {
        // Only test in this crate that touches CASTLE_* variables.
        env::set_var("CASTLE_LEVEL", "  0201f ");
        env::set_var("CASTLE_VARIANT", "loose");
        env::set_var("CASTLE_OUTLINE", "nonvoid");
        env::set_var("CASTLE_SCREEN_WIDTH", "bogus");
        env::set_var("CASTLE_SCREEN_HEIGHT", "720");
        let config = EngineConfig::from_env();
        for name in [
            "CASTLE_LEVEL",
            "CASTLE_VARIANT",
            "CASTLE_OUTLINE",
            "CASTLE_SCREEN_WIDTH",
            "CASTLE_SCREEN_HEIGHT",
        ] {
            env::remove_var(name);
        }

        assert_eq!(config.default_level, "0201f");
        assert_eq!(config.level.rules, RuleSet::loose());
        assert_eq!(config.level.cell_rule, CellRule::NonVoid);
        assert_eq!(config.level.viewport, Viewport { width: SCREEN_WIDTH, height: 720.0 });
    }

    #[test]
    fn test_named_overrides() {
        let config = LevelConfig::default()
            .with_variant("loose")
            .unwrap()
            .with_cell_rule("nonvoid")
            .unwrap();
        assert_eq!(config.rules, RuleSet::loose());
        assert_eq!(config.cell_rule, CellRule::NonVoid);

        assert!(matches!(
            LevelConfig::default().with_variant("chaos"),
            Err(LevelError::UnknownVariant(name)) if name == "chaos"
        ));
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_level, DEFAULT_LEVEL);
        assert_eq!(config.level.viewport, Viewport { width: 960.0, height: 540.0 });
    }
}
