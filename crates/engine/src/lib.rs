//! Simulation engine - drives a loaded level one fixed tick at a time
//!
//! The rule core in `duck-castle-core` is stateless between calls; this crate adds the
//! context a running game needs: the phase timer that gates input, the set of pieces moved
//! by the last action, ducks-on-goal tracking, and the win check.
//!
//! # Example
//!
//! ```
//! use duck_castle_engine::{Level, LevelConfig, LevelEvent, DEFAULT_LEVEL};
//! use duck_castle_types::{Direction, GameAction};
//!
//! let mut level = Level::load(DEFAULT_LEVEL, &LevelConfig::default()).unwrap();
//! assert!(level.apply_action(GameAction::Move(Direction::Right)));
//!
//! // Input is ignored until the slide animation is over
//! assert!(!level.apply_action(GameAction::Move(Direction::Right)));
//! let events = level.run_until_interactive(100);
//! assert!(matches!(events.first(), Some(LevelEvent::Settled(_))));
//! ```

pub mod config;
pub mod level;
pub mod phase;

use thiserror::Error;

use duck_castle_core::LevelCodeError;

pub use config::{EngineConfig, LevelConfig, Viewport, DEFAULT_LEVEL};
pub use level::{Level, LevelEvent, SettleReport};
pub use phase::{PhaseMap, PhaseState, PhaseTracker, DUCK_PHASES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("invalid level: {0}")]
    Code(#[from] LevelCodeError),
    #[error("unknown rule variant {0:?} (expected classic or loose)")]
    UnknownVariant(String),
    #[error("unknown outline rule {0:?} (expected occupied or nonvoid)")]
    UnknownCellRule(String),
}
