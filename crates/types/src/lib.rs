//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no behavior beyond parsing and lookup, making them
//! usable in any context (rule core, simulation engine, CLI).
//!
//! # Palette
//!
//! Every [`PieceType`] doubles as a palette index of the level codec:
//!
//! | Index | Type | Notes |
//! |-------|------|-------|
//! | 0 | `Void` | Hole; blocks movement |
//! | 1 | `Floor` | Default background, never materialized as a piece |
//! | 2 | `Duck` | Player-controlled |
//! | 3 | `Duckling` | Dormant, joins the ducks on contact |
//! | 4 | `Goal` | Floor marker |
//! | 5 | `Box` | Pushable obstacle |
//! | 6 | `Cutter` | Stationary hazard |
//!
//! # Timing Constants
//!
//! Durations are counted in fixed simulation ticks (50 ticks per second):
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MOVE_DURATION` | 10 | Slide animation for one move |
//! | `CONNECT_DURATION` | 20 | Duckling/duck conversion animation |
//! | `LEAVE_DURATION` | 64 | Exit transition after a win |
//! | `ENTER_DURATION` | 64 | Entry transition into the next level |
//!
//! # Examples
//!
//! ```
//! use duck_castle_types::{Direction, GameAction, PieceType, LEVEL_CARDINALITY};
//!
//! // Palette index round-trip
//! assert_eq!(PieceType::from_index(2), Some(PieceType::Duck));
//! assert_eq!(PieceType::Duck.index(), 2);
//!
//! // Parse from string (case-insensitive)
//! assert_eq!(PieceType::from_str("BOX"), Some(PieceType::Box));
//!
//! // Directions carry their unit delta
//! assert_eq!(Direction::Left.delta(), (-1, 0));
//!
//! // Parse game action
//! assert_eq!(GameAction::from_str("up"), Some(GameAction::Move(Direction::Up)));
//!
//! assert_eq!(LEVEL_CARDINALITY, 7);
//! ```

use serde::{Deserialize, Serialize};

/// Fixed simulation rate (ticks per second)
pub const TICKS_PER_SECOND: u32 = 50;

/// Fixed timestep interval in milliseconds (20ms = 50 ticks per second)
pub const TICK_MS: u32 = 1000 / TICKS_PER_SECOND;

/// Slide animation length for one accepted move (ticks)
pub const MOVE_DURATION: u32 = 10;

/// Duck/duckling conversion animation length (ticks)
pub const CONNECT_DURATION: u32 = 20;

/// Exit transition after a win (ticks)
pub const LEAVE_DURATION: u32 = 64;

/// Entry transition into the next level (ticks)
pub const ENTER_DURATION: u32 = 64;

/// Number of palette entries in the richest level variant
pub const LEVEL_CARDINALITY: u8 = 7;

/// Largest board side a level code can express (two hex digits)
pub const MAX_BOARD_SIDE: u8 = 255;

/// Default layout viewport width in screen units
pub const SCREEN_WIDTH: f64 = 960.0;

/// Default layout viewport height in screen units
pub const SCREEN_HEIGHT: f64 = 540.0;

/// The seven piece types of the game
///
/// The discriminant is the palette index used by the level codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PieceType {
    Void = 0,
    Floor = 1,
    Duck = 2,
    Duckling = 3,
    Goal = 4,
    Box = 5,
    Cutter = 6,
}

impl PieceType {
    /// Number of piece types
    pub const COUNT: usize = 7;

    /// All piece types in palette order
    pub const ALL: [PieceType; Self::COUNT] = [
        PieceType::Void,
        PieceType::Floor,
        PieceType::Duck,
        PieceType::Duckling,
        PieceType::Goal,
        PieceType::Box,
        PieceType::Cutter,
    ];

    /// Palette index of this type
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a type by palette index
    ///
    /// # Examples
    ///
    /// ```
    /// use duck_castle_types::PieceType;
    ///
    /// assert_eq!(PieceType::from_index(0), Some(PieceType::Void));
    /// assert_eq!(PieceType::from_index(6), Some(PieceType::Cutter));
    /// assert_eq!(PieceType::from_index(7), None);
    /// ```
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Parse piece type from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "void" => Some(PieceType::Void),
            "floor" => Some(PieceType::Floor),
            "duck" => Some(PieceType::Duck),
            "duckling" => Some(PieceType::Duckling),
            "goal" => Some(PieceType::Goal),
            "box" => Some(PieceType::Box),
            "cutter" => Some(PieceType::Cutter),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceType::Void => "void",
            PieceType::Floor => "floor",
            PieceType::Duck => "duck",
            PieceType::Duckling => "duckling",
            PieceType::Goal => "goal",
            PieceType::Box => "box",
            PieceType::Cutter => "cutter",
        }
    }

    /// Single-character glyph used by text dumps and the CLI
    ///
    /// # Examples
    ///
    /// ```
    /// use duck_castle_types::PieceType;
    ///
    /// for t in PieceType::ALL {
    ///     assert_eq!(PieceType::from_glyph(t.glyph()), Some(t));
    /// }
    /// ```
    pub fn glyph(&self) -> char {
        match self {
            PieceType::Void => '#',
            PieceType::Floor => '.',
            PieceType::Duck => '@',
            PieceType::Duckling => 'o',
            PieceType::Goal => '*',
            PieceType::Box => 'B',
            PieceType::Cutter => 'x',
        }
    }

    /// Parse a glyph produced by [`PieceType::glyph`]
    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            '#' => Some(PieceType::Void),
            '.' => Some(PieceType::Floor),
            '@' => Some(PieceType::Duck),
            'o' => Some(PieceType::Duckling),
            '*' => Some(PieceType::Goal),
            'B' => Some(PieceType::Box),
            'x' => Some(PieceType::Cutter),
            _ => None,
        }
    }
}

/// A small set of piece types, stored as a bit mask
///
/// Used by rule variants to describe which types collide, get pushed, kill, or cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PieceTypeSet(u8);

impl PieceTypeSet {
    /// The empty set
    pub const EMPTY: PieceTypeSet = PieceTypeSet(0);

    /// Build a set from a list of types
    ///
    /// # Examples
    ///
    /// ```
    /// use duck_castle_types::{PieceType, PieceTypeSet};
    ///
    /// const PUSH: PieceTypeSet = PieceTypeSet::of(&[PieceType::Duckling, PieceType::Box]);
    /// assert!(PUSH.contains(PieceType::Box));
    /// assert!(!PUSH.contains(PieceType::Duck));
    /// ```
    pub const fn of(types: &[PieceType]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < types.len() {
            bits |= 1 << (types[i] as u8);
            i += 1;
        }
        PieceTypeSet(bits)
    }

    /// Return a copy of this set with `kind` added
    pub const fn with(self, kind: PieceType) -> Self {
        PieceTypeSet(self.0 | (1 << (kind as u8)))
    }

    /// Check membership
    #[inline]
    pub const fn contains(self, kind: PieceType) -> bool {
        self.0 & (1 << (kind as u8)) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate members in palette order
    pub fn iter(self) -> impl Iterator<Item = PieceType> {
        PieceType::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

/// The four unit move directions
///
/// Screen convention: `y` grows downward, so `Up` is `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit delta `(dx, dy)` for this direction
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parse direction from string
    ///
    /// Accepts full names or single letters (case-insensitive):
    /// "up" | "u", "down" | "d", "left" | "l", "right" | "r"
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Parse a single move character
    ///
    /// Accepts `u d l r` (any case) and the vi keys `k j h l`.
    /// `l` is ambiguous between the two layouts and resolves to `Left`.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'u' | 'k' => Some(Direction::Up),
            'd' | 'j' => Some(Direction::Down),
            'l' | 'h' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Game actions that can be applied to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Move the duck formation one cell
    Move(Direction),
    /// Reload the level from its initial layout
    Restart,
}

impl GameAction {
    /// Parse action from string
    ///
    /// # Examples
    ///
    /// ```
    /// use duck_castle_types::{Direction, GameAction};
    ///
    /// assert_eq!(GameAction::from_str("left"), Some(GameAction::Move(Direction::Left)));
    /// assert_eq!(GameAction::from_str("Restart"), Some(GameAction::Restart));
    /// assert_eq!(GameAction::from_str("jump"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("restart") {
            return Some(GameAction::Restart);
        }
        Direction::from_str(s).map(GameAction::Move)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Move(direction) => direction.as_str(),
            GameAction::Restart => "restart",
        }
    }
}

/// Animation phases of the duck formation
///
/// The rule core only cares whether the phase is `Interactive`; the rest gate input
/// while an animation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuckPhase {
    Initial,
    Interactive,
    Moving,
    Connecting,
    Leaving,
    Entering,
}

impl DuckPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuckPhase::Initial => "initial",
            DuckPhase::Interactive => "interactive",
            DuckPhase::Moving => "moving",
            DuckPhase::Connecting => "connecting",
            DuckPhase::Leaving => "leaving",
            DuckPhase::Entering => "entering",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_indices_match_level_format() {
        // Palette order is part of the level code format.
        assert_eq!(PieceType::Void.index(), 0);
        assert_eq!(PieceType::Floor.index(), 1);
        assert_eq!(PieceType::Duck.index(), 2);
        assert_eq!(PieceType::Duckling.index(), 3);
        assert_eq!(PieceType::Goal.index(), 4);
        assert_eq!(PieceType::Box.index(), 5);
        assert_eq!(PieceType::Cutter.index(), 6);
        assert_eq!(PieceType::COUNT, LEVEL_CARDINALITY as usize);
    }

    #[test]
    fn type_set_membership() {
        let set = PieceTypeSet::EMPTY.with(PieceType::Void).with(PieceType::Duck);
        assert!(set.contains(PieceType::Void));
        assert!(set.contains(PieceType::Duck));
        assert!(!set.contains(PieceType::Duckling));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![PieceType::Void, PieceType::Duck]);
        assert!(PieceTypeSet::EMPTY.is_empty());
    }

    #[test]
    fn direction_deltas_are_unit() {
        for d in Direction::ALL {
            let (dx, dy) = d.delta();
            assert_eq!(dx.abs() + dy.abs(), 1);
            assert_eq!(Direction::from_str(d.as_str()), Some(d));
        }
    }

    #[test]
    fn direction_from_char_accepts_vi_keys() {
        assert_eq!(Direction::from_char('k'), Some(Direction::Up));
        assert_eq!(Direction::from_char('J'), Some(Direction::Down));
        assert_eq!(Direction::from_char('h'), Some(Direction::Left));
        assert_eq!(Direction::from_char('R'), Some(Direction::Right));
        assert_eq!(Direction::from_char('?'), None);
    }

    #[test]
    fn tick_timing_defaults() {
        assert_eq!(TICK_MS, 20);
        assert_eq!(MOVE_DURATION, 10);
        assert_eq!(CONNECT_DURATION, 20);
        assert_eq!(LEAVE_DURATION, ENTER_DURATION);
    }
}
