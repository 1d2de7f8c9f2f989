//! Core rule module - pure, deterministic, and testable
//!
//! This crate holds the board model and every rule that acts on it. It has **no
//! dependencies** on timing, rendering, or I/O, making it:
//!
//! - **Deterministic**: the same board and move always produce the same plan
//! - **Atomic**: a move is planned read-only and committed in one step
//! - **Portable**: runs headless, in tests, benches, or behind any renderer
//!
//! # Module Structure
//!
//! - [`board`]: piece and cluster arenas with by-type and by-position indexes
//! - [`cluster`]: connected-component grouping, splitting, and duckling absorption
//! - [`rules`]: cascading push/drag move resolution and rule variants
//! - [`codec`]: mixed-radix level codes (`WWHH` + hex payload)
//! - [`outline`]: boundary contours of the solid region
//! - [`snapshot`]: owned, serializable board views
//!
//! # Example
//!
//! ```
//! use duck_castle_core::{build_clusters, cascade_move, apply_plan, decode_level, Board, RuleSet};
//! use duck_castle_core::types::PieceType;
//!
//! let grid = decode_level("03013a").unwrap();
//! let mut board = Board::load(&grid);
//! build_clusters(&mut board, PieceType::Duck);
//!
//! let rules = RuleSet::classic();
//! let duck = board.pieces_of(PieceType::Duck)[0];
//! let plan = cascade_move(&board, &rules, duck, 1, 0).unwrap();
//! apply_plan(&mut board, &rules, &plan);
//!
//! assert_eq!(board.piece(duck).unwrap().position(), (1, 0));
//! ```

pub mod board;
pub mod cluster;
pub mod codec;
pub mod outline;
pub mod rules;
pub mod snapshot;

pub use duck_castle_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, Cluster, ClusterId, Piece, PieceId};
pub use cluster::{
    build_clusters, check_partition, connect_ducklings, group, regroup, split_cluster,
    ClusterInvariantError, Transmutation,
};
pub use codec::{decode_level, encode_level, LevelCodeError, LevelCodec, LevelGrid};
pub use outline::{trace, CellRule, Contour, Outline, OutlineError, OutlineLayout, Point};
pub use rules::{
    apply_plan, cascade_move, cascade_move_from, hazard_victims, AppliedMove, MovePlan, MoveStep,
    RuleSet,
};
pub use snapshot::{BoardSnapshot, ClusterView, PieceView};
