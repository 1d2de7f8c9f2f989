//! Move resolution - cascading pushes and rigid cluster moves
//!
//! A move is computed first and committed second:
//!
//! 1. [`cascade_move`] walks the board read-only and returns a [`MovePlan`] listing every
//!    piece that has to move, or `None` if anything in the chain is blocked.
//! 2. [`apply_plan`] commits the plan through `put_piece` and flags hazard victims.
//!
//! Because planning only borrows the board, a rejected move never needs to be undone.

use std::collections::HashSet;

use tracing::trace;

use crate::board::{Board, PieceId};
use crate::types::{PieceType, PieceTypeSet};

/// Which piece types block, get pushed, kill, or form clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    /// A mover can never enter a cell holding one of these (unless it is in its own cluster)
    pub collide: PieceTypeSet,
    /// Pieces at the target that move along with the mover
    pub push: PieceTypeSet,
    /// Pieces that kill whatever lands on their cell
    pub hazard: PieceTypeSet,
    /// Types partitioned into clusters at load time
    pub clustered: PieceTypeSet,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::classic()
    }
}

impl RuleSet {
    /// The full game: ducks block each other, ducklings and boxes get pushed
    pub const fn classic() -> Self {
        Self {
            collide: PieceTypeSet::of(&[PieceType::Void, PieceType::Duck]),
            push: PieceTypeSet::of(&[PieceType::Duckling, PieceType::Box]),
            hazard: PieceTypeSet::of(&[PieceType::Cutter]),
            clustered: PieceTypeSet::of(&[PieceType::Duck, PieceType::Duckling, PieceType::Box]),
        }
    }

    /// Only holes block; ducks may overlap
    pub const fn loose() -> Self {
        Self {
            collide: PieceTypeSet::of(&[PieceType::Void]),
            ..Self::classic()
        }
    }

    /// Look up a variant by name
    pub fn for_variant(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "classic" => Some(Self::classic()),
            "loose" => Some(Self::loose()),
            _ => None,
        }
    }
}

/// One piece displaced by one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveStep {
    pub piece: PieceId,
    pub dx: i32,
    pub dy: i32,
}

/// Every piece a cascade displaces, each exactly once, in depth-first order.
/// The initiating piece is always first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovePlan {
    steps: Vec<MoveStep>,
}

impl MovePlan {
    pub fn steps(&self) -> &[MoveStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.steps.iter().any(|s| s.piece == id)
    }

    /// Ids in plan order
    pub fn pieces(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.steps.iter().map(|s| s.piece)
    }
}

/// Outcome of committing a plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedMove {
    /// Moved pieces in plan order
    pub moved: Vec<PieceId>,
    /// Moved pieces that landed on a hazard and are now flagged `killed`
    pub killed: Vec<PieceId>,
}

/// Plan a move of `piece` by `(dx, dy)`.
///
/// Returns None if the piece is gone or any piece in the chain is blocked.
pub fn cascade_move(
    board: &Board,
    rules: &RuleSet,
    piece: PieceId,
    dx: i32,
    dy: i32,
) -> Option<MovePlan> {
    cascade_move_from(board, rules, piece, dx, dy, None)
}

/// Plan a move of `piece` caused by `cause`.
///
/// When `cause` belongs to `piece`'s cluster the cluster is already being moved by it, so
/// the rigid expansion is skipped.
pub fn cascade_move_from(
    board: &Board,
    rules: &RuleSet,
    piece: PieceId,
    dx: i32,
    dy: i32,
    cause: Option<PieceId>,
) -> Option<MovePlan> {
    let mut visited = HashSet::new();
    let mut steps = Vec::new();
    if resolve(board, rules, piece, dx, dy, cause, &mut visited, &mut steps) {
        Some(MovePlan { steps })
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve(
    board: &Board,
    rules: &RuleSet,
    id: PieceId,
    dx: i32,
    dy: i32,
    cause: Option<PieceId>,
    visited: &mut HashSet<PieceId>,
    steps: &mut Vec<MoveStep>,
) -> bool {
    // Already scheduled with the same delta.
    if !visited.insert(id) {
        return true;
    }
    let Some(piece) = board.piece(id) else {
        return false;
    };
    steps.push(MoveStep { piece: id, dx, dy });

    let (tx, ty) = (piece.x() + dx, piece.y() + dy);
    if !board.in_bounds(tx, ty) {
        trace!(piece = id.0, x = tx, y = ty, "move leaves the board");
        return false;
    }

    let target = board.pieces_at(tx, ty);
    for &other in target {
        let Some(o) = board.piece(other) else {
            continue;
        };
        if rules.collide.contains(o.kind()) && !board.same_cluster(id, other) {
            trace!(piece = id.0, blocker = other.0, kind = o.kind().as_str(), "move blocked");
            return false;
        }
    }

    let mut work: Vec<PieceId> = Vec::new();
    let rigid = !cause.is_some_and(|c| board.same_cluster(c, id));
    if rigid {
        if let Some(cluster) = board.cluster_of(id) {
            work.extend(cluster.pieces().iter().copied().filter(|&m| m != id));
        }
    }
    work.extend(target.iter().copied().filter(|&other| {
        !board.same_cluster(id, other)
            && board
                .piece(other)
                .is_some_and(|o| rules.push.contains(o.kind()))
    }));

    work.into_iter()
        .all(|next| resolve(board, rules, next, dx, dy, Some(id), visited, steps))
}

/// Moved pieces of a plan that would end up sharing a cell with a hazard.
///
/// Evaluated against the post-move occupancy, so a hazard that is itself pushed away does
/// not kill anything, and one pushed onto a piece does.
pub fn hazard_victims(board: &Board, rules: &RuleSet, plan: &MovePlan) -> Vec<PieceId> {
    if rules.hazard.is_empty() {
        return Vec::new();
    }

    let landing = |id: PieceId| -> Option<(i32, i32)> {
        let piece = board.piece(id)?;
        let (dx, dy) = plan
            .steps
            .iter()
            .find(|s| s.piece == id)
            .map_or((0, 0), |s| (s.dx, s.dy));
        Some((piece.x() + dx, piece.y() + dy))
    };

    let hazards: Vec<(PieceId, (i32, i32))> = rules
        .hazard
        .iter()
        .flat_map(|kind| board.pieces_of(kind).iter().copied())
        .filter_map(|h| landing(h).map(|pos| (h, pos)))
        .collect();

    plan.pieces()
        .filter(|&id| {
            landing(id).is_some_and(|pos| hazards.iter().any(|&(h, hpos)| h != id && hpos == pos))
        })
        .collect()
}

/// Commit a plan: move every piece and flag hazard victims as killed
pub fn apply_plan(board: &mut Board, rules: &RuleSet, plan: &MovePlan) -> AppliedMove {
    let killed = hazard_victims(board, rules, plan);

    let mut moved = Vec::with_capacity(plan.len());
    for step in plan.steps() {
        let Some((x, y)) = board.piece(step.piece).map(|p| p.position()) else {
            continue;
        };
        if board.put_piece(step.piece, x + step.dx, y + step.dy) {
            moved.push(step.piece);
        }
    }
    for &victim in &killed {
        board.set_killed(victim, true);
    }

    AppliedMove { moved, killed }
}
