//! Level - one loaded board plus the state that drives it
//!
//! The level owns everything a game step touches: the board, the rule variant, the phase
//! timer, the set of pieces animated by the last move, and the ducks-on-goal bookkeeping.
//!
//! A step looks like this:
//!
//! 1. [`Level::apply_action`] (only while `Interactive`) plans and commits a move, then
//!    enters `Moving`.
//! 2. [`Level::tick`] counts the animation down. When it ends, [`Level::settle`] removes
//!    hazard victims, repairs clusters, and absorbs touching ducklings (entering
//!    `Connecting` if anything changed).
//! 3. Back in `Interactive`, [`Level::check_win`] decides whether to leave the level.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use duck_castle_core::{
    apply_plan, build_clusters, cascade_move, check_partition, connect_ducklings,
    hazard_victims, regroup, split_cluster, Board, BoardSnapshot, CellRule, ClusterId, LevelCodec,
    LevelGrid, Outline, OutlineLayout, PieceId, RuleSet,
};
use duck_castle_types::{
    Direction, DuckPhase, GameAction, PieceType, CONNECT_DURATION, LEAVE_DURATION, MOVE_DURATION,
};

use crate::config::LevelConfig;
use crate::phase::{PhaseState, PhaseTracker, DUCK_PHASES};
use crate::LevelError;

/// What happened when a move finished settling
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SettleReport {
    /// Killed pieces removed from the board
    pub discarded: Vec<PieceId>,
    /// Ducklings left behind by a split duck formation
    pub decayed: Vec<PieceId>,
    /// Ducks created from absorbed ducklings
    pub absorbed: Vec<PieceId>,
}

impl SettleReport {
    pub fn is_quiet(&self) -> bool {
        self.discarded.is_empty() && self.decayed.is_empty() && self.absorbed.is_empty()
    }
}

/// Notable outcomes of [`Level::tick`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "event")]
pub enum LevelEvent {
    /// An animation ended and the board settled
    Settled(SettleReport),
    /// Every duck stands on a goal; the level is leaving
    Won,
    /// The leave transition finished; the caller should load the next level
    Advance,
}

pub struct Level<P: PhaseTracker = PhaseState> {
    board: Board,
    config: LevelConfig,
    initial: LevelGrid,
    /// Pieces touched since the last settle
    active: BTreeSet<PieceId>,
    ducks_on_goal: BTreeSet<PieceId>,
    ducks_on_goal_next: BTreeSet<PieceId>,
    outline: Option<Outline>,
    layout: OutlineLayout,
    phase: P,
    moves: u32,
    won: bool,
}

impl Level<PhaseState> {
    /// Decode a level code and build a ready-to-play level
    pub fn load(code: &str, config: &LevelConfig) -> Result<Self, LevelError> {
        let grid = LevelCodec::new(config.cardinality)?.decode(code)?;
        Ok(Self::from_grid(grid, config))
    }

    /// Load `code`, or `fallback` if `code` is rejected
    pub fn load_or_default(code: &str, fallback: &str, config: &LevelConfig) -> Result<Self, LevelError> {
        match Self::load(code, config) {
            Ok(level) => Ok(level),
            Err(err) => {
                warn!(error = %err, "level rejected, loading the default level");
                Self::load(fallback, config)
            }
        }
    }

    pub fn from_grid(grid: LevelGrid, config: &LevelConfig) -> Self {
        Self::with_tracker(grid, config, PhaseState::new(DuckPhase::Interactive))
    }
}

impl<P: PhaseTracker> Level<P> {
    /// Build a level driven by a custom phase tracker. The tracker is switched to
    /// `Interactive`.
    pub fn with_tracker(grid: LevelGrid, config: &LevelConfig, mut phase: P) -> Self {
        let layout = OutlineLayout::fit(
            grid.width(),
            grid.height(),
            config.viewport.width,
            config.viewport.height,
        );
        phase.enter_phase(DuckPhase::Interactive, 0);

        let mut level = Self {
            board: Board::new(grid.width(), grid.height()),
            config: *config,
            initial: grid,
            active: BTreeSet::new(),
            ducks_on_goal: BTreeSet::new(),
            ducks_on_goal_next: BTreeSet::new(),
            outline: None,
            layout,
            phase,
            moves: 0,
            won: false,
        };
        level.reset_board();
        level
    }

    /// Rebuild the board from the initial grid
    fn reset_board(&mut self) {
        self.board = Board::load(&self.initial);
        for kind in self.config.rules.clustered.iter() {
            build_clusters(&mut self.board, kind);
        }
        self.active.clear();
        self.ducks_on_goal = self.ducks_standing_on_goals();
        self.ducks_on_goal_next = self.ducks_on_goal.clone();
        self.moves = 0;
        self.won = false;

        self.outline = match Outline::build(&self.board, self.config.cell_rule, self.layout) {
            Ok(outline) => Some(outline),
            Err(err) => {
                error!(error = %err, "outline trace failed, drawing without it");
                None
            }
        };

        info!(
            width = self.board.width(),
            height = self.board.height(),
            pieces = self.board.piece_count(),
            "level loaded"
        );
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn rules(&self) -> &RuleSet {
        &self.config.rules
    }

    pub fn cell_rule(&self) -> CellRule {
        self.config.cell_rule
    }

    pub fn phase(&self) -> DuckPhase {
        self.phase.phase()
    }

    pub fn phase_tracker(&self) -> &P {
        &self.phase
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn layout(&self) -> OutlineLayout {
        self.layout
    }

    pub fn active(&self) -> &BTreeSet<PieceId> {
        &self.active
    }

    pub fn ducks_on_goal(&self) -> &BTreeSet<PieceId> {
        &self.ducks_on_goal
    }

    pub fn ducks_on_goal_next(&self) -> &BTreeSet<PieceId> {
        &self.ducks_on_goal_next
    }

    /// Accepted moves since load or restart
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.board)
    }

    /// Level code of the current board (stacked pieces are not representable)
    pub fn code(&self) -> Result<String, LevelError> {
        let codec = LevelCodec::new(self.config.cardinality)?;
        Ok(codec.encode(&LevelGrid::from_board(&self.board))?)
    }

    /// The duck furthest along `direction`, earliest created on ties
    pub fn leading_duck(&self, direction: Direction) -> Option<PieceId> {
        let (dx, dy) = direction.delta();
        let mut best: Option<(i32, PieceId)> = None;
        for &id in self.board.pieces_of(PieceType::Duck) {
            let Some(duck) = self.board.piece(id).filter(|p| !p.killed()) else {
                continue;
            };
            let reach = duck.x() * dx + duck.y() * dy;
            if best.map_or(true, |(r, _)| reach > r) {
                best = Some((reach, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Move `piece` one cell. Returns false if the move is blocked or would cost the
    /// last duck; the board is untouched in that case.
    pub fn try_move(&mut self, piece: PieceId, direction: Direction) -> bool {
        let (dx, dy) = direction.delta();
        let rules = self.config.rules;

        let Some(plan) = cascade_move(&self.board, &rules, piece, dx, dy) else {
            debug!(piece = piece.0, direction = direction.as_str(), "move blocked");
            return false;
        };

        let victims: HashSet<PieceId> = hazard_victims(&self.board, &rules, &plan)
            .into_iter()
            .collect();
        let survivors = self
            .board
            .pieces_of(PieceType::Duck)
            .iter()
            .filter(|&&id| {
                !victims.contains(&id) && self.board.piece(id).is_some_and(|p| !p.killed())
            })
            .count();
        if survivors == 0 {
            debug!(piece = piece.0, "move refused, it would lose the last duck");
            return false;
        }

        let applied = apply_plan(&mut self.board, &rules, &plan);
        self.active.extend(applied.moved.iter().copied());
        self.ducks_on_goal_next = self.ducks_standing_on_goals();
        self.phase.enter_phase(DuckPhase::Moving, MOVE_DURATION);
        self.moves += 1;

        debug!(
            direction = direction.as_str(),
            moved = applied.moved.len(),
            killed = applied.killed.len(),
            "move accepted"
        );
        true
    }

    /// Apply a player action. Ignored unless the level is `Interactive`.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        if self.phase.phase() != DuckPhase::Interactive {
            return false;
        }
        match action {
            GameAction::Move(direction) => match self.leading_duck(direction) {
                Some(duck) => self.try_move(duck, direction),
                None => false,
            },
            GameAction::Restart => {
                self.reset_board();
                self.phase.enter_phase(DuckPhase::Interactive, 0);
                true
            }
        }
    }

    /// Advance the phase timer by one tick
    pub fn tick(&mut self) -> Option<LevelEvent> {
        let previous = self.phase.update_phase(DUCK_PHASES)?;

        match (previous, self.phase.phase()) {
            (DuckPhase::Moving | DuckPhase::Connecting, DuckPhase::Interactive) => {
                let report = self.settle();
                if self.phase.phase() == DuckPhase::Interactive && self.check_win() {
                    return Some(LevelEvent::Won);
                }
                Some(LevelEvent::Settled(report))
            }
            (DuckPhase::Leaving, DuckPhase::Entering) => Some(LevelEvent::Advance),
            _ => None,
        }
    }

    /// Tick until the level accepts input again, is won, or `limit` ticks pass.
    /// Returns every event seen on the way.
    pub fn run_until_interactive(&mut self, limit: u32) -> Vec<LevelEvent> {
        let mut events = Vec::new();
        for _ in 0..limit {
            if self.phase.phase() == DuckPhase::Interactive {
                break;
            }
            if let Some(event) = self.tick() {
                let won = event == LevelEvent::Won;
                events.push(event);
                if won {
                    break;
                }
            }
        }
        events
    }

    /// Resolve the aftermath of the last animation.
    ///
    /// Killed pieces leave the board and their clusters are split, moved pieces merge with
    /// clusters they now touch, and ducklings next to the surviving moved ducks join them.
    pub fn settle(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        let active = std::mem::take(&mut self.active);

        let mut broken: BTreeSet<ClusterId> = BTreeSet::new();
        let mut survivors = Vec::new();
        let mut ducks = Vec::new();

        for id in active {
            let Some(piece) = self.board.piece(id) else {
                continue;
            };
            let (kind, cluster) = (piece.kind(), piece.cluster());
            if piece.killed() {
                self.board.discard_piece(id);
                report.discarded.push(id);
                broken.extend(cluster);
                continue;
            }

            self.board.settle_piece(id);
            if self.config.rules.clustered.contains(kind) {
                survivors.push(id);
            }
            if kind == PieceType::Duck {
                ducks.push(id);
            }
        }

        for cid in broken {
            let split = split_cluster(&mut self.board, cid);
            report.decayed.extend(split.created.iter().copied());
        }
        regroup(&mut self.board, &survivors);

        self.ducks_on_goal = self.ducks_standing_on_goals();
        self.ducks_on_goal_next = self.ducks_on_goal.clone();

        ducks.retain(|&id| self.board.contains(id));
        report.absorbed = connect_ducklings(&mut self.board, &ducks);

        self.active.extend(report.decayed.iter().copied());
        self.active.extend(report.absorbed.iter().copied());
        if !report.absorbed.is_empty() {
            // New ducks may have appeared on goals.
            self.ducks_on_goal_next = self.ducks_standing_on_goals();
        }
        if !report.absorbed.is_empty() || !report.decayed.is_empty() {
            self.phase.enter_phase(DuckPhase::Connecting, CONNECT_DURATION);
        }

        debug_assert!(self
            .config
            .rules
            .clustered
            .iter()
            .all(|kind| check_partition(&self.board, kind).is_ok()));

        if !report.is_quiet() {
            debug!(
                discarded = report.discarded.len(),
                decayed = report.decayed.len(),
                absorbed = report.absorbed.len(),
                "board settled"
            );
        }
        report
    }

    /// Check the win condition and start leaving if it holds
    pub fn check_win(&mut self) -> bool {
        let ducks = self.board.pieces_of(PieceType::Duck).len();
        let goals = self.board.pieces_of(PieceType::Goal).len();
        let won = ducks > 0
            && ducks == goals
            && ducks == self.ducks_on_goal.len()
            && ducks == self.ducks_on_goal_next.len();

        if won {
            self.won = true;
            self.phase.enter_phase(DuckPhase::Leaving, LEAVE_DURATION);
            info!(moves = self.moves, "level complete");
        }
        won
    }

    fn ducks_standing_on_goals(&self) -> BTreeSet<PieceId> {
        self.board
            .pieces_of(PieceType::Duck)
            .iter()
            .copied()
            .filter(|&id| {
                self.board.piece(id).is_some_and(|duck| {
                    !duck.killed() && self.board.contains_type_at(duck.x(), duck.y(), PieceType::Goal)
                })
            })
            .collect()
    }
}
