//! Board module - owns every piece and cluster of a level
//!
//! Pieces live in an arena addressed by [`PieceId`]. Two indexes are kept over the same
//! set and must always agree:
//!
//! - by type: `PieceType -> [PieceId]`, in creation order
//! - by position: a flat `height * width` array of cell stacks (row-major, `y * width + x`)
//!
//! Cells hold stacks because a duck can stand on a goal. Clusters live in a second arena
//! addressed by [`ClusterId`]; a piece only stores the id of the cluster it belongs to.
//!
//! Coordinates: `(x, y)` with `x` growing right and `y` growing down, both starting at 0.

use serde::{Deserialize, Serialize};

use crate::codec::LevelGrid;
use crate::types::PieceType;

/// Stable handle of a piece. Ids are never reused within one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// Stable handle of a cluster. Ids are never reused within one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

/// A single piece on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    kind: PieceType,
    x: i32,
    y: i32,
    /// Position before the move currently being animated
    old_x: i32,
    old_y: i32,
    cluster: Option<ClusterId>,
    /// Set when the piece lands on a hazard; the owner removes it once the move settles.
    killed: bool,
}

impl Piece {
    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn kind(&self) -> PieceType {
        self.kind
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn old_position(&self) -> (i32, i32) {
        (self.old_x, self.old_y)
    }

    pub fn cluster(&self) -> Option<ClusterId> {
        self.cluster
    }

    pub fn killed(&self) -> bool {
        self.killed
    }

    /// Squared Euclidean distance between two pieces
    pub fn distance_squared(&self, other: &Piece) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// A connected group of same-type pieces that moves and transmutes as one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    id: ClusterId,
    kind: PieceType,
    pieces: Vec<PieceId>,
}

impl Cluster {
    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn kind(&self) -> PieceType {
        self.kind
    }

    pub fn pieces(&self) -> &[PieceId] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.pieces.contains(&id)
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    /// Piece arena, indexed by `PieceId`; discarded slots stay `None`
    pieces: Vec<Option<Piece>>,
    by_type: [Vec<PieceId>; PieceType::COUNT],
    /// Cell stacks, row-major order (y * width + x)
    cells: Vec<Vec<PieceId>>,
    /// Cluster arena, indexed by `ClusterId`; dissolved slots stay `None`
    clusters: Vec<Option<Cluster>>,
}

impl Board {
    /// Create an empty board
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            pieces: Vec::new(),
            by_type: std::array::from_fn(|_| Vec::new()),
            cells: vec![Vec::new(); width as usize * height as usize],
            clusters: Vec::new(),
        }
    }

    /// Materialize a decoded level. FLOOR cells stay empty.
    pub fn load(grid: &LevelGrid) -> Self {
        let mut board = Board::new(grid.width(), grid.height());
        for y in 0..grid.height() as i32 {
            for x in 0..grid.width() as i32 {
                let Some(kind) = grid.get(x, y).and_then(PieceType::from_index) else {
                    continue;
                };
                if kind != PieceType::Floor {
                    board.create_piece(kind, x, y);
                }
            }
        }
        board
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Check if position is inside the board
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Insert a new piece into both indexes.
    /// Returns None if the position is out of bounds.
    pub fn create_piece(&mut self, kind: PieceType, x: i32, y: i32) -> Option<PieceId> {
        let idx = self.index(x, y)?;
        let id = PieceId(self.pieces.len() as u32);

        self.pieces.push(Some(Piece {
            id,
            kind,
            x,
            y,
            old_x: x,
            old_y: y,
            cluster: None,
            killed: false,
        }));
        self.by_type[kind.index() as usize].push(id);
        self.cells[idx].push(id);

        Some(id)
    }

    /// Remove a piece from both indexes and from its cluster's member list.
    ///
    /// Re-partitioning whatever is left of the cluster is up to the caller.
    pub fn discard_piece(&mut self, id: PieceId) -> Option<Piece> {
        self.detach(id);
        let piece = self.pieces.get_mut(id.0 as usize)?.take()?;

        let list = &mut self.by_type[piece.kind.index() as usize];
        if let Some(pos) = list.iter().position(|&p| p == id) {
            list.remove(pos);
        }

        if let Some(idx) = self.index(piece.x, piece.y) {
            let stack = &mut self.cells[idx];
            if let Some(pos) = stack.iter().position(|&p| p == id) {
                stack.remove(pos);
            }
        }

        Some(piece)
    }

    /// Move a piece to another cell. The type index is untouched.
    /// Returns false if the piece is gone or the target is out of bounds.
    pub fn put_piece(&mut self, id: PieceId, x: i32, y: i32) -> bool {
        let Some(to) = self.index(x, y) else {
            return false;
        };
        let Some((from_x, from_y)) = self.piece(id).map(Piece::position) else {
            return false;
        };

        if let Some(from) = self.index(from_x, from_y) {
            let stack = &mut self.cells[from];
            if let Some(pos) = stack.iter().position(|&p| p == id) {
                stack.remove(pos);
            }
        }
        self.cells[to].push(id);

        if let Some(piece) = self.piece_mut(id) {
            piece.x = x;
            piece.y = y;
        }
        true
    }

    /// Pieces of `kind` that are 4-adjacent to `id`, in by-type order
    pub fn get_bordering_pieces(&self, id: PieceId, kind: PieceType) -> Vec<PieceId> {
        let Some(piece) = self.piece(id) else {
            return Vec::new();
        };
        self.pieces_of(kind)
            .iter()
            .copied()
            .filter(|&other| {
                self.piece(other)
                    .is_some_and(|p| p.distance_squared(piece) == 1)
            })
            .collect()
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Check whether a piece is still on the board
    pub fn contains(&self, id: PieceId) -> bool {
        self.piece(id).is_some()
    }

    /// All live pieces of a type, in creation order
    pub fn pieces_of(&self, kind: PieceType) -> &[PieceId] {
        &self.by_type[kind.index() as usize]
    }

    /// The stack at (x, y); empty when out of bounds
    pub fn pieces_at(&self, x: i32, y: i32) -> &[PieceId] {
        match self.index(x, y) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    pub fn contains_type_at(&self, x: i32, y: i32, kind: PieceType) -> bool {
        self.pieces_at(x, y)
            .iter()
            .any(|&id| self.piece(id).is_some_and(|p| p.kind == kind))
    }

    /// Iterate over every live piece in id order
    pub fn live_pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter_map(Option::as_ref)
    }

    /// Number of live pieces
    pub fn piece_count(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }

    pub fn set_killed(&mut self, id: PieceId, killed: bool) {
        if let Some(piece) = self.piece_mut(id) {
            piece.killed = killed;
        }
    }

    /// Drop a piece from its cluster; a cluster left without members is dissolved
    pub fn leave_cluster(&mut self, id: PieceId) {
        self.detach(id);
    }

    /// Forget the pre-move position once its animation is over
    pub fn settle_piece(&mut self, id: PieceId) {
        if let Some(piece) = self.piece_mut(id) {
            piece.old_x = piece.x;
            piece.old_y = piece.y;
        }
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Cluster of a piece, if any
    pub fn cluster_of(&self, id: PieceId) -> Option<&Cluster> {
        self.piece(id)
            .and_then(|p| p.cluster)
            .and_then(|c| self.cluster(c))
    }

    /// Iterate over every live cluster in id order
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter_map(Option::as_ref)
    }

    /// Check whether two pieces share a cluster
    pub fn same_cluster(&self, a: PieceId, b: PieceId) -> bool {
        match (
            self.piece(a).and_then(Piece::cluster),
            self.piece(b).and_then(Piece::cluster),
        ) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        }
    }

    /// Materialize `members` as a new cluster.
    ///
    /// Members leave whatever cluster they belonged to; a cluster left without members is
    /// dissolved. Returns None for an empty or dead member list.
    pub fn form_cluster(&mut self, members: Vec<PieceId>) -> Option<ClusterId> {
        let kind = self.piece(*members.first()?)?.kind;
        debug_assert!(members
            .iter()
            .all(|&m| self.piece(m).is_some_and(|p| p.kind == kind)));

        let cid = ClusterId(self.clusters.len() as u32);
        for &member in &members {
            self.detach(member);
            if let Some(piece) = self.piece_mut(member) {
                piece.cluster = Some(cid);
            }
        }
        self.clusters.push(Some(Cluster {
            id: cid,
            kind,
            pieces: members,
        }));

        Some(cid)
    }

    /// Remove a piece from its cluster's member list
    fn detach(&mut self, id: PieceId) {
        let Some(old) = self.piece_mut(id).and_then(|p| p.cluster.take()) else {
            return;
        };
        let emptied = match self.clusters.get_mut(old.0 as usize) {
            Some(Some(cluster)) => {
                cluster.pieces.retain(|&m| m != id);
                cluster.pieces.is_empty()
            }
            _ => false,
        };
        if emptied {
            self.clusters[old.0 as usize] = None;
        }
    }
}
