//! Board snapshots - an owned, serializable view for renderers and the CLI

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::types::PieceType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceView {
    pub id: u32,
    pub kind: PieceType,
    pub x: i32,
    pub y: i32,
    pub cluster: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterView {
    pub id: u32,
    pub kind: PieceType,
    pub pieces: Vec<u32>,
}

/// Everything needed to draw one board state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    /// One glyph per cell, showing the top of each stack
    pub rows: Vec<String>,
    pub pieces: Vec<PieceView>,
    pub clusters: Vec<ClusterView>,
}

impl BoardSnapshot {
    pub fn capture(board: &Board) -> Self {
        let pieces = board
            .live_pieces()
            .map(|p| PieceView {
                id: p.id().0,
                kind: p.kind(),
                x: p.x(),
                y: p.y(),
                cluster: p.cluster().map(|c| c.0),
            })
            .collect();
        let clusters = board
            .clusters()
            .map(|c| ClusterView {
                id: c.id().0,
                kind: c.kind(),
                pieces: c.pieces().iter().map(|p| p.0).collect(),
            })
            .collect();

        Self {
            width: board.width(),
            height: board.height(),
            rows: render_rows(board),
            pieces,
            clusters,
        }
    }

    pub fn to_text(&self) -> String {
        self.rows.join("\n")
    }
}

/// Glyph rows, top to bottom. Empty cells show as floor.
pub fn render_rows(board: &Board) -> Vec<String> {
    (0..board.height() as i32)
        .map(|y| {
            (0..board.width() as i32)
                .map(|x| {
                    board
                        .pieces_at(x, y)
                        .last()
                        .and_then(|&id| board.piece(id))
                        .map_or(PieceType::Floor.glyph(), |p| p.kind().glyph())
                })
                .collect()
        })
        .collect()
}
