//! Outline tracing - boundary polygons of the solid region
//!
//! Every solid cell contributes a unit edge for each side that faces a non-solid
//! neighbour (or the board edge). Edges run clockwise in screen space, with the solid
//! area on the right-hand side:
//!
//! ```text
//!   (x,y) ---up---> (x+1,y)
//!     ^                |
//!   left             right
//!     |                v
//!  (x,y+1) <--down- (x+1,y+1)
//! ```
//!
//! Two emitted sides of the same cell that meet at a convex corner are linked. Walks start
//! at link targets (corner vertices) and chain edges until they come back round to their
//! first edge; straight runs of unlinked edges collapse into one segment. A walk that had
//! to start mid-run (no corner left to start from) folds its first and last segments
//! together, so every emitted vertex is a turn.
//!
//! Solid loops come out with positive signed area, holes with negative.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;
use crate::types::{Direction, PieceType};

/// Which cells count as solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellRule {
    /// At least one piece other than VOID
    #[default]
    Occupied,
    /// Any cell without a VOID piece, bare floor included
    NonVoid,
}

impl CellRule {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "occupied" => Some(CellRule::Occupied),
            "nonvoid" | "non-void" => Some(CellRule::NonVoid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellRule::Occupied => "occupied",
            CellRule::NonVoid => "nonvoid",
        }
    }

    /// Out-of-board cells are never solid
    pub fn is_solid(&self, board: &Board, x: i32, y: i32) -> bool {
        if !board.in_bounds(x, y) {
            return false;
        }
        match self {
            CellRule::Occupied => board
                .pieces_at(x, y)
                .iter()
                .any(|&id| board.piece(id).is_some_and(|p| p.kind() != PieceType::Void)),
            CellRule::NonVoid => !board.contains_type_at(x, y, PieceType::Void),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
    #[error("outline walk stranded at ({x}, {y})")]
    DanglingEdge { x: i32, y: i32 },
}

/// A screen-space point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A closed polyline in grid units; the first point is repeated at the end
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// Number of distinct vertices
    pub fn vertex_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    /// Shoelace area in cells. Clockwise (solid) loops are positive in y-down coordinates.
    pub fn signed_area(&self) -> i64 {
        let twice: i64 = self
            .points
            .windows(2)
            .map(|w| {
                let (x0, y0) = (w[0].0 as i64, w[0].1 as i64);
                let (x1, y1) = (w[1].0 as i64, w[1].1 as i64);
                x0 * y1 - x1 * y0
            })
            .sum();
        twice / 2
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    start: (i32, i32),
    end: (i32, i32),
    dir: Direction,
    next: Option<usize>,
}

/// Trace every boundary loop of the solid region
pub fn trace(board: &Board, rule: CellRule) -> Result<Vec<Contour>, OutlineError> {
    let (w, h) = (board.width() as i32, board.height() as i32);
    let corner = |(x, y): (i32, i32)| (y * (w + 1) + x) as usize;

    let mut edges: Vec<Edge> = Vec::new();
    let mut starting_at: Vec<ArrayVec<usize, 4>> = vec![ArrayVec::new(); ((w + 1) * (h + 1)) as usize];
    let mut link_targets: Vec<usize> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !rule.is_solid(board, x, y) {
                continue;
            }
            // Sides in walking order: left, up, right, down.
            let sides = [
                (x - 1, y, (x, y + 1), (x, y), Direction::Up),
                (x, y - 1, (x, y), (x + 1, y), Direction::Right),
                (x + 1, y, (x + 1, y), (x + 1, y + 1), Direction::Down),
                (x, y + 1, (x + 1, y + 1), (x, y + 1), Direction::Left),
            ];
            let mut emitted: [Option<usize>; 4] = [None; 4];
            for (slot, &(nx, ny, start, end, dir)) in sides.iter().enumerate() {
                if rule.is_solid(board, nx, ny) {
                    continue;
                }
                let idx = edges.len();
                edges.push(Edge {
                    start,
                    end,
                    dir,
                    next: None,
                });
                starting_at[corner(start)].push(idx);
                emitted[slot] = Some(idx);
            }
            for slot in 0..4 {
                if let (Some(a), Some(b)) = (emitted[slot], emitted[(slot + 1) % 4]) {
                    edges[a].next = Some(b);
                    link_targets.push(b);
                }
            }
        }
    }

    let mut used = vec![false; edges.len()];
    let mut contours = Vec::new();
    let order: Vec<usize> = link_targets.into_iter().chain(0..edges.len()).collect();

    for first in order {
        if used[first] {
            continue;
        }
        let mut points = vec![edges[first].start];
        let mut current = first;

        loop {
            used[current] = true;
            // Collapse a straight run of unlinked edges.
            while edges[current].next.is_none() {
                let outgoing = &starting_at[corner(edges[current].end)];
                match outgoing.as_slice() {
                    [only] if edges[*only].dir == edges[current].dir && !used[*only] => {
                        current = *only;
                        used[current] = true;
                    }
                    _ => break,
                }
            }

            let end = edges[current].end;
            points.push(end);

            let following = match edges[current].next {
                Some(next) => Some(next),
                None => match starting_at[corner(end)].as_slice() {
                    [only] => Some(*only),
                    _ => None,
                },
            };
            // A loop may pass its origin twice at a diagonal pinch; it only closes on
            // its first edge.
            match following {
                Some(next) if next == first => {
                    // Started mid-run: the origin is not a corner.
                    if edges[current].dir == edges[first].dir {
                        points.pop();
                        points.remove(0);
                        points.push(points[0]);
                    }
                    break;
                }
                Some(next) if !used[next] => current = next,
                _ => return Err(OutlineError::DanglingEdge { x: end.0, y: end.1 }),
            }
        }
        contours.push(Contour { points });
    }

    Ok(contours)
}

/// Screen placement of the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlineLayout {
    pub cell_size: f64,
    pub left: f64,
    pub top: f64,
}

impl OutlineLayout {
    /// Largest square cells that fit the viewport, board centred
    pub fn fit(width: u8, height: u8, view_width: f64, view_height: f64) -> Self {
        let (w, h) = (width.max(1) as f64, height.max(1) as f64);
        let cell_size = (view_width / w).min(view_height / h);
        Self {
            cell_size,
            left: 0.5 * (view_width - w * cell_size),
            top: 0.5 * (view_height - h * cell_size),
        }
    }

    pub fn to_screen(&self, (x, y): (i32, i32)) -> Point {
        Point {
            x: self.left + x as f64 * self.cell_size,
            y: self.top + y as f64 * self.cell_size,
        }
    }
}

/// Traced contours plus their screen-space polylines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub layout: OutlineLayout,
    contours: Vec<Contour>,
    polylines: Vec<Vec<Point>>,
}

impl Outline {
    pub fn build(board: &Board, rule: CellRule, layout: OutlineLayout) -> Result<Self, OutlineError> {
        let contours = trace(board, rule)?;
        let polylines = contours
            .iter()
            .map(|c| c.points().iter().map(|&p| layout.to_screen(p)).collect())
            .collect();
        Ok(Self {
            layout,
            contours,
            polylines,
        })
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn polylines(&self) -> &[Vec<Point>] {
        &self.polylines
    }

    /// Sum of signed areas; equals the number of solid cells
    pub fn total_area(&self) -> i64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rows: &[&str]) -> Board {
        let mut board = Board::new(rows[0].len() as u8, rows.len() as u8);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == 'B' {
                    board.create_piece(PieceType::Box, x as i32, y as i32);
                }
            }
        }
        board
    }

    #[test]
    fn test_single_cell_is_unit_square() {
        let contours = trace(&solid(&["B"]), CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points(), &[(0, 0), (1, 0), (1, 1), (0, 1), (0, 0)]);
        assert_eq!(contours[0].signed_area(), 1);
    }

    #[test]
    fn test_straight_runs_collapse() {
        let contours = trace(&solid(&["BBB", "BBB"]), CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].vertex_count(), 4);
        assert_eq!(contours[0].points(), &[(0, 0), (3, 0), (3, 2), (0, 2), (0, 0)]);
        assert_eq!(contours[0].signed_area(), 6);
    }

    #[test]
    fn test_ring_has_negative_hole() {
        let contours = trace(&solid(&["BBB", "B.B", "BBB"]), CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 2);
        let mut areas: Vec<i64> = contours.iter().map(Contour::signed_area).collect();
        areas.sort();
        assert_eq!(areas, vec![-1, 9]);
    }

    #[test]
    fn test_l_shape_has_six_vertices() {
        let contours = trace(&solid(&["B.", "BB"]), CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].vertex_count(), 6);
        assert_eq!(contours[0].signed_area(), 3);
        assert!(contours[0].is_closed());
    }

    #[test]
    fn test_hole_pinched_at_a_corner_is_one_loop() {
        let board = solid(&["BBBBBB", "B.BB.B", "BB..BB", "BBBBBB"]);
        let contours = trace(&board, CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(Contour::is_closed));
        let hole = contours.iter().find(|c| c.signed_area() < 0).unwrap();
        assert_eq!(hole.signed_area(), -4);
        // Passes through both pinch corners twice.
        assert_eq!(hole.points().iter().filter(|&&p| p == (2, 2)).count(), 3);
        assert_eq!(hole.points().iter().filter(|&&p| p == (4, 2)).count(), 2);
    }

    #[test]
    fn test_hole_started_mid_run_has_only_corners() {
        let contours = trace(&solid(&["BBBB", "B..B", "BBBB"]), CellRule::Occupied).unwrap();
        assert_eq!(contours.len(), 2);
        let hole = contours.iter().find(|c| c.signed_area() < 0).unwrap();
        assert_eq!(hole.points(), &[(1, 1), (1, 2), (3, 2), (3, 1), (1, 1)]);
        assert_eq!(hole.vertex_count(), 4);
        assert_eq!(hole.signed_area(), -2);
    }

    #[test]
    fn test_void_and_floor_rules() {
        let mut board = Board::new(2, 1);
        board.create_piece(PieceType::Void, 0, 0);
        // Bare floor at (1, 0).
        assert!(trace(&board, CellRule::Occupied).unwrap().is_empty());

        let contours = trace(&board, CellRule::NonVoid).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].signed_area(), 1);
    }

    #[test]
    fn test_layout_fit_centres_board() {
        let layout = OutlineLayout::fit(12, 5, 960.0, 540.0);
        assert_eq!(layout.cell_size, 80.0);
        assert_eq!(layout.left, 0.0);
        assert_eq!(layout.top, 70.0);

        let outline = Outline::build(&solid(&["B"]), CellRule::Occupied, layout).unwrap();
        assert_eq!(outline.polylines()[0][2], Point { x: 80.0, y: 150.0 });
        assert_eq!(outline.total_area(), 1);
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!(CellRule::from_str("NonVoid"), Some(CellRule::NonVoid));
        assert_eq!(CellRule::from_str("occupied"), Some(CellRule::Occupied));
        assert_eq!(CellRule::from_str("any"), None);
        assert_eq!(CellRule::default(), CellRule::Occupied);
    }
}
