//! Outline tests - contour shapes, orientation, and area

use duck_castle::core::{decode_level, trace, Board, CellRule, Outline, OutlineLayout, Point};
use duck_castle::engine::DEFAULT_LEVEL;
use duck_castle::types::PieceType;

fn boxes(rows: &[&str]) -> Board {
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
fn test_empty_board_has_no_contours() {
    assert!(trace(&Board::new(4, 4), CellRule::Occupied).unwrap().is_empty());
}

#[test]
fn test_diagonal_cells_make_two_touching_loops() {
    let contours = trace(&boxes(&["B.", ".B"]), CellRule::Occupied).unwrap();
    assert_eq!(contours.len(), 2);
    assert_eq!(contours[0].points(), &[(0, 0), (1, 0), (1, 1), (0, 1), (0, 0)]);
    assert_eq!(contours[1].points(), &[(1, 1), (2, 1), (2, 2), (1, 2), (1, 1)]);
    assert!(contours.iter().all(|c| c.signed_area() == 1));
}

#[test]
fn test_hole_runs_counter_clockwise() {
    let contours = trace(&boxes(&["BBB", "B.B", "BBB"]), CellRule::Occupied).unwrap();
    assert_eq!(contours.len(), 2);
    assert_eq!(contours[0].points(), &[(0, 0), (3, 0), (3, 3), (0, 3), (0, 0)]);
    assert_eq!(contours[1].points(), &[(2, 1), (1, 1), (1, 2), (2, 2), (2, 1)]);
    assert_eq!(contours[1].signed_area(), -1);
}

#[test]
fn test_castle_outline_under_nonvoid_rule() {
    let board = Board::load(&decode_level(DEFAULT_LEVEL).unwrap());
    let contours = trace(&board, CellRule::NonVoid).unwrap();

    assert_eq!(contours.len(), 1);
    assert_eq!(
        contours[0].points(),
        &[
            (1, 1),
            (5, 1),
            (5, 2),
            (7, 2),
            (7, 1),
            (11, 1),
            (11, 4),
            (7, 4),
            (7, 3),
            (5, 3),
            (5, 4),
            (1, 4),
            (1, 1),
        ]
    );
    assert_eq!(contours[0].signed_area(), 26);
}

#[test]
fn test_castle_outline_under_occupied_rule() {
    let board = Board::load(&decode_level(DEFAULT_LEVEL).unwrap());
    let contours = trace(&board, CellRule::Occupied).unwrap();

    // Duckling, duck, and the pair of goals.
    let areas: Vec<i64> = contours.iter().map(|c| c.signed_area()).collect();
    assert_eq!(areas, vec![1, 1, 2]);
}

#[test]
fn test_every_contour_is_closed_and_areas_sum_to_solid_cells() {
    let rows = ["BB.BB", "B..B.", "BBBB.", "..B.B", "B.BBB"];
    let board = boxes(&rows);
    let solid = rows.iter().flat_map(|r| r.chars()).filter(|&c| c == 'B').count() as i64;

    let contours = trace(&board, CellRule::Occupied).unwrap();
    assert!(contours.iter().all(|c| c.is_closed()));
    assert_eq!(contours.iter().map(|c| c.signed_area()).sum::<i64>(), solid);
}

#[test]
fn test_screen_space_polylines() {
    let board = boxes(&["BB"]);
    let layout = OutlineLayout {
        cell_size: 10.0,
        left: 5.0,
        top: 7.0,
    };
    let outline = Outline::build(&board, CellRule::Occupied, layout).unwrap();

    assert_eq!(outline.polylines().len(), 1);
    assert_eq!(
        outline.polylines()[0],
        vec![
            Point { x: 5.0, y: 7.0 },
            Point { x: 25.0, y: 7.0 },
            Point { x: 25.0, y: 17.0 },
            Point { x: 5.0, y: 17.0 },
            Point { x: 5.0, y: 7.0 },
        ]
    );
    assert_eq!(outline.total_area(), 2);
}
