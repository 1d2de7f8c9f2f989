//! Property tests for the rule core and the level loop.
//!
//! Invariants covered:
//! - Level codes round-trip for every grid the palette can express.
//! - Move planning is deterministic, lists each piece once, and commits atomically.
//! - Clusters stay an exact partition into connected components through random play.
//! - The last duck is never lost.
//! - Outline contours are closed, turn at every vertex, and their signed areas add up to
//!   the solid cells.

use std::collections::HashSet;

use proptest::prelude::*;

use duck_castle::core::{
    apply_plan, build_clusters, cascade_move, check_partition, decode_level, encode_level, trace,
    Board, CellRule, LevelGrid, RuleSet,
};
use duck_castle::engine::{Level, LevelConfig};
use duck_castle::types::{Direction, GameAction, PieceType};

/// A grid with dimensions in `1..=max` and cells in `0..7`
fn grid_strategy(max: u8) -> impl Strategy<Value = LevelGrid> {
    (1..=max, 1..=max).prop_flat_map(|(w, h)| {
        prop::collection::vec(0u8..7, w as usize * h as usize)
            .prop_map(move |cells| LevelGrid::from_cells(w, h, cells).unwrap())
    })
}

/// Like `grid_strategy`, but mostly floor so pieces have room to move
fn playable_grid(max: u8) -> impl Strategy<Value = LevelGrid> {
    (2..=max, 2..=max).prop_flat_map(|(w, h)| {
        prop::collection::vec(0u8..14, w as usize * h as usize).prop_map(move |raw| {
            let cells = raw.into_iter().map(|v| if v >= 7 { 1 } else { v }).collect();
            LevelGrid::from_cells(w, h, cells).unwrap()
        })
    })
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

fn clustered_board(grid: &LevelGrid, rules: &RuleSet) -> Board {
    let mut board = Board::load(grid);
    for kind in rules.clustered.iter() {
        build_clusters(&mut board, kind);
    }
    board
}

/// No vertex of a closed loop lies on a straight line between its neighbours
fn every_vertex_turns(points: &[(i32, i32)]) -> bool {
    let n = points.len() - 1;
    (0..n).all(|i| {
        let (px, py) = points[(i + n - 1) % n];
        let (cx, cy) = points[i];
        let (nx, ny) = points[i + 1];
        (cx - px) * (ny - cy) - (cy - py) * (nx - cx) != 0
    })
}

proptest! {
    #[test]
    fn level_codes_round_trip(grid in grid_strategy(12)) {
        let code = encode_level(&grid).unwrap();
        prop_assert_eq!(decode_level(&code).unwrap(), grid);
    }

    #[test]
    fn move_plans_are_deterministic_and_atomic(
        grid in playable_grid(7),
        pick in any::<prop::sample::Index>(),
        direction in direction_strategy(),
        loose in any::<bool>(),
    ) {
        let rules = if loose { RuleSet::loose() } else { RuleSet::classic() };
        let mut board = clustered_board(&grid, &rules);
        let ids: Vec<_> = board.live_pieces().map(|p| p.id()).collect();
        prop_assume!(!ids.is_empty());
        let piece = ids[pick.index(ids.len())];
        let (dx, dy) = direction.delta();

        let plan = cascade_move(&board, &rules, piece, dx, dy);
        prop_assert_eq!(&plan, &cascade_move(&board, &rules, piece, dx, dy));
        let Some(plan) = plan else {
            return Ok(());
        };

        let unique: HashSet<_> = plan.pieces().collect();
        prop_assert_eq!(unique.len(), plan.len());
        prop_assert!(plan.contains(piece));

        let before: Vec<_> = ids.iter().map(|&id| (id, board.piece(id).unwrap().position())).collect();
        apply_plan(&mut board, &rules, &plan);
        for (id, (x, y)) in before {
            let expected = if plan.contains(id) { (x + dx, y + dy) } else { (x, y) };
            prop_assert_eq!(board.piece(id).unwrap().position(), expected);
        }
    }

    #[test]
    fn random_play_keeps_clusters_partitioned(
        grid in playable_grid(8),
        moves in prop::collection::vec(direction_strategy(), 1..40),
    ) {
        let config = LevelConfig::default();
        let mut level = Level::from_grid(grid, &config);
        let had_ducks = !level.board().pieces_of(PieceType::Duck).is_empty();

        for direction in moves {
            if level.is_won() {
                break;
            }
            if level.apply_action(GameAction::Move(direction)) {
                level.run_until_interactive(1000);
            }

            for kind in config.rules.clustered.iter() {
                prop_assert!(check_partition(level.board(), kind).is_ok());
            }
            if had_ducks {
                prop_assert!(!level.board().pieces_of(PieceType::Duck).is_empty());
            }
        }
    }

    #[test]
    fn outline_contours_close_and_cover_the_solid_cells(
        grid in grid_strategy(10),
        nonvoid in any::<bool>(),
    ) {
        let rule = if nonvoid { CellRule::NonVoid } else { CellRule::Occupied };
        let board = Board::load(&grid);

        let solid = (0..board.height() as i32)
            .flat_map(|y| (0..board.width() as i32).map(move |x| (x, y)))
            .filter(|&(x, y)| rule.is_solid(&board, x, y))
            .count() as i64;

        let contours = trace(&board, rule).unwrap();
        prop_assert!(contours.iter().all(|c| c.is_closed()));
        prop_assert_eq!(contours.iter().map(|c| c.signed_area()).sum::<i64>(), solid);
        for contour in &contours {
            prop_assert!(every_vertex_turns(contour.points()));
        }
    }
}
