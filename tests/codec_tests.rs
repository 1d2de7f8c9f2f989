//! Level codec tests - known codes, rejections, and board projection

use duck_castle::core::{decode_level, encode_level, Board, LevelCodeError, LevelCodec, LevelGrid};
use duck_castle::engine::DEFAULT_LEVEL;
use duck_castle::types::PieceType;

#[test]
fn test_floor_duck_encodes_to_0201f() {
    let grid = LevelGrid::from_cells(2, 1, vec![PieceType::Floor.index(), PieceType::Duck.index()])
        .unwrap();
    assert_eq!(encode_level(&grid).unwrap(), "0201f");
}

#[test]
fn test_default_level_decodes_to_castle() {
    let grid = decode_level(DEFAULT_LEVEL).unwrap();
    assert_eq!((grid.width(), grid.height()), (12, 5));
    assert_eq!(
        grid.to_rows(),
        vec![
            "############",
            "#...o##....#",
            "#.@.....**.#",
            "#....##....#",
            "############",
        ]
    );
    assert_eq!(encode_level(&grid).unwrap(), DEFAULT_LEVEL);
}

#[test]
fn test_cell_zero_is_least_significant_digit() {
    // Only cell (0, 0) set: the payload is just that digit.
    let mut grid = LevelGrid::from_cells(3, 3, vec![0; 9]).unwrap();
    grid.set(0, 0, 6);
    assert_eq!(encode_level(&grid).unwrap(), "03036");

    // Only the last cell set: 2 * 7^8.
    let mut grid = LevelGrid::from_cells(3, 3, vec![0; 9]).unwrap();
    grid.set(2, 2, 2);
    let value = 2u64 * 7u64.pow(8);
    assert_eq!(encode_level(&grid).unwrap(), format!("0303{:x}", value));
}

#[test]
fn test_smaller_palette() {
    let codec = LevelCodec::new(2).unwrap();
    let grid = LevelGrid::from_cells(4, 1, vec![1, 0, 1, 1]).unwrap();
    // 0b1101
    assert_eq!(codec.encode(&grid).unwrap(), "0401d");
    assert_eq!(codec.decode("0401d").unwrap(), grid);
    assert!(matches!(
        codec.encode(&LevelGrid::from_cells(1, 1, vec![2]).unwrap()),
        Err(LevelCodeError::ValueOutOfRange { value: 2, .. })
    ));
}

#[test]
fn test_round_trip_at_largest_board() {
    let mut grid = LevelGrid::from_cells(255, 255, vec![0; 255 * 255]).unwrap();
    grid.set(0, 0, PieceType::Floor.index());
    grid.set(254, 254, PieceType::Cutter.index());

    let code = encode_level(&grid).unwrap();
    assert!(code.starts_with("ffff"));
    assert_eq!(decode_level(&code).unwrap(), grid);
}

#[test]
fn test_rejected_codes() {
    assert!(matches!(decode_level(""), Err(LevelCodeError::TooShort(0))));
    assert!(matches!(decode_level("02"), Err(LevelCodeError::TooShort(2))));
    assert!(matches!(decode_level("0x01f"), Err(LevelCodeError::InvalidDigit { offset: 1, .. })));
    assert!(matches!(decode_level("0200f"), Err(LevelCodeError::ZeroDimension { .. })));
    assert!(matches!(decode_level("0002f"), Err(LevelCodeError::ZeroDimension { .. })));
    assert!(matches!(decode_level("0101"), Err(LevelCodeError::MissingPayload)));
    assert!(matches!(decode_level("0101ff"), Err(LevelCodeError::Overflow { .. })));
}

#[test]
fn test_whitespace_is_trimmed() {
    assert_eq!(decode_level("  0201f\n").unwrap(), decode_level("0201f").unwrap());
}

#[test]
fn test_board_projection_round_trip() {
    let grid = decode_level(DEFAULT_LEVEL).unwrap();
    let board = Board::load(&grid);
    assert_eq!(LevelGrid::from_board(&board), grid);
}

#[test]
fn test_projection_keeps_bottom_of_stack() {
    let mut board = Board::new(2, 1);
    board.create_piece(PieceType::Goal, 1, 0);
    let duck = board.create_piece(PieceType::Duck, 0, 0).unwrap();
    board.put_piece(duck, 1, 0);

    let grid = LevelGrid::from_board(&board);
    assert_eq!(grid.cells(), &[PieceType::Floor.index(), PieceType::Goal.index()]);
}

#[test]
fn test_error_messages_are_readable() {
    let err = decode_level("zz01").unwrap_err();
    assert_eq!(err.to_string(), "invalid character 'z' at offset 0 in level code");
}
