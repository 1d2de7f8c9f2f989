//! Level codec - whole boards as a single mixed-radix integer
//!
//! A level is `width * height` palette indices. The cells are folded into one
//! arbitrary-precision integer, highest cell first:
//!
//! ```text
//! acc = 0
//! for y in (0..height).rev():
//!     for x in (0..width).rev():
//!         acc = acc * cardinality + cell(x, y)
//! ```
//!
//! so cell `(0, 0)` ends up as the least-significant digit. The level code is
//! `hex2(width) + hex2(height) + hex(acc)`, lowercase, with no padding on the payload.
//!
//! The 2x1 board `[FLOOR, DUCK]` is `2 * 7 + 1 = 15`, i.e. `"0201f"`.

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;
use tracing::warn;

use crate::board::Board;
use crate::types::{PieceType, LEVEL_CARDINALITY};

/// Reasons a level code or grid is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelCodeError {
    #[error("level code too short: need at least 4 hex digits, got {0}")]
    TooShort(usize),
    #[error("invalid character {ch:?} at offset {offset} in level code")]
    InvalidDigit { offset: usize, ch: char },
    #[error("level dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u8, height: u8 },
    #[error("level code has no board payload")]
    MissingPayload,
    #[error("level payload does not fit a {width}x{height} board")]
    Overflow { width: u8, height: u8 },
    #[error("cell ({x}, {y}) holds {value}, outside a palette of {cardinality}")]
    ValueOutOfRange {
        x: usize,
        y: usize,
        value: u8,
        cardinality: u8,
    },
    #[error("grid of {width}x{height} needs {expected} cells, got {actual}")]
    CellCount {
        width: u8,
        height: u8,
        expected: usize,
        actual: usize,
    },
    #[error("palette cardinality must be in 2..={max}, got {0}", max = LEVEL_CARDINALITY)]
    InvalidCardinality(u8),
}

/// A level as plain palette indices, row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelGrid {
    width: u8,
    height: u8,
    cells: Vec<u8>,
}

impl LevelGrid {
    /// A grid filled with FLOOR
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![PieceType::Floor.index(); width as usize * height as usize],
        }
    }

    /// Wrap row-major cells; the length must be `width * height`
    pub fn from_cells(width: u8, height: u8, cells: Vec<u8>) -> Result<Self, LevelCodeError> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(LevelCodeError::CellCount {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Project a board back to palette indices.
    ///
    /// Each cell takes the type of the bottom piece of its stack (the one loaded with the
    /// level); empty cells become FLOOR. Stacked pieces above it are not representable.
    pub fn from_board(board: &Board) -> Self {
        let mut grid = LevelGrid::new(board.width(), board.height());
        for y in 0..board.height() as i32 {
            for x in 0..board.width() as i32 {
                let kind = board
                    .pieces_at(x, y)
                    .first()
                    .and_then(|&id| board.piece(id))
                    .map_or(PieceType::Floor, |p| p.kind());
                grid.set(x, y, kind.index());
            }
        }
        grid
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Rows of glyphs, top to bottom; unknown indices render as `?`
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(|&v| PieceType::from_index(v).map_or('?', |t| t.glyph()))
                    .collect()
            })
            .collect()
    }
}

/// Mixed-radix encoder/decoder for a fixed palette size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCodec {
    cardinality: u8,
}

impl Default for LevelCodec {
    fn default() -> Self {
        Self {
            cardinality: LEVEL_CARDINALITY,
        }
    }
}

impl LevelCodec {
    pub fn new(cardinality: u8) -> Result<Self, LevelCodeError> {
        if !(2..=LEVEL_CARDINALITY).contains(&cardinality) {
            return Err(LevelCodeError::InvalidCardinality(cardinality));
        }
        Ok(Self { cardinality })
    }

    pub fn cardinality(&self) -> u8 {
        self.cardinality
    }

    /// Fold a grid into its accumulator.
    ///
    /// Cell `(0, 0)` is the least-significant base-`cardinality` digit and the row-major
    /// cell order is exactly little-endian digit order, which is what the
    /// highest-cell-first multiply-add produces.
    pub fn encode_value(&self, grid: &LevelGrid) -> Result<BigUint, LevelCodeError> {
        let width = grid.width.max(1) as usize;
        if let Some(pos) = grid.cells.iter().position(|&v| v >= self.cardinality) {
            return Err(LevelCodeError::ValueOutOfRange {
                x: pos % width,
                y: pos / width,
                value: grid.cells[pos],
                cardinality: self.cardinality,
            });
        }
        if grid.cells.is_empty() {
            return Ok(BigUint::zero());
        }

        BigUint::from_radix_le(&grid.cells, self.cardinality as u32).ok_or(
            LevelCodeError::InvalidCardinality(self.cardinality),
        )
    }

    /// Serialize a grid to a level code
    pub fn encode(&self, grid: &LevelGrid) -> Result<String, LevelCodeError> {
        if grid.width == 0 || grid.height == 0 {
            return Err(LevelCodeError::ZeroDimension {
                width: grid.width,
                height: grid.height,
            });
        }
        let value = self.encode_value(grid)?;
        Ok(format!(
            "{:02x}{:02x}{}",
            grid.width,
            grid.height,
            value.to_str_radix(16)
        ))
    }

    /// Unfold an accumulator into a `width * height` grid
    pub fn decode_value(
        &self,
        value: &BigUint,
        width: u8,
        height: u8,
    ) -> Result<LevelGrid, LevelCodeError> {
        if width == 0 || height == 0 {
            return Err(LevelCodeError::ZeroDimension { width, height });
        }
        let count = width as usize * height as usize;

        // `to_radix_le` yields the digits consumed by repeated `% cardinality`,
        // least significant first, with no trailing zeros (except for zero itself).
        let mut cells = value.to_radix_le(self.cardinality as u32);
        if cells.len() > count {
            return Err(LevelCodeError::Overflow { width, height });
        }
        cells.resize(count, 0);

        LevelGrid::from_cells(width, height, cells)
    }

    /// Parse a level code. Nothing is allocated for a board until the code is valid.
    pub fn decode(&self, code: &str) -> Result<LevelGrid, LevelCodeError> {
        let result = self.decode_inner(code.trim());
        if let Err(err) = &result {
            warn!(code, error = %err, "rejected level code");
        }
        result
    }

    fn decode_inner(&self, code: &str) -> Result<LevelGrid, LevelCodeError> {
        if let Some((offset, ch)) = code.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(LevelCodeError::InvalidDigit { offset, ch });
        }
        // All ASCII from here on, so byte slicing is safe.
        if code.len() < 4 {
            return Err(LevelCodeError::TooShort(code.len()));
        }

        let width = u8::from_str_radix(&code[0..2], 16)
            .map_err(|_| LevelCodeError::InvalidDigit { offset: 0, ch: '?' })?;
        let height = u8::from_str_radix(&code[2..4], 16)
            .map_err(|_| LevelCodeError::InvalidDigit { offset: 2, ch: '?' })?;
        if width == 0 || height == 0 {
            return Err(LevelCodeError::ZeroDimension { width, height });
        }

        let payload = &code[4..];
        if payload.is_empty() {
            return Err(LevelCodeError::MissingPayload);
        }
        let value = BigUint::parse_bytes(payload.as_bytes(), 16)
            .ok_or(LevelCodeError::InvalidDigit { offset: 4, ch: '?' })?;

        self.decode_value(&value, width, height)
    }
}

/// Encode with the default 7-entry palette
pub fn encode_level(grid: &LevelGrid) -> Result<String, LevelCodeError> {
    LevelCodec::default().encode(grid)
}

/// Decode with the default 7-entry palette
pub fn decode_level(code: &str) -> Result<LevelGrid, LevelCodeError> {
    LevelCodec::default().decode(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Reference implementation of the multiply-add fold
    fn fold(grid: &LevelGrid, cardinality: u32) -> BigUint {
        let mut acc = BigUint::zero();
        for y in (0..grid.height() as i32).rev() {
            for x in (0..grid.width() as i32).rev() {
                acc = acc * cardinality + grid.get(x, y).unwrap() as u32;
            }
        }
        acc
    }

    #[test]
    fn test_two_cell_example() {
        let grid = LevelGrid::from_cells(2, 1, vec![1, 2]).unwrap();
        assert_eq!(LevelCodec::default().encode_value(&grid).unwrap(), BigUint::from(15u32));
        assert_eq!(encode_level(&grid).unwrap(), "0201f");
        assert_eq!(decode_level("0201f").unwrap(), grid);
    }

    #[test]
    fn test_radix_matches_multiply_add() {
        let cells: Vec<u8> = (0..35).map(|i| (i * 5 % 7) as u8).collect();
        let grid = LevelGrid::from_cells(7, 5, cells).unwrap();
        assert_eq!(LevelCodec::default().encode_value(&grid).unwrap(), fold(&grid, 7));

        let codec = LevelCodec::new(6).unwrap();
        let cells: Vec<u8> = (0..12).map(|i| (i % 6) as u8).collect();
        let grid = LevelGrid::from_cells(4, 3, cells).unwrap();
        assert_eq!(codec.encode_value(&grid).unwrap(), fold(&grid, 6));
    }

    #[test]
    fn test_all_void_board_has_zero_payload() {
        let grid = LevelGrid::from_cells(3, 2, vec![0; 6]).unwrap();
        assert_eq!(encode_level(&grid).unwrap(), "03020");
        assert_eq!(decode_level("03020").unwrap(), grid);
    }

    #[test]
    fn test_uppercase_is_accepted() {
        assert_eq!(decode_level("0201F").unwrap(), decode_level("0201f").unwrap());
    }

    #[test]
    fn test_rejections() {
        assert_eq!(decode_level("020"), Err(LevelCodeError::TooShort(3)));
        assert_eq!(
            decode_level("02g1f"),
            Err(LevelCodeError::InvalidDigit { offset: 2, ch: 'g' })
        );
        assert_eq!(
            decode_level("0001f"),
            Err(LevelCodeError::ZeroDimension { width: 0, height: 1 })
        );
        assert_eq!(decode_level("0201"), Err(LevelCodeError::MissingPayload));
        // 7^2 = 49 = 0x31 needs three digits on a two-cell board.
        assert_eq!(
            decode_level("020131"),
            Err(LevelCodeError::Overflow { width: 2, height: 1 })
        );
        assert!(matches!(
            decode_level("02_1f"),
            Err(LevelCodeError::InvalidDigit { offset: 2, .. })
        ));
    }

    #[test]
    fn test_encode_rejects_out_of_palette() {
        let grid = LevelGrid::from_cells(2, 2, vec![1, 1, 1, 9]).unwrap();
        assert_eq!(
            encode_level(&grid),
            Err(LevelCodeError::ValueOutOfRange {
                x: 1,
                y: 1,
                value: 9,
                cardinality: 7
            })
        );
    }

    #[test]
    fn test_cardinality_bounds() {
        assert!(LevelCodec::new(1).is_err());
        assert!(LevelCodec::new(8).is_err());
        assert_eq!(LevelCodec::new(7).unwrap(), LevelCodec::default());
    }

    #[test]
    fn test_grid_from_cells_checks_length() {
        assert!(matches!(
            LevelGrid::from_cells(2, 2, vec![1; 3]),
            Err(LevelCodeError::CellCount { expected: 4, actual: 3, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_value_matches_fold_and_inverts(
            cardinality in 2u8..=7,
            (w, h) in (1u8..6, 1u8..6),
            raw in prop::collection::vec(any::<u8>(), 25),
        ) {
            let count = w as usize * h as usize;
            let cells = raw[..count].iter().map(|v| v % cardinality).collect();
            let grid = LevelGrid::from_cells(w, h, cells).unwrap();
            let codec = LevelCodec::new(cardinality).unwrap();

            let value = codec.encode_value(&grid).unwrap();
            prop_assert_eq!(&value, &fold(&grid, cardinality as u32));
            prop_assert_eq!(codec.decode_value(&value, w, h).unwrap(), grid);
        }
    }
}
