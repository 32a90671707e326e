//! Playing field and collision detection

use crate::piece::{Piece, RotationDirection};
use crate::tetromino::ColorId;

/// Standard field dimensions
pub const FIELD_COLS: usize = 10;
pub const FIELD_ROWS: usize = 20;

/// A cell on the field - either empty or filled with a color.
///
/// Occupancy and color live in one value, so a cell is occupied exactly
/// when it carries a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorId),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn color(&self) -> Option<ColorId> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(*color),
        }
    }
}

pub type Row = [Cell; FIELD_COLS];

/// The grid of locked cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Grid stored as [row][col], row 0 is the top
    cells: [Row; FIELD_ROWS],
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Field {
    /// Create a new empty field
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; FIELD_COLS]; FIELD_ROWS],
        }
    }

    /// Empty every cell
    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// Get the cell at (row, col), or None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.cells
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .copied()
    }

    /// Set a cell. Panics when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        assert!(
            row < FIELD_ROWS && col < FIELD_COLS,
            "cell ({row}, {col}) outside the field"
        );
        self.cells[row][col] = cell;
    }

    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| cell.is_filled())
    }

    /// Whether `piece` would collide with the walls, the floor or locked
    /// cells if its matrix were at (`x`, `y`). Cells above the top row are
    /// allowed so pieces can enter from above.
    pub fn is_colliding(&self, piece: &Piece, x: i32, y: i32) -> bool {
        piece.matrix.filled().any(|(r, c)| {
            let col = x + c as i32;
            let row = y + r as i32;
            col < 0
                || col >= FIELD_COLS as i32
                || row >= FIELD_ROWS as i32
                || self.is_occupied(row, col)
        })
    }

    /// Whether `piece` collides at its own position
    pub fn collides(&self, piece: &Piece) -> bool {
        self.is_colliding(piece, piece.col, piece.row)
    }

    /// Lock a piece onto the field. Cells above the top row are dropped.
    pub fn place_block(&mut self, piece: &Piece) {
        let color = piece.color();
        for (row, col) in piece.cells() {
            if row < 0 {
                continue;
            }
            assert!(
                col >= 0 && (col as usize) < FIELD_COLS && (row as usize) < FIELD_ROWS,
                "locked piece cell ({row}, {col}) outside the field"
            );
            self.cells[row as usize][col as usize] = Cell::Filled(color);
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_filled(&self, row: usize) -> bool {
        self.cells[row].iter().all(|cell| cell.is_filled())
    }

    /// Indices of completely filled rows, top to bottom
    pub fn filled_rows(&self) -> Vec<usize> {
        (0..FIELD_ROWS).filter(|&row| self.is_row_filled(row)).collect()
    }

    /// Remove a row and insert an empty one at the top
    pub fn clear_row(&mut self, row: usize) {
        assert!(row < FIELD_ROWS, "row {row} outside the field");
        self.cells.copy_within(0..row, 1);
        self.cells[0] = [Cell::Empty; FIELD_COLS];
    }

    /// Loss condition: anything locked in the top row
    pub fn is_block_in_first_row(&self) -> bool {
        self.cells[0].iter().any(|cell| cell.is_filled())
    }

    /// Lowest row the piece can fall to from where it is now
    pub fn drop_row(&self, piece: &Piece) -> i32 {
        let mut row = piece.row;
        while !self.is_colliding(piece, piece.col, row + 1) {
            row += 1;
        }
        row
    }

    /// Rotate a copy of `piece`. If the rotated copy collides in place and
    /// its matrix hangs over a wall, try it shifted fully onto the field
    /// against that wall. Returns None when the rotation is rejected.
    pub fn try_rotated(&self, piece: &Piece, direction: RotationDirection) -> Option<Piece> {
        let mut rotated = piece.duplicate();
        rotated.rotate(direction);
        if !self.collides(&rotated) {
            return Some(rotated);
        }

        let right_wall = FIELD_COLS as i32 - rotated.tiles() as i32;
        let kick_col = if rotated.col < 0 {
            0
        } else if rotated.col > right_wall {
            right_wall
        } else {
            return None;
        };
        let kicked = rotated.at(kick_col, rotated.row);
        (!self.collides(&kicked)).then_some(kicked)
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.cells.iter().enumerate()
    }

    /// Iterate every cell as (row, col, cell)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.rows().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (row, col, *cell))
        })
    }

    /// Check if the field is completely empty
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, _, cell)| cell.is_empty())
    }
}
