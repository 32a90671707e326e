//! Active falling piece

use crate::field::FIELD_COLS;
use crate::tetromino::{ColorId, Matrix, TetrominoType};

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// A positioned, rotatable copy of a catalog shape.
///
/// `col`/`row` locate the matrix's top-left corner on the field. Row 0 is
/// the top of the field and rows increase downward; negative rows are
/// above the visible field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// The type of tetromino
    pub piece_type: TetrominoType,
    /// Current rotated matrix
    pub matrix: Matrix,
    pub col: i32,
    pub row: i32,
}

impl Piece {
    /// Create a new piece at its spawn position
    pub fn new(piece_type: TetrominoType) -> Self {
        let matrix = piece_type.matrix();
        let (col, row) = spawn_position(&matrix);
        Self {
            piece_type,
            matrix,
            col,
            row,
        }
    }

    pub fn color(&self) -> ColorId {
        self.piece_type.color()
    }

    /// Tile count of the square matrix
    pub fn tiles(&self) -> usize {
        self.matrix.size()
    }

    pub fn rotate_clockwise(&mut self) {
        self.matrix = self.matrix.rotated_cw();
    }

    pub fn rotate_counterclockwise(&mut self) {
        self.matrix = self.matrix.rotated_ccw();
    }

    pub fn rotate(&mut self, direction: RotationDirection) {
        match direction {
            RotationDirection::Clockwise => self.rotate_clockwise(),
            RotationDirection::CounterClockwise => self.rotate_counterclockwise(),
        }
    }

    /// Independent copy for trying a move or rotation before committing it
    pub fn duplicate(&self) -> Self {
        *self
    }

    /// Shift the piece. Collision must be checked by the caller.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.col += dx;
        self.row += dy;
    }

    /// Copy of this piece placed at another position
    pub fn at(&self, col: i32, row: i32) -> Self {
        Self { col, row, ..*self }
    }

    /// Absolute (row, col) of every filled cell
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.matrix
            .filled()
            .map(move |(r, c)| (self.row + r as i32, self.col + c as i32))
    }
}

/// Horizontally centered on the matrix width, vertically placed so the
/// lowest filled row sits one row above the field.
fn spawn_position(matrix: &Matrix) -> (i32, i32) {
    let tiles = matrix.size() as i32;
    let col = FIELD_COLS as i32 / 2 - tiles / 2;
    let first = matrix.first_filled_row().unwrap_or(0) as i32;
    let span = matrix.filled_row_count() as i32;
    (col, -(first + span))
}
