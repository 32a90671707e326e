//! Tetromino catalog
//!
//! The 7 standard pieces, each defined once as a square boolean matrix
//! paired with a color. Consumers get the matrix by value, so every
//! working copy is independent of the catalog.

/// Largest tile count of any catalog shape (the I piece)
pub const MAX_TILES: usize = 4;

/// Color identifiers, one per piece type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorId {
    LightBlue,
    Blue,
    Orange,
    Yellow,
    Green,
    Purple,
    Red,
}

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl TetrominoType {
    /// Get the color for this tetromino
    pub fn color(&self) -> ColorId {
        match self {
            TetrominoType::I => ColorId::LightBlue,
            TetrominoType::J => ColorId::Blue,
            TetrominoType::L => ColorId::Orange,
            TetrominoType::O => ColorId::Yellow,
            TetrominoType::S => ColorId::Green,
            TetrominoType::T => ColorId::Purple,
            TetrominoType::Z => ColorId::Red,
        }
    }

    /// Get all tetromino types for bag randomization
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::J,
            TetrominoType::L,
            TetrominoType::O,
            TetrominoType::S,
            TetrominoType::T,
            TetrominoType::Z,
        ]
    }

    /// Get the spawn matrix for this tetromino
    pub fn matrix(&self) -> Matrix {
        match self {
            TetrominoType::I => Matrix::from_rows(&[
                &[0, 0, 0, 0],
                &[1, 1, 1, 1],
                &[0, 0, 0, 0],
                &[0, 0, 0, 0],
            ]),
            TetrominoType::J => Matrix::from_rows(&[
                &[1, 0, 0],
                &[1, 1, 1],
                &[0, 0, 0],
            ]),
            TetrominoType::L => Matrix::from_rows(&[
                &[0, 0, 1],
                &[1, 1, 1],
                &[0, 0, 0],
            ]),
            TetrominoType::O => Matrix::from_rows(&[
                &[1, 1],
                &[1, 1],
            ]),
            TetrominoType::S => Matrix::from_rows(&[
                &[0, 1, 1],
                &[1, 1, 0],
                &[0, 0, 0],
            ]),
            TetrominoType::T => Matrix::from_rows(&[
                &[0, 1, 0],
                &[1, 1, 1],
                &[0, 0, 0],
            ]),
            TetrominoType::Z => Matrix::from_rows(&[
                &[1, 1, 0],
                &[0, 1, 1],
                &[0, 0, 0],
            ]),
        }
    }
}

/// Square boolean matrix of a piece, stored inline so copies never alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    size: usize,
    cells: [[bool; MAX_TILES]; MAX_TILES],
}

impl Matrix {
    /// Build a matrix from 0/1 rows. Rows must form a square no larger than `MAX_TILES`.
    fn from_rows(rows: &[&[u8]]) -> Self {
        let size = rows.len();
        assert!(size <= MAX_TILES, "shape larger than {MAX_TILES} tiles");
        let mut cells = [[false; MAX_TILES]; MAX_TILES];
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "shape rows must form a square");
            for (c, &value) in row.iter().enumerate() {
                cells[r][c] = value != 0;
            }
        }
        Self { size, cells }
    }

    /// Side length (tile count)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the cell at (row, col) is filled; out of range reads as empty
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.cells[row][col]
    }

    /// Rotate 90° clockwise
    pub fn rotated_cw(&self) -> Self {
        let n = self.size;
        let mut cells = [[false; MAX_TILES]; MAX_TILES];
        for (r, row) in cells.iter_mut().enumerate().take(n) {
            for (c, cell) in row.iter_mut().enumerate().take(n) {
                *cell = self.cells[n - 1 - c][r];
            }
        }
        Self { size: n, cells }
    }

    /// Rotate 90° counter-clockwise
    pub fn rotated_ccw(&self) -> Self {
        let n = self.size;
        let mut cells = [[false; MAX_TILES]; MAX_TILES];
        for (r, row) in cells.iter_mut().enumerate().take(n) {
            for (c, cell) in row.iter_mut().enumerate().take(n) {
                *cell = self.cells[c][n - 1 - r];
            }
        }
        Self { size: n, cells }
    }

    /// Iterate the (row, col) offsets of every filled cell, row-major
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |r| {
            (0..self.size)
                .filter(move |&c| self.cells[r][c])
                .map(move |c| (r, c))
        })
    }

    /// Whether a row holds any filled cell
    pub fn row_has_tiles(&self, row: usize) -> bool {
        row < self.size && self.cells[row][..self.size].iter().any(|&cell| cell)
    }

    /// Index of the first row holding a filled cell
    pub fn first_filled_row(&self) -> Option<usize> {
        (0..self.size).find(|&r| self.row_has_tiles(r))
    }

    /// Number of rows holding a filled cell
    pub fn filled_row_count(&self) -> usize {
        (0..self.size).filter(|&r| self.row_has_tiles(r)).count()
    }

    /// The rows that hold filled cells, cropped to the matrix width, for previews
    pub fn preview_rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.cells[..self.size]
            .iter()
            .filter(|row| row[..self.size].iter().any(|&cell| cell))
            .map(|row| &row[..self.size])
    }
}
