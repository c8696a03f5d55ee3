use minesweeper_common::models::Coord;

use crate::{GameError, Result};

/// King-move offsets, row-major starting at the upper left.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Rook-move offsets: up, right, down, left.
pub(crate) const ORTHOGONAL_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Rectangular index space of a board. Cells are stored row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(GameError::InvalidConfiguration(format!(
                "board must have at least one row and one column, got {rows}x{columns}"
            )));
        }

        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub(crate) fn len(&self) -> usize {
        self.rows * self.columns
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.columns
    }

    pub fn validate(&self, coord: Coord) -> Result<Coord> {
        if self.in_bounds(coord) {
            Ok(coord)
        } else {
            Err(GameError::OutOfBounds(coord))
        }
    }

    /// Position of `coord` in row-major storage. Caller guarantees bounds.
    pub(crate) fn index(&self, coord: Coord) -> usize {
        coord.row * self.columns + coord.col
    }

    pub(crate) fn coord_at(&self, index: usize) -> Coord {
        Coord::new(index / self.columns, index % self.columns)
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let columns = self.columns;
        (0..self.len()).map(move |index| Coord::new(index / columns, index % columns))
    }

    /// Applies `delta` to `coord`, returning a value only when it stays on the board.
    pub(crate) fn offset(&self, coord: Coord, (dr, dc): (isize, isize)) -> Option<Coord> {
        let row = coord.row.checked_add_signed(dr)?;
        let col = coord.col.checked_add_signed(dc)?;
        let next = Coord::new(row, col);
        self.in_bounds(next).then_some(next)
    }

    /// The up to 8 cells sharing an edge or a corner with `coord`.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + use<> {
        let grid = *self;
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |delta| grid.offset(coord, delta))
    }

    /// The up to 4 cells sharing an edge with `coord`.
    pub fn orthogonal_neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + use<> {
        let grid = *self;
        ORTHOGONAL_OFFSETS
            .into_iter()
            .filter_map(move |delta| grid.offset(coord, delta))
    }
}
