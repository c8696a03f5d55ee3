use minesweeper_common::models::Coord;
use rand::{Rng, seq::index};
use tracing::debug;

use crate::{GameError, Result, grid::Grid};

/// Mine positions of a round together with the per-cell adjacency counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Minefield {
    grid: Grid,
    mines: Vec<bool>,
    adjacent: Vec<u8>,
    mine_count: usize,
}

impl Minefield {
    /// Draws `mine_count` mines uniformly from every cell except `safe` and its neighbors.
    pub fn generate<R: Rng + ?Sized>(
        grid: Grid,
        mine_count: usize,
        safe: Coord,
        rng: &mut R,
    ) -> Result<Self> {
        let safe = grid.validate(safe)?;

        let candidates: Vec<Coord> = grid
            .coords()
            .filter(|&coord| !in_safe_zone(coord, safe))
            .collect();

        if mine_count > candidates.len() {
            return Err(GameError::InsufficientSpace {
                mines: mine_count,
                available: candidates.len(),
            });
        }

        let mut mines = vec![false; grid.len()];
        for picked in index::sample(rng, candidates.len(), mine_count) {
            mines[grid.index(candidates[picked])] = true;
        }

        debug!(
            "Placed {} mines on {}x{} board avoiding {}",
            mine_count,
            grid.rows(),
            grid.columns(),
            safe
        );

        Ok(Self::from_mask(grid, mines))
    }

    /// Builds a minefield from explicit mine positions. Duplicates count once.
    pub fn from_mines(grid: Grid, coords: &[Coord]) -> Result<Self> {
        let mut mines = vec![false; grid.len()];
        for &coord in coords {
            let coord = grid.validate(coord)?;
            mines[grid.index(coord)] = true;
        }

        Ok(Self::from_mask(grid, mines))
    }

    fn from_mask(grid: Grid, mines: Vec<bool>) -> Self {
        let adjacent = grid
            .coords()
            .map(|coord| count_adjacent_mines(&grid, &mines, coord))
            .collect();
        let mine_count = mines.iter().filter(|&&mine| mine).count();

        Self {
            grid,
            mines,
            adjacent,
            mine_count,
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// Cells off the board hold no mine.
    pub fn is_mine(&self, coord: Coord) -> bool {
        self.grid.in_bounds(coord) && self.mines[self.grid.index(coord)]
    }

    /// Number of mines among the 8 neighbors of `coord`.
    pub(crate) fn adjacent(&self, coord: Coord) -> u8 {
        self.adjacent[self.grid.index(coord)]
    }

    pub fn mines(&self) -> impl Iterator<Item = Coord> + '_ {
        self.mines
            .iter()
            .enumerate()
            .filter(|&(_, &mine)| mine)
            .map(|(index, _)| self.grid.coord_at(index))
    }
}

fn in_safe_zone(coord: Coord, safe: Coord) -> bool {
    coord.row.abs_diff(safe.row) <= 1 && coord.col.abs_diff(safe.col) <= 1
}

fn count_adjacent_mines(grid: &Grid, mines: &[bool], coord: Coord) -> u8 {
    let count = grid
        .neighbors(coord)
        .filter(|&neighbor| mines[grid.index(neighbor)])
        .count();

    // at most 8 neighbors
    count as u8
}
