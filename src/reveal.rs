//! Flood fill computing which cells open when a safe cell is revealed.
//!
//! A click on a numbered cell opens only that cell. A click on a zero cell
//! opens its zero terrain, the maximal region of zero cells reachable through
//! orthogonal steps, plus the numbered cells bordering that terrain.

use std::collections::VecDeque;

use minesweeper_common::models::Coord;

use crate::{
    grid::{Grid, ORTHOGONAL_OFFSETS},
    minefield::Minefield,
};

/// Every coordinate to reveal when `start` is opened, `start` first.
///
/// `start` must be in bounds and must not be a mine.
pub(crate) fn reveal_region(field: &Minefield, start: Coord) -> Vec<Coord> {
    if field.adjacent(start) != 0 {
        return vec![start];
    }

    let grid = field.grid();
    let mut terrain = vec![false; grid.len()];
    let mut cells = zero_terrain(field, start, &mut terrain);
    cells.extend(numbered_boundary(field, &terrain));
    cells
}

/// Breadth-first walk over orthogonal zero neighbors of `start`.
///
/// Marks every visited cell in `terrain` and returns them in visiting order.
pub(crate) fn zero_terrain(field: &Minefield, start: Coord, terrain: &mut [bool]) -> Vec<Coord> {
    let grid = field.grid();
    let mut order = vec![start];
    let mut queue = VecDeque::from([start]);
    terrain[grid.index(start)] = true;

    while let Some(current) = queue.pop_front() {
        for neighbor in grid.orthogonal_neighbors(current) {
            let index = grid.index(neighbor);
            if terrain[index] || field.is_mine(neighbor) || field.adjacent(neighbor) != 0 {
                continue;
            }

            terrain[index] = true;
            order.push(neighbor);
            queue.push_back(neighbor);
        }
    }

    order
}

/// Numbered cells bordering the terrain, in row-major order.
///
/// A cell qualifies when it is outside the terrain, is not a mine, touches the
/// terrain in any of the 8 directions, is not enclosed by terrain on all four
/// orthogonal sides, and has an adjacency count between 1 and 8.
pub(crate) fn numbered_boundary(field: &Minefield, terrain: &[bool]) -> Vec<Coord> {
    let grid = field.grid();

    grid.coords()
        .filter(|&coord| !terrain[grid.index(coord)] && !field.is_mine(coord))
        .filter(|&coord| {
            grid.neighbors(coord)
                .any(|neighbor| terrain[grid.index(neighbor)])
        })
        .filter(|&coord| has_open_side(&grid, terrain, coord))
        .filter(|&coord| (1..=8).contains(&field.adjacent(coord)))
        .collect()
}

/// Whether any orthogonal step from `coord` leaves the terrain. Stepping off
/// the board counts as leaving it.
fn has_open_side(grid: &Grid, terrain: &[bool], coord: Coord) -> bool {
    ORTHOGONAL_OFFSETS
        .into_iter()
        .any(|delta| match grid.offset(coord, delta) {
            Some(side) => !terrain[grid.index(side)],
            None => true,
        })
}
