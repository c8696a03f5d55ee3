use minesweeper_common::models::{
    AdjacencyLabel, CellStatus, CellView, Coord, GamePhase, LossReason,
};
use rand::Rng;
use tracing::{debug, info};

use crate::{GameError, Result, grid::Grid, minefield::Minefield, reveal::reveal_region};

/// Result of a reveal request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The cell was already open or is protected by a flag
    NoChange,
    /// Safe cells were opened and the round continues
    Revealed { cells: Vec<Coord> },
    /// The last safe cells were opened; `mines` were uncovered for display
    Won { cells: Vec<Coord>, mines: Vec<Coord> },
    /// A mine was hit; every mine was uncovered
    HitMine { mines: Vec<Coord> },
}

impl RevealOutcome {
    pub fn has_update(&self) -> bool {
        !matches!(self, RevealOutcome::NoChange)
    }
}

/// Result of a flag or mark toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed(CellStatus),
}

/// Mutable per-cell state of one round plus its win/loss state machine.
#[derive(Clone, Debug)]
pub struct BoardState {
    grid: Grid,
    mine_count: usize,
    minefield: Option<Minefield>,
    cells: Vec<CellStatus>,
    revealed: usize,
    phase: GamePhase,
    loss_reason: Option<LossReason>,
}

impl BoardState {
    pub fn new(rows: usize, columns: usize, mine_count: usize) -> Result<Self> {
        let grid = Grid::new(rows, columns)?;
        if mine_count == 0 || mine_count >= grid.len() {
            return Err(GameError::InvalidConfiguration(format!(
                "mine count must be between 1 and {}, got {mine_count}",
                grid.len() - 1
            )));
        }

        Ok(Self {
            grid,
            mine_count,
            minefield: None,
            cells: vec![CellStatus::Hidden; grid.len()],
            revealed: 0,
            phase: GamePhase::Pending,
            loss_reason: None,
        })
    }

    /// A board with a fixed layout. The first reveal skips generation.
    pub fn with_minefield(minefield: Minefield) -> Result<Self> {
        let grid = minefield.grid();
        let mut board = Self::new(grid.rows(), grid.columns(), minefield.mine_count())?;
        board.minefield = Some(minefield);
        Ok(board)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.loss_reason
    }

    pub fn minefield(&self) -> Option<&Minefield> {
        self.minefield.as_ref()
    }

    pub fn status(&self, coord: Coord) -> Result<CellStatus> {
        let coord = self.grid.validate(coord)?;
        Ok(self.cells[self.grid.index(coord)])
    }

    /// Label of an opened cell; hidden, flagged and marked cells read blank.
    pub fn label(&self, coord: Coord) -> Result<AdjacencyLabel> {
        let coord = self.grid.validate(coord)?;

        Ok(match (self.cells[self.grid.index(coord)], &self.minefield) {
            (CellStatus::Revealed, Some(field)) if field.is_mine(coord) => AdjacencyLabel::Mine,
            (CellStatus::Revealed, Some(field)) => match field.adjacent(coord) {
                0 => AdjacencyLabel::Blank,
                count => AdjacencyLabel::Number(count),
            },
            _ => AdjacencyLabel::Blank,
        })
    }

    /// Mine count minus placed flags. Negative when the player over-flags.
    pub fn remaining_flags(&self) -> isize {
        let flagged = self
            .cells
            .iter()
            .filter(|&&status| status == CellStatus::Flagged)
            .count();
        self.mine_count as isize - flagged as isize
    }

    pub fn has_won(&self) -> bool {
        self.grid.len() == self.mine_count + self.revealed
    }

    pub fn reveal(&mut self, coord: Coord) -> Result<RevealOutcome> {
        self.reveal_with_rng(coord, &mut rand::rng())
    }

    /// Opens `coord`, placing mines from `rng` first when the round is pending.
    pub fn reveal_with_rng<R: Rng + ?Sized>(
        &mut self,
        coord: Coord,
        rng: &mut R,
    ) -> Result<RevealOutcome> {
        let coord = self.grid.validate(coord)?;
        if self.phase.is_finished() {
            return Err(GameError::IllegalOperation("round already finished"));
        }

        if self.phase == GamePhase::Pending {
            if self.minefield.is_none() {
                self.minefield = Some(Minefield::generate(
                    self.grid,
                    self.mine_count,
                    coord,
                    rng,
                )?);
            }
            self.phase = GamePhase::InProgress;
            info!(
                "Round started on {}x{} board with {} mines",
                self.grid.rows(),
                self.grid.columns(),
                self.mine_count
            );
        }

        let Some(field) = self.minefield.as_ref() else {
            return Err(GameError::IllegalOperation("minefield missing"));
        };

        match self.cells[self.grid.index(coord)] {
            CellStatus::Revealed => {
                debug!("Ignoring reveal on open cell {}", coord);
                return Ok(RevealOutcome::NoChange);
            }
            CellStatus::Flagged => {
                debug!("Ignoring reveal on flagged cell {}", coord);
                return Ok(RevealOutcome::NoChange);
            }
            CellStatus::Hidden | CellStatus::Marked => {}
        }

        if field.is_mine(coord) {
            let mines = self.reveal_mines();
            self.phase = GamePhase::Lost;
            self.loss_reason = Some(LossReason::Mine);
            info!("Mine hit at {}, round lost", coord);
            return Ok(RevealOutcome::HitMine { mines });
        }

        let region = reveal_region(field, coord);
        let mut cells = Vec::with_capacity(region.len());
        for cell in region {
            let index = self.grid.index(cell);
            if self.cells[index] != CellStatus::Revealed {
                self.cells[index] = CellStatus::Revealed;
                self.revealed += 1;
                cells.push(cell);
            }
        }

        if self.has_won() {
            let mines = self.reveal_mines();
            self.phase = GamePhase::Won;
            info!("All safe cells revealed, round won");
            Ok(RevealOutcome::Won { cells, mines })
        } else {
            Ok(RevealOutcome::Revealed { cells })
        }
    }

    /// Hidden ↔ Flagged. Marked cells are left alone.
    pub fn toggle_flag(&mut self, coord: Coord) -> Result<MarkOutcome> {
        let index = self.editable_index(coord)?;

        let next = match self.cells[index] {
            CellStatus::Hidden => CellStatus::Flagged,
            CellStatus::Flagged => CellStatus::Hidden,
            CellStatus::Marked => return Ok(MarkOutcome::NoChange),
            CellStatus::Revealed => return Err(GameError::IllegalOperation("cell already open")),
        };
        self.cells[index] = next;
        debug!("Cell {} is now {:?}", coord, next);

        Ok(MarkOutcome::Changed(next))
    }

    /// Hidden ↔ Marked. Flagged cells are left alone.
    pub fn toggle_mark(&mut self, coord: Coord) -> Result<MarkOutcome> {
        let index = self.editable_index(coord)?;

        let next = match self.cells[index] {
            CellStatus::Hidden => CellStatus::Marked,
            CellStatus::Marked => CellStatus::Hidden,
            CellStatus::Flagged => return Ok(MarkOutcome::NoChange),
            CellStatus::Revealed => return Err(GameError::IllegalOperation("cell already open")),
        };
        self.cells[index] = next;
        debug!("Cell {} is now {:?}", coord, next);

        Ok(MarkOutcome::Changed(next))
    }

    /// Ends an in-progress round because its countdown ran out.
    pub fn expire(&mut self) -> Result<Vec<Coord>> {
        if !self.phase.is_in_progress() {
            return Err(GameError::IllegalOperation("round is not in progress"));
        }

        let mines = self.reveal_mines();
        self.phase = GamePhase::Lost;
        self.loss_reason = Some(LossReason::Timeout);
        info!("Time ran out, round lost");
        Ok(mines)
    }

    /// Rows of cell views for rendering.
    pub fn snapshot(&self) -> Vec<Vec<CellView>> {
        self.grid
            .coords()
            .map(|coord| self.view(coord))
            .collect::<Vec<_>>()
            .chunks(self.grid.columns())
            .map(|row| row.to_vec())
            .collect()
    }

    fn view(&self, coord: Coord) -> CellView {
        match (self.cells[self.grid.index(coord)], &self.minefield) {
            (CellStatus::Hidden, _) => CellView::Hidden,
            (CellStatus::Marked, _) => CellView::Marked,
            (CellStatus::Flagged, _) => CellView::Flagged,
            (CellStatus::Revealed, Some(field)) if field.is_mine(coord) => CellView::Mine,
            (CellStatus::Revealed, Some(field)) => CellView::Revealed {
                adjacent: field.adjacent(coord),
            },
            (CellStatus::Revealed, None) => CellView::Hidden,
        }
    }

    fn editable_index(&self, coord: Coord) -> Result<usize> {
        let coord = self.grid.validate(coord)?;
        match self.phase {
            GamePhase::InProgress => Ok(self.grid.index(coord)),
            GamePhase::Pending => Err(GameError::IllegalOperation("round has not started")),
            GamePhase::Won | GamePhase::Lost => {
                Err(GameError::IllegalOperation("round already finished"))
            }
        }
    }

    /// Opens every mine cell and returns their coordinates.
    fn reveal_mines(&mut self) -> Vec<Coord> {
        let Some(field) = self.minefield.as_ref() else {
            return Vec::new();
        };

        let mines: Vec<Coord> = field.mines().collect();
        for &mine in &mines {
            self.cells[self.grid.index(mine)] = CellStatus::Revealed;
        }
        mines
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn preset(rows: usize, columns: usize, mines: &[(usize, usize)]) -> BoardState {
        let grid = Grid::new(rows, columns).unwrap();
        let mines: Vec<Coord> = mines.iter().copied().map(Coord::from).collect();
        BoardState::with_minefield(Minefield::from_mines(grid, &mines).unwrap()).unwrap()
    }

    fn count(board: &BoardState, status: CellStatus) -> usize {
        board
            .grid()
            .coords()
            .filter(|&coord| board.status(coord).unwrap() == status)
            .count()
    }

    #[test]
    fn new_board_is_pending_and_hidden() {
        let board = BoardState::new(8, 8, 10).unwrap();

        assert_eq!(board.phase(), GamePhase::Pending);
        assert!(board.minefield().is_none());
        assert_eq!(count(&board, CellStatus::Hidden), 64);
        assert_eq!(board.remaining_flags(), 10);
    }

    #[test]
    fn rejects_mine_counts_that_fill_the_board() {
        assert!(matches!(
            BoardState::new(4, 4, 16),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BoardState::new(4, 4, 0),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn first_reveal_generates_and_starts() {
        let mut board = BoardState::new(9, 9, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let start = Coord::new(4, 4);

        let outcome = board.reveal_with_rng(start, &mut rng).unwrap();

        assert!(outcome.has_update());
        assert!(matches!(
            board.phase(),
            GamePhase::InProgress | GamePhase::Won
        ));
        let field = board.minefield().unwrap();
        assert_eq!(field.mine_count(), 10);
        assert!(!field.is_mine(start));
        assert_eq!(board.status(start).unwrap(), CellStatus::Revealed);
        // the start cell is a zero, so its orthogonal neighbors open too
        for neighbor in board.grid().orthogonal_neighbors(start) {
            assert_eq!(board.status(neighbor).unwrap(), CellStatus::Revealed);
        }
    }

    #[test]
    fn insufficient_space_leaves_board_pending() {
        let mut board = BoardState::new(4, 4, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let result = board.reveal_with_rng(Coord::new(1, 1), &mut rng);

        assert_eq!(
            result,
            Err(GameError::InsufficientSpace {
                mines: 10,
                available: 7
            })
        );
        assert_eq!(board.phase(), GamePhase::Pending);
        assert!(board.minefield().is_none());
        assert_eq!(count(&board, CellStatus::Hidden), 16);
    }

    #[test]
    fn single_flood_fill_wins_four_by_four() {
        let mut board = preset(4, 4, &[(3, 3)]);

        let outcome = board.reveal(Coord::new(0, 0)).unwrap();

        let RevealOutcome::Won { cells, mines } = outcome else {
            panic!("expected a win, got {outcome:?}");
        };
        assert_eq!(cells.len(), 15);
        assert_eq!(mines, vec![Coord::new(3, 3)]);
        assert_eq!(board.phase(), GamePhase::Won);
        assert_eq!(board.status(Coord::new(3, 3)).unwrap(), CellStatus::Revealed);
        assert_eq!(board.label(Coord::new(3, 3)).unwrap(), AdjacencyLabel::Mine);
        assert_eq!(board.label(Coord::new(2, 2)).unwrap(), AdjacencyLabel::Number(1));
        assert_eq!(board.label(Coord::new(0, 0)).unwrap(), AdjacencyLabel::Blank);
    }

    #[test]
    fn hitting_a_mine_loses_and_shows_all_mines() {
        let mut board = preset(5, 5, &[(0, 0), (4, 4)]);
        board.reveal(Coord::new(0, 1)).unwrap();
        board.toggle_flag(Coord::new(4, 4)).unwrap();

        let outcome = board.reveal(Coord::new(0, 0)).unwrap();

        assert_eq!(
            outcome,
            RevealOutcome::HitMine {
                mines: vec![Coord::new(0, 0), Coord::new(4, 4)]
            }
        );
        assert_eq!(board.phase(), GamePhase::Lost);
        assert_eq!(board.loss_reason(), Some(LossReason::Mine));
        assert_eq!(board.status(Coord::new(4, 4)).unwrap(), CellStatus::Revealed);
    }

    #[test]
    fn flagged_cell_is_protected_from_reveal() {
        let mut board = preset(4, 4, &[(0, 0)]);
        board.reveal(Coord::new(0, 1)).unwrap();
        board.toggle_flag(Coord::new(0, 0)).unwrap();

        let outcome = board.reveal(Coord::new(0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::NoChange);
        assert_eq!(board.phase(), GamePhase::InProgress);
        assert_eq!(board.status(Coord::new(0, 0)).unwrap(), CellStatus::Flagged);
    }

    #[test]
    fn marked_cell_can_still_be_revealed() {
        let mut board = preset(4, 4, &[(0, 0)]);
        board.reveal(Coord::new(0, 1)).unwrap();
        board.toggle_mark(Coord::new(1, 1)).unwrap();

        let outcome = board.reveal(Coord::new(1, 1)).unwrap();

        assert_eq!(
            outcome,
            RevealOutcome::Revealed {
                cells: vec![Coord::new(1, 1)]
            }
        );
    }

    #[test]
    fn reveal_twice_changes_nothing() {
        let mut board = preset(4, 5, &[(0, 2), (1, 2), (2, 2), (3, 2)]);
        board.reveal(Coord::new(0, 0)).unwrap();
        let before = board.snapshot();

        assert_eq!(board.reveal(Coord::new(0, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.reveal(Coord::new(1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.phase(), GamePhase::InProgress);
    }

    #[test]
    fn win_ignores_flag_placement() {
        let mines = [
            (0, 0),
            (0, 7),
            (7, 0),
            (7, 7),
            (3, 3),
            (3, 4),
            (4, 3),
            (4, 4),
            (0, 3),
            (7, 4),
        ];
        let mut board = preset(8, 8, &mines);
        board.reveal(Coord::new(1, 1)).unwrap();
        // one mine flagged, nine left bare
        board.toggle_flag(Coord::new(0, 0)).unwrap();

        let safe: Vec<Coord> = board
            .grid()
            .coords()
            .filter(|&coord| !mines.contains(&(coord.row, coord.col)))
            .collect();
        assert_eq!(safe.len(), 54);
        for coord in safe {
            if board.phase() == GamePhase::InProgress {
                board.reveal(coord).unwrap();
            }
        }

        assert_eq!(board.phase(), GamePhase::Won);
        assert_eq!(count(&board, CellStatus::Revealed), 64);
    }

    #[test]
    fn flag_toggle_twice_restores_state() {
        let mut board = preset(4, 4, &[(3, 3)]);
        board.reveal(Coord::new(3, 2)).unwrap();
        let target = Coord::new(0, 0);

        assert_eq!(
            board.toggle_flag(target).unwrap(),
            MarkOutcome::Changed(CellStatus::Flagged)
        );
        assert_eq!(board.remaining_flags(), 0);
        assert_eq!(
            board.toggle_flag(target).unwrap(),
            MarkOutcome::Changed(CellStatus::Hidden)
        );
        assert_eq!(board.remaining_flags(), 1);
        assert_eq!(board.status(target).unwrap(), CellStatus::Hidden);
    }

    #[test]
    fn flags_and_marks_are_mutually_exclusive() {
        let mut board = preset(4, 4, &[(3, 3)]);
        board.reveal(Coord::new(3, 2)).unwrap();
        let target = Coord::new(0, 0);

        board.toggle_mark(target).unwrap();
        assert_eq!(board.toggle_flag(target).unwrap(), MarkOutcome::NoChange);
        assert_eq!(board.status(target).unwrap(), CellStatus::Marked);

        board.toggle_mark(target).unwrap();
        board.toggle_flag(target).unwrap();
        assert_eq!(board.toggle_mark(target).unwrap(), MarkOutcome::NoChange);
        assert_eq!(board.status(target).unwrap(), CellStatus::Flagged);
    }

    #[test]
    fn over_flagging_goes_negative() {
        let mut board = preset(4, 4, &[(3, 3)]);
        board.reveal(Coord::new(3, 2)).unwrap();

        board.toggle_flag(Coord::new(0, 0)).unwrap();
        board.toggle_flag(Coord::new(0, 1)).unwrap();

        assert_eq!(board.remaining_flags(), -1);
    }

    #[test]
    fn flag_and_mark_rejected_outside_progress() {
        let mut board = preset(4, 4, &[(3, 3)]);

        assert!(matches!(
            board.toggle_flag(Coord::new(0, 0)),
            Err(GameError::IllegalOperation(_))
        ));

        board.reveal(Coord::new(3, 2)).unwrap();
        assert!(matches!(
            board.toggle_mark(Coord::new(3, 2)),
            Err(GameError::IllegalOperation(_))
        ));

        board.reveal(Coord::new(3, 3)).unwrap();
        assert!(matches!(
            board.toggle_flag(Coord::new(0, 0)),
            Err(GameError::IllegalOperation(_))
        ));
        assert!(matches!(
            board.reveal(Coord::new(0, 0)),
            Err(GameError::IllegalOperation(_))
        ));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut board = preset(4, 4, &[(3, 3)]);

        assert_eq!(
            board.reveal(Coord::new(4, 0)),
            Err(GameError::OutOfBounds(Coord::new(4, 0)))
        );
        assert_eq!(board.phase(), GamePhase::Pending);
    }

    #[test]
    fn flood_fill_clears_flags_inside_region() {
        let mut board = preset(5, 5, &[(4, 4)]);
        board.reveal(Coord::new(3, 4)).unwrap();
        board.toggle_flag(Coord::new(0, 0)).unwrap();
        assert_eq!(board.remaining_flags(), 0);

        board.reveal(Coord::new(0, 4)).unwrap();

        assert_eq!(board.status(Coord::new(0, 0)).unwrap(), CellStatus::Revealed);
        assert_eq!(board.remaining_flags(), 1);
        assert_eq!(board.phase(), GamePhase::Won);
    }

    #[test]
    fn expire_only_from_progress() {
        let mut board = preset(4, 4, &[(3, 3)]);
        assert!(board.expire().is_err());

        board.reveal(Coord::new(3, 2)).unwrap();
        let mines = board.expire().unwrap();

        assert_eq!(mines, vec![Coord::new(3, 3)]);
        assert_eq!(board.phase(), GamePhase::Lost);
        assert_eq!(board.loss_reason(), Some(LossReason::Timeout));
        assert!(board.expire().is_err());
    }

    #[test]
    fn snapshot_shapes_rows() {
        let mut board = preset(4, 6, &[(0, 0)]);
        board.reveal(Coord::new(0, 1)).unwrap();
        board.toggle_flag(Coord::new(0, 0)).unwrap();

        let snapshot = board.snapshot();

        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.iter().all(|row| row.len() == 6));
        assert_eq!(snapshot[0][0], CellView::Flagged);
        assert_eq!(snapshot[0][1], CellView::Revealed { adjacent: 1 });
        assert_eq!(snapshot[3][5], CellView::Hidden);
    }
}
