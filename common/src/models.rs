use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest accepted board side.
pub const MIN_BOARD_SIZE: usize = 4;
/// Exclusive upper bound for a board side.
pub const MAX_BOARD_SIZE: usize = 30;
/// Exclusive upper bound for a round's time limit in seconds.
pub const MAX_TIME_LIMIT_SECS: u32 = 1000;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Player-visible status of a single cell.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    #[default]
    Hidden,
    Revealed,
    Flagged,
    Marked,
}

/// What a renderer should draw for a cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum CellView {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "marked")]
    Marked,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "mine")]
    Mine,
}

/// Text shown inside a cell: blank, a count from 1 to 8, or a mine.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyLabel {
    Blank,
    Number(u8),
    Mine,
}

impl fmt::Display for AdjacencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjacencyLabel::Blank => Ok(()),
            AdjacencyLabel::Number(count) => write!(f, "{count}"),
            AdjacencyLabel::Mine => f.write_str("mine"),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Pending,
    InProgress,
    Won,
    Lost,
}

impl GamePhase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Why a round was lost.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LossReason {
    Mine,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoundParams {
    pub rows: usize,
    pub columns: usize,
    pub mines: usize,
    /// Zero disables the countdown.
    pub time_limit_secs: u32,
}

impl Default for RoundParams {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 8,
            mines: 10,
            time_limit_secs: 0,
        }
    }
}

impl RoundParams {
    pub const fn total_cells(&self) -> usize {
        self.rows * self.columns
    }

    pub const fn has_time_limit(&self) -> bool {
        self.time_limit_secs > 0
    }
}
