use serde::{Deserialize, Serialize};

use crate::models::{CellStatus, Coord, LossReason};

/// Events emitted by the engine for the presentation layer.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A fresh round was created or the board was reset
    #[serde(rename = "init")]
    RoundInitialized {
        rows: usize,
        columns: usize,
        mines: usize,
        time_limit_secs: u32,
    },
    /// Cells switched to revealed, including mines shown at round end
    #[serde(rename = "revealed")]
    CellsRevealed { cells: Vec<Coord> },
    /// A flag or question mark was placed or removed
    #[serde(rename = "changed")]
    CellChanged { coord: Coord, status: CellStatus },
    #[serde(rename = "won")]
    RoundWon,
    #[serde(rename = "lost")]
    RoundLost { reason: LossReason },
    #[serde(rename = "tick")]
    TimeTick { seconds_left: u32 },
}

impl GameEvent {
    /// Whether this event ends the round.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::RoundWon | GameEvent::RoundLost { .. })
    }
}
