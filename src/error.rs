use minesweeper_common::models::Coord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot place {mines} mines outside the safe zone, only {available} cells available")]
    InsufficientSpace { mines: usize, available: usize },

    #[error("Illegal operation: {0}")]
    IllegalOperation(&'static str),

    #[error("Coordinates {0} are outside the board")]
    OutOfBounds(Coord),
}

pub type Result<T> = std::result::Result<T, GameError>;
