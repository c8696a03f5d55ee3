//! Value types shared between the minesweeper engine and whatever renders it.

pub mod models;
pub mod protocol;
