//! Minesweeper Board Engine
//!
//! This library runs single-player minesweeper rounds: lazy mine placement
//! around the first click, flood-fill reveals, flags and question marks, the
//! win/loss state machine, and an optional countdown running as a tokio task.
//!
//! ## Usage
//!
//! ### Round coordinator (Recommended)
//!
//! `Game` owns the board and its countdown and reports everything that
//! happens through an event channel:
//!
//! ```rust,no_run
//! use minesweeper_engine::{Coord, Game, GameEvent, RoundParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let params = RoundParams { rows: 9, columns: 9, mines: 10, time_limit_secs: 60 };
//!     let mut game = Game::new(params)?;
//!     let mut events = game.subscribe_to_events();
//!
//!     // The first reveal places the mines and starts the countdown
//!     game.reveal(Coord::new(4, 4)).await?;
//!     game.toggle_flag(Coord::new(0, 0))?;
//!
//!     while let Ok(event) = events.try_recv() {
//!         println!("{event:?}");
//!     }
//!
//!     // Ticks and the timeout arrive through `poll_timer`
//!     if let Some(signal) = game.poll_timer().await {
//!         println!("{signal:?}, {} flags left", game.remaining_flags());
//!     }
//!
//!     game.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ### Board only
//!
//! `BoardState` is the synchronous core without a countdown or events:
//!
//! ```rust
//! use minesweeper_engine::{BoardState, Coord, GamePhase};
//!
//! let mut board = BoardState::new(8, 8, 10).unwrap();
//! board.reveal(Coord::new(0, 0)).unwrap();
//! assert_ne!(board.phase(), GamePhase::Pending);
//! ```

mod board;
pub mod config;
mod error;
mod grid;
mod logic;
mod minefield;
mod reveal;
mod timer;

pub use board::{BoardState, MarkOutcome, RevealOutcome};
pub use error::{GameError, Result};
pub use grid::Grid;
pub use logic::Game;
pub use minefield::Minefield;
pub use timer::{CountdownTimer, TICK_PERIOD, TimerSignal};

// Re-export common types for convenience
pub use minesweeper_common::{models::*, protocol::*};
