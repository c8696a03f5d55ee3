use minesweeper_engine::{
    CellView, Coord, Game, GameError, GameEvent, GamePhase, RoundParams, config::params_from_env,
};
use rand::Rng;
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // MINESWEEPER_ROWS, _COLUMNS, _MINES and _TIME_LIMIT override the defaults
    let params = params_from_env().unwrap_or_else(|e| {
        eprintln!("Invalid environment ({e}), using a 9x9 board");
        RoundParams {
            rows: 9,
            columns: 9,
            mines: 10,
            time_limit_secs: 30,
        }
    });

    let mut game = Game::new(params)?;
    let mut event_receiver = game.subscribe_to_events();

    // Spawn background task to print events
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match &event {
                GameEvent::RoundInitialized { rows, columns, mines, .. } => {
                    println!("🎮 New round: {}x{} with {} mines", rows, columns, mines);
                }
                GameEvent::CellsRevealed { cells } => {
                    println!("📋 {} cells revealed", cells.len());
                }
                GameEvent::CellChanged { coord, status } => {
                    println!("🚩 {} is now {:?}", coord, status);
                }
                GameEvent::TimeTick { seconds_left } => {
                    println!("⏱  {}s left", seconds_left);
                }
                GameEvent::RoundWon => println!("🎉 Won!"),
                GameEvent::RoundLost { reason } => println!("💣 Lost: {:?}", reason),
            }
            if event.is_terminal() {
                break;
            }
        }
    });

    println!("Round {} ({}s limit)", game.id(), params.time_limit_secs);

    let mut rng = rand::rng();
    while !game.phase().is_finished() {
        tokio::select! {
            _ = game.poll_timer() => {}
            _ = sleep(Duration::from_millis(300)) => {
                let coord = Coord::new(
                    rng.random_range(0..params.rows),
                    rng.random_range(0..params.columns),
                );
                match game.reveal(coord).await {
                    Ok(outcome) if outcome.has_update() => {
                        println!("Revealed {}", coord);
                        display_board(&game.snapshot());
                    }
                    Ok(_) | Err(GameError::IllegalOperation(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    println!(
        "\nFinal phase: {:?}, {} flags left, {}s left",
        game.phase(),
        game.remaining_flags(),
        game.remaining_seconds()
    );
    if game.phase() == GamePhase::Lost {
        display_board(&game.snapshot());
    }

    game.close().await;

    // The printer stops by itself after the round's final event
    event_handler.await?;

    Ok(())
}

fn display_board(board: &[Vec<CellView>]) {
    for (row_index, row) in board.iter().enumerate() {
        print!("  ");
        for cell in row {
            let symbol = match cell {
                CellView::Hidden => "·".to_string(),
                CellView::Marked => "?".to_string(),
                CellView::Flagged => "F".to_string(),
                CellView::Revealed { adjacent: 0 } => " ".to_string(),
                CellView::Revealed { adjacent } => adjacent.to_string(),
                CellView::Mine => "*".to_string(),
            };
            print!("{:>2}", symbol);
        }
        println!("  {}", row_index);
    }
}
