use minesweeper_common::{
    models::{AdjacencyLabel, CellStatus, CellView, Coord, GamePhase, LossReason, RoundParams},
    protocol::GameEvent,
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    Result,
    board::{BoardState, MarkOutcome, RevealOutcome},
    config::validate_params,
    grid::Grid,
    minefield::Minefield,
    timer::{CountdownTimer, TimerSignal},
};

/// One player's round: the board, its optional countdown, and the event feed.
///
/// Every round gets a fresh id. Timer signals carrying an older id, or
/// arriving after the countdown was cancelled, are dropped.
pub struct Game {
    id: Uuid,
    params: RoundParams,
    board: BoardState,
    rng: StdRng,
    timer: Option<CountdownTimer>,
    frozen_seconds: u32,
    phase: watch::Sender<GamePhase>,
    signal_sender: mpsc::UnboundedSender<TimerSignal>,
    signal_receiver: mpsc::UnboundedReceiver<TimerSignal>,
    event_sender: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl Game {
    #[instrument(level = "trace")]
    pub fn new(params: RoundParams) -> Result<Self> {
        Self::build(params, StdRng::from_os_rng(), None)
    }

    /// A game whose mine placement is reproducible.
    pub fn with_seed(params: RoundParams, seed: u64) -> Result<Self> {
        Self::build(params, StdRng::seed_from_u64(seed), None)
    }

    /// A game on a preset layout; `params.mines` is replaced by the layout's count.
    pub fn with_layout(mut params: RoundParams, mines: &[Coord]) -> Result<Self> {
        let grid = Grid::new(params.rows, params.columns)?;
        let minefield = Minefield::from_mines(grid, mines)?;
        params.mines = minefield.mine_count();
        Self::build(params, StdRng::from_os_rng(), Some(minefield))
    }

    fn build(params: RoundParams, rng: StdRng, minefield: Option<Minefield>) -> Result<Self> {
        validate_params(&params)?;
        let board = match minefield {
            Some(minefield) => BoardState::with_minefield(minefield)?,
            None => BoardState::new(params.rows, params.columns, params.mines)?,
        };

        let (phase, _) = watch::channel(board.phase());
        let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        info!(
            "Created round {}: {}x{} with {} mines, {}s limit",
            id, params.rows, params.columns, params.mines, params.time_limit_secs
        );

        Ok(Self {
            id,
            params,
            board,
            rng,
            timer: None,
            frozen_seconds: params.time_limit_secs,
            phase,
            signal_sender,
            signal_receiver,
            event_sender: None,
        })
    }

    /// Subscribe to game events. Replaces any earlier subscriber.
    pub fn subscribe_to_events(&mut self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.event_sender = Some(sender);
        receiver
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> RoundParams {
        self.params
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn phase(&self) -> GamePhase {
        self.board.phase()
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.board.loss_reason()
    }

    pub fn cell_status(&self, coord: Coord) -> Result<CellStatus> {
        self.board.status(coord)
    }

    pub fn adjacency_label(&self, coord: Coord) -> Result<AdjacencyLabel> {
        self.board.label(coord)
    }

    pub fn remaining_flags(&self) -> isize {
        self.board.remaining_flags()
    }

    /// Live countdown value, or the value it stopped at.
    pub fn remaining_seconds(&self) -> u32 {
        match &self.timer {
            Some(timer) => timer.remaining(),
            None => self.frozen_seconds,
        }
    }

    pub fn has_running_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    pub fn snapshot(&self) -> Vec<Vec<CellView>> {
        self.board.snapshot()
    }

    #[instrument(level = "trace", skip(self), fields(row = coord.row, col = coord.col))]
    pub async fn reveal(&mut self, coord: Coord) -> Result<RevealOutcome> {
        self.settle_timer();
        let was_pending = self.board.phase() == GamePhase::Pending;

        let outcome = self
            .board
            .reveal_with_rng(coord, &mut self.rng)
            .inspect_err(|e| warn!("Rejected reveal at {}: {}", coord, e))?;
        self.publish_phase();

        match &outcome {
            RevealOutcome::NoChange => {}
            RevealOutcome::Revealed { cells } => {
                self.emit(GameEvent::CellsRevealed {
                    cells: cells.clone(),
                });
            }
            RevealOutcome::Won { cells, mines } => {
                self.stop_timer().await;
                let mut opened = cells.clone();
                opened.extend_from_slice(mines);
                self.emit(GameEvent::CellsRevealed { cells: opened });
                self.emit(GameEvent::RoundWon);
                info!("Round {} won", self.id);
            }
            RevealOutcome::HitMine { mines } => {
                self.stop_timer().await;
                self.emit(GameEvent::CellsRevealed {
                    cells: mines.clone(),
                });
                self.emit(GameEvent::RoundLost {
                    reason: LossReason::Mine,
                });
                info!("Round {} lost on a mine at {}", self.id, coord);
            }
        }

        if was_pending && self.board.phase().is_in_progress() && self.params.has_time_limit() {
            self.start_timer().await;
        }

        Ok(outcome)
    }

    #[instrument(level = "trace", skip(self), fields(row = coord.row, col = coord.col))]
    pub fn toggle_flag(&mut self, coord: Coord) -> Result<MarkOutcome> {
        self.settle_timer();
        let outcome = self
            .board
            .toggle_flag(coord)
            .inspect_err(|e| warn!("Rejected flag at {}: {}", coord, e))?;
        self.emit_mark(coord, outcome);
        Ok(outcome)
    }

    #[instrument(level = "trace", skip(self), fields(row = coord.row, col = coord.col))]
    pub fn toggle_mark(&mut self, coord: Coord) -> Result<MarkOutcome> {
        self.settle_timer();
        let outcome = self
            .board
            .toggle_mark(coord)
            .inspect_err(|e| warn!("Rejected mark at {}: {}", coord, e))?;
        self.emit_mark(coord, outcome);
        Ok(outcome)
    }

    /// Replaces the round with a fresh pending one. On invalid parameters the
    /// current round is left untouched.
    #[instrument(level = "trace", skip(self))]
    pub async fn reset(&mut self, params: RoundParams) -> Result<()> {
        validate_params(&params)?;
        let board = BoardState::new(params.rows, params.columns, params.mines)?;

        self.stop_timer().await;
        self.id = Uuid::new_v4();
        self.params = params;
        self.board = board;
        self.frozen_seconds = params.time_limit_secs;
        self.publish_phase();

        info!(
            "Reset to round {}: {}x{} with {} mines, {}s limit",
            self.id, params.rows, params.columns, params.mines, params.time_limit_secs
        );
        self.emit(GameEvent::RoundInitialized {
            rows: params.rows,
            columns: params.columns,
            mines: params.mines,
            time_limit_secs: params.time_limit_secs,
        });
        Ok(())
    }

    /// New round with the current parameters.
    pub async fn restart(&mut self) -> Result<()> {
        self.reset(self.params).await
    }

    /// Waits for the current round's next countdown signal and applies it.
    ///
    /// Ticks become `TimeTick` events; expiry ends the round as lost. Pends
    /// forever while no countdown runs. Cancel-safe, so it can sit in a
    /// `select!` next to an input source.
    pub async fn poll_timer(&mut self) -> Option<TimerSignal> {
        loop {
            let signal = self.signal_receiver.recv().await?;
            if self.apply_signal(signal) {
                return Some(signal);
            }
        }
    }

    /// Stops any running countdown.
    pub async fn close(mut self) {
        self.stop_timer().await;
        info!("Closed round {}", self.id);
    }

    /// Applies signals already queued, so a countdown that ran out while no
    /// one was polling ends the round before the next move is judged.
    fn settle_timer(&mut self) {
        while let Ok(signal) = self.signal_receiver.try_recv() {
            self.apply_signal(signal);
        }
    }

    /// Returns whether the signal belonged to the live countdown.
    fn apply_signal(&mut self, signal: TimerSignal) -> bool {
        if signal.round() != self.id || self.timer.is_none() {
            debug!("Dropping stale countdown signal {:?}", signal);
            return false;
        }

        match signal {
            TimerSignal::Tick { seconds_left, .. } => {
                self.emit(GameEvent::TimeTick { seconds_left });
            }
            TimerSignal::TimedOut { .. } => {
                let Ok(mines) = self.board.expire() else {
                    debug!("Ignoring timeout for finished round {}", self.id);
                    return false;
                };
                self.publish_phase();
                // the task exits right after sending its timeout
                if let Some(timer) = self.timer.take() {
                    self.frozen_seconds = timer.remaining();
                }
                self.emit(GameEvent::CellsRevealed { cells: mines });
                self.emit(GameEvent::RoundLost {
                    reason: LossReason::Timeout,
                });
                info!("Round {} lost on time", self.id);
            }
        }

        true
    }

    async fn start_timer(&mut self) {
        self.stop_timer().await;
        self.timer = Some(CountdownTimer::start(
            self.id,
            self.params.time_limit_secs,
            self.phase.subscribe(),
            self.signal_sender.clone(),
        ));
    }

    async fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.frozen_seconds = timer.cancel().await;
        }
    }

    fn publish_phase(&self) {
        self.phase.send_replace(self.board.phase());
    }

    fn emit_mark(&self, coord: Coord, outcome: MarkOutcome) {
        if let MarkOutcome::Changed(status) = outcome {
            self.emit(GameEvent::CellChanged { coord, status });
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(ref sender) = self.event_sender {
            let _ = sender.send(event);
        }
    }
}
