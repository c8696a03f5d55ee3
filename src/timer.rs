use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use minesweeper_common::models::GamePhase;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Messages sent by a running countdown to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { round: Uuid, seconds_left: u32 },
    TimedOut { round: Uuid },
}

impl TimerSignal {
    pub fn round(&self) -> Uuid {
        match self {
            TimerSignal::Tick { round, .. } | TimerSignal::TimedOut { round } => *round,
        }
    }
}

/// A spawned task that counts a round's time budget down once per second.
///
/// The task announces the remaining seconds before every wait, so a budget of
/// 3 yields ticks 3, 2, 1 and then a single `TimedOut`. It stops early when
/// cancelled or when the shared phase leaves `InProgress`.
pub struct CountdownTimer {
    round: Uuid,
    remaining: Arc<AtomicU32>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Spawns the countdown on the current tokio runtime.
    pub fn start(
        round: Uuid,
        seconds: u32,
        phase: watch::Receiver<GamePhase>,
        signals: mpsc::UnboundedSender<TimerSignal>,
    ) -> Self {
        let remaining = Arc::new(AtomicU32::new(seconds));
        let (stop, stop_rx) = oneshot::channel();

        info!("Starting {}s countdown for round {}", seconds, round);

        let task = tokio::spawn(run_countdown(
            round,
            remaining.clone(),
            stop_rx,
            phase,
            signals,
        ));

        Self {
            round,
            remaining,
            stop: Some(stop),
            task: Some(task),
        }
    }

    pub fn round(&self) -> Uuid {
        self.round
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stops the countdown and waits for its task to exit.
    ///
    /// Once this returns no further signal from this timer can be sent.
    /// Returns the seconds that were left.
    pub async fn cancel(mut self) -> u32 {
        if let Some(stop) = self.stop.take() {
            // the task may already have exited after timing out
            let _ = stop.send(());
        }

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Countdown task for round {} ended abnormally: {}", self.round, e);
        }

        let remaining = self.remaining();
        info!(
            "Countdown for round {} cancelled with {}s left",
            self.round, remaining
        );
        remaining
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_countdown(
    round: Uuid,
    remaining: Arc<AtomicU32>,
    mut stop: oneshot::Receiver<()>,
    phase: watch::Receiver<GamePhase>,
    signals: mpsc::UnboundedSender<TimerSignal>,
) {
    let mut interval = time::interval(TICK_PERIOD);
    // the first tick completes immediately
    interval.tick().await;

    loop {
        let seconds_left = remaining.load(Ordering::Acquire);
        if seconds_left == 0 {
            info!("Countdown for round {} expired", round);
            let _ = signals.send(TimerSignal::TimedOut { round });
            break;
        }

        if !phase.borrow().is_in_progress() {
            debug!("Round {} no longer in progress, countdown stopping", round);
            break;
        }

        if signals
            .send(TimerSignal::Tick {
                round,
                seconds_left,
            })
            .is_err()
        {
            debug!("Countdown receiver for round {} dropped", round);
            break;
        }

        tokio::select! {
            biased;
            _ = &mut stop => {
                break;
            }
            _ = interval.tick() => {
                remaining.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}
