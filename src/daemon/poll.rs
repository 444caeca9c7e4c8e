//! Poll loop
//!
//! Re-evaluates all directions on a timer or on demand. Directions are
//! evaluated concurrently on blocking workers; one direction failing or
//! hanging never holds up the others. Shutdown is soft: it is honored
//! between cycles, never in the middle of one.

use std::time::Duration;

use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::tick::{PollConfig, PollState, PollTrigger};
use crate::direction::Direction;
use crate::error::Result;
use crate::status::{Classification, classify};

/// Result of one cycle
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub trigger: PollTrigger,
    pub taken_at: DateTime<Local>,
    /// One classification per direction, in the loop's direction order
    pub entries: Vec<Classification>,
}

/// Handle for steering a running poll loop.
///
/// Dropping the handle stops the loop after its current cycle.
#[derive(Debug, Clone)]
pub struct PollHandle {
    refresh_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl PollHandle {
    /// Ask for an immediate cycle.
    ///
    /// Returns false if a refresh is already pending or the loop has exited.
    pub fn refresh(&self) -> bool {
        self.refresh_tx.try_send(()).is_ok()
    }

    /// Stop the loop once the current cycle (if any) finishes
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Periodic evaluator for a fixed set of directions
pub struct PollLoop {
    config: PollConfig,
    directions: Vec<Direction>,
    state: PollState,
    refresh_rx: mpsc::Receiver<()>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollLoop {
    /// Create a loop and the handle that controls it
    pub fn new(config: PollConfig, directions: Vec<Direction>) -> (Self, PollHandle) {
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poll = Self {
            config,
            directions,
            state: PollState::new(),
            refresh_rx,
            shutdown_rx,
        };
        (poll, PollHandle { refresh_tx, shutdown_tx })
    }

    /// Run until shutdown, handing each cycle's snapshot to `sink`.
    ///
    /// Returns the accumulated poll state.
    pub async fn run<F>(mut self, mut sink: F) -> PollState
    where
        F: FnMut(Snapshot),
    {
        log::info!(
            "Polling {} directions every {:?}",
            self.directions.len(),
            self.config.interval
        );

        sink(self.cycle(PollTrigger::Startup).await);

        let mut interval = tokio::time::interval_at(Instant::now() + self.config.interval, self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let trigger = tokio::select! {
                _ = interval.tick() => PollTrigger::Interval,
                Some(()) = self.refresh_rx.recv() => PollTrigger::Refresh,
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        log::debug!("Poll handle dropped, stopping");
                        break;
                    }
                    continue;
                }
            };

            sink(self.cycle(trigger).await);
        }

        self.state.request_shutdown();
        log::info!("Poll loop stopped after {} cycles", self.state.cycle_count);
        self.state
    }

    async fn cycle(&mut self, trigger: PollTrigger) -> Snapshot {
        log::debug!("Poll cycle {} ({:?})", self.state.cycle_count + 1, trigger);

        let (entries, unavailable) = evaluate_all(&self.directions, self.config.evaluation_timeout).await;
        self.state.cycle_finished(entries.len(), unavailable);

        Snapshot {
            cycle: self.state.cycle_count,
            trigger,
            taken_at: Local::now(),
            entries,
        }
    }
}

/// Classify every direction concurrently.
///
/// A direction whose evaluation times out, panics, or hits a configuration
/// fault is reported as unavailable; the count of those is returned
/// alongside the classifications. A timed-out evaluation keeps running on
/// its worker but its result is discarded.
pub async fn evaluate_all(directions: &[Direction], timeout: Duration) -> (Vec<Classification>, usize) {
    evaluate_with(directions, timeout, classify).await
}

async fn evaluate_with<F>(directions: &[Direction], timeout: Duration, evaluate: F) -> (Vec<Classification>, usize)
where
    F: Fn(&Direction) -> Result<Classification> + Clone + Send + 'static,
{
    let evaluations = directions.iter().cloned().map(|direction| {
        let evaluate = evaluate.clone();
        async move {
            let worker_direction = direction.clone();
            let task = tokio::task::spawn_blocking(move || evaluate(&worker_direction));
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(classification))) => (classification, false),
                Ok(Ok(Err(e))) => {
                    log::error!("Cannot evaluate {}: {}", direction.name, e);
                    (Classification::unavailable(&direction, &e.to_string()), true)
                }
                Ok(Err(e)) => {
                    log::error!("Evaluation of {} panicked: {}", direction.name, e);
                    (Classification::unavailable(&direction, "evaluation failed"), true)
                }
                Err(_) => {
                    log::warn!("Evaluation of {} exceeded {:?}", direction.name, timeout);
                    (Classification::unavailable(&direction, "timed out"), true)
                }
            }
        }
    });

    let results = join_all(evaluations).await;
    let unavailable = results.iter().filter(|(_, failed)| *failed).count();
    (results.into_iter().map(|(c, _)| c).collect(), unavailable)
}
