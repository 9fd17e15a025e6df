use chrono::Utc;
use snakebot_core_types::CycleSummary;
use snakebot_inputs::InputLists;
use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::scheduler::{CycleError, Scheduler};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub started: u64,
    /// Ticks that fired while the previous cycle was still running.
    pub skipped: u64,
    pub aborted: u64,
    pub completed: u64,
}

/// Starts a cycle immediately and then once per `interval`, never two at once.
pub struct CycleTimer {
    scheduler: Arc<Scheduler>,
    inputs: Arc<InputLists>,
    interval: Duration,
    max_cycles: u64,
}

impl CycleTimer {
    /// `max_cycles == 0` keeps the timer running until shutdown.
    pub fn new(
        scheduler: Arc<Scheduler>,
        inputs: Arc<InputLists>,
        interval: Duration,
        max_cycles: u64,
    ) -> Self {
        Self {
            scheduler,
            inputs,
            interval: interval.max(MIN_INTERVAL),
            max_cycles,
        }
    }

    pub async fn run(&self) -> TimerStats {
        self.run_until(future::pending()).await
    }

    /// Runs until `max_cycles` cycles have finished or `shutdown` resolves.
    /// A cycle still running at shutdown is aborted along with its account
    /// runners.
    pub async fn run_until<F>(&self, shutdown: F) -> TimerStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = TimerStats::default();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut running: JoinSet<Result<CycleSummary, CycleError>> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            let limit_reached = self.max_cycles > 0 && stats.started >= self.max_cycles;
            if limit_reached && running.is_empty() {
                break;
            }

            tokio::select! {
                _ = ticker.tick(), if !limit_reached => {
                    if !running.is_empty() || self.scheduler.is_running() {
                        stats.skipped += 1;
                        warn!(cycle = stats.started, "previous cycle still running, skipping tick");
                        continue;
                    }
                    stats.started += 1;
                    info!(cycle = stats.started, "starting cycle");
                    let scheduler = self.scheduler.clone();
                    let inputs = self.inputs.clone();
                    running.spawn(async move { scheduler.run_cycle(inputs).await });
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    self.record_cycle_end(&mut stats, joined);
                }
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    running.abort_all();
                    while running.join_next().await.is_some() {}
                    break;
                }
            }
        }

        info!(
            started = stats.started,
            completed = stats.completed,
            aborted = stats.aborted,
            skipped = stats.skipped,
            "cycle timer stopped"
        );
        stats
    }

    fn record_cycle_end(
        &self,
        stats: &mut TimerStats,
        joined: Result<Result<CycleSummary, CycleError>, task::JoinError>,
    ) {
        match joined {
            Ok(Ok(summary)) => {
                stats.completed += 1;
                let next_cycle_at = chrono::Duration::from_std(self.interval)
                    .ok()
                    .and_then(|delta| Utc::now().checked_add_signed(delta));
                info!(
                    cycle_id = %summary.cycle_id,
                    done = summary.done,
                    errored = summary.errored,
                    restart_in_secs = self.interval.as_secs(),
                    next_cycle_at = ?next_cycle_at,
                    "cycle finished, waiting for next restart"
                );
            }
            Ok(Err(CycleError::AlreadyRunning)) => {
                stats.skipped += 1;
            }
            Ok(Err(reason)) => {
                stats.aborted += 1;
                warn!(reason = %reason, "cycle aborted");
            }
            Err(join_error) => {
                stats.aborted += 1;
                error!(error = %join_error, "cycle task failed");
            }
        }
    }
}
