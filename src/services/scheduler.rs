//! Repeated invocations on a fixed interval
//!
//! Runs never overlap and are never cancelled part-way. Shutdown is a
//! level-triggered `watch` flag, so a stop requested while a run is in
//! progress ends the loop as soon as that run returns.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Call `run` once per `period` until `shutdown` turns true (or its sender
/// goes away). Returns the number of completed runs.
pub async fn run_every<F, Fut>(period: Duration, mut shutdown: watch::Receiver<bool>, mut run: F) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(every_ms = period.as_millis() as u64, "scheduler_started");

    let mut runs = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = interval.tick() => {
                run().await;
                runs += 1;
            }
        }
    }

    info!(runs = runs, "scheduler_stopped");
    runs
}
