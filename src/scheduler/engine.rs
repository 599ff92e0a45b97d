use crate::scheduler::Monitor;
use chrono::Utc;
use cron::Schedule;
use std::time::Duration;
use tracing::{info, warn};

/// Main scheduler execution loop.
///
/// Runs one check after `initial_delay`, then one per tick of `schedule`.
/// Every check is spawned as its own task so a slow probe never delays
/// the next tick. Never returns unless the schedule runs out of times.
pub async fn run_scheduler_loop(monitor: Monitor, schedule: Schedule, initial_delay: Duration) {
    info!(target_url = %monitor.target(), "Scheduler engine started");

    let initial = monitor.clone();
    tokio::spawn(async move {
        tokio::time::sleep(initial_delay).await;
        info!("Performing initial website check");
        initial.check(None).await;
    });

    let mut last_fired = Utc::now();
    loop {
        // Never fire the same tick twice, never replay missed ticks.
        let from = last_fired.max(Utc::now());
        let Some(next) = schedule.after(&from).next() else {
            warn!("Schedule has no upcoming runs, stopping");
            return;
        };

        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;
        last_fired = next;

        info!(at = %next.to_rfc3339(), "Running scheduled website check");
        let monitor = monitor.clone();
        tokio::spawn(async move {
            monitor.check(None).await;
        });
    }
}
