use crate::scheduler::Monitor;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
    /// Bearer token for `POST /check`; `None` leaves the endpoint open.
    pub check_secret: Option<String>,
    /// Human-readable description of the check cadence.
    pub next_check: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(monitor: Monitor, check_secret: Option<String>, next_check: impl Into<String>) -> Self {
        Self {
            monitor,
            check_secret,
            next_check: next_check.into(),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
