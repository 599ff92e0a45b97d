//! Probe-and-record pipeline and its timer.

pub mod engine;

pub use self::engine::run_scheduler_loop;

use crate::probes::{Outcome, Probe, ProbeResult};
use crate::storage::HistoryStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs probes and records their results.
///
/// Cheap to clone; clones share the probe and the history. Concurrent
/// checks are allowed and independent, only the append is serialized.
#[derive(Clone)]
pub struct Monitor {
    probe: Arc<dyn Probe>,
    store: HistoryStore,
    target: String,
    timeout: Duration,
}

impl Monitor {
    pub fn new(
        probe: Arc<dyn Probe>,
        store: HistoryStore,
        target: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            probe,
            store,
            target: target.into(),
            timeout,
        }
    }

    /// The configured default target.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Probe `target` (or the configured one) once and append the result.
    pub async fn check(&self, target: Option<&str>) -> ProbeResult {
        let target = target.unwrap_or(self.target.as_str());
        let result = self.probe.run(target, self.timeout).await;

        match result.outcome {
            Outcome::Success => {
                info!(%target, status = ?result.status_code, ms = ?result.response_time_ms, "{}", result.message)
            }
            Outcome::Warning => {
                warn!(%target, status = ?result.status_code, ms = ?result.response_time_ms, "{}", result.message)
            }
            Outcome::Error => {
                error!(%target, detail = ?result.error_detail, "{}", result.message)
            }
        }

        self.store.append(result.clone()).await;
        result
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProbe;
    use super::*;

    #[tokio::test]
    async fn test_check_appends_result() {
        let probe = Arc::new(ScriptedProbe::new(vec![Some(200), Some(404), None]));
        let monitor = Monitor::new(
            probe.clone(),
            HistoryStore::new(),
            "http://example.test/",
            Duration::from_secs(1),
        );

        let first = monitor.check(None).await;
        assert_eq!(first.outcome, Outcome::Success);
        monitor.check(Some("http://other.test/")).await;
        let third = monitor.check(None).await;
        assert_eq!(third.error_detail.as_deref(), Some("Request timed out"));

        assert_eq!(probe.calls(), 3);
        let recent = monitor.store().recent(None).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2], third);
    }
}
