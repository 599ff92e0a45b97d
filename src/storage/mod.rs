//! In-memory, capacity-bounded probe history.

use crate::probes::ProbeResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of records retained by default.
pub const DEFAULT_CAPACITY: usize = 100;

/// Window returned by [`HistoryStore::recent`] when no usable limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Number of records included in [`AggregateStatus::latest_entries`].
const LATEST_WINDOW: usize = 5;

/// Append-only probe history with FIFO eviction.
///
/// Cloning yields another handle to the same history. Appends and reads are
/// serialized through one lock, so readers never see a half-evicted window.
#[derive(Clone)]
pub struct HistoryStore {
    entries: Arc<RwLock<VecDeque<ProbeResult>>>,
    capacity: usize,
}

/// Health statistics derived from the retained window.
///
/// `WARNING` records are counted neither as successes nor as errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatus {
    pub total_checks: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Percentage with two decimals, or `"0"` when there are no checks.
    pub success_rate: String,
    pub latest_entries: Vec<ProbeResult>,
    pub last_check_time: Option<DateTime<Utc>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store retaining at most `capacity` records (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a record at the tail, evicting from the head past capacity.
    pub async fn append(&self, result: ProbeResult) {
        let mut entries = self.entries.write().await;
        entries.push_back(result);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The last `limit` records, oldest first.
    ///
    /// `None` or zero falls back to [`DEFAULT_RECENT_LIMIT`].
    pub async fn recent(&self, limit: Option<usize>) -> Vec<ProbeResult> {
        self.recent_with_total(limit).await.1
    }

    /// Like [`recent`](Self::recent), also returning the number of retained
    /// records from the same snapshot.
    pub async fn recent_with_total(&self, limit: Option<usize>) -> (usize, Vec<ProbeResult>) {
        let limit = match limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_RECENT_LIMIT,
        };
        let entries = self.entries.read().await;
        (entries.len(), tail(&entries, limit))
    }

    /// Aggregate counters over everything currently retained.
    pub async fn status(&self) -> AggregateStatus {
        let entries = self.entries.read().await;

        let success_count = entries.iter().filter(|r| r.is_success()).count();
        let error_count = entries.iter().filter(|r| r.is_error()).count();
        let total_checks = success_count + error_count;

        let success_rate = if total_checks > 0 {
            format!("{:.2}", success_count as f64 / total_checks as f64 * 100.0)
        } else {
            "0".to_string()
        };

        AggregateStatus {
            total_checks,
            success_count,
            error_count,
            success_rate,
            latest_entries: tail(&entries, LATEST_WINDOW),
            last_check_time: entries.back().map(|r| r.timestamp),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn tail(entries: &VecDeque<ProbeResult>, n: usize) -> Vec<ProbeResult> {
    let skip = entries.len().saturating_sub(n);
    entries.iter().skip(skip).cloned().collect()
}
