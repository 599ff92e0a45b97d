//! Probe results and the probe trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod http;

/// Default hard timeout for a single probe.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "SUCCESS"),
            Outcome::Warning => write!(f, "WARNING"),
            Outcome::Error => write!(f, "ERROR"),
        }
    }
}

/// Why a probe observed no usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    ConnectionRefused,
    Timeout,
    HostNotFound,
    /// The server answered with a 5xx status.
    HttpStatus { status: u16, reason: String },
    Other(String),
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::ConnectionRefused => {
                write!(f, "Connection refused - Server might be down")
            }
            ProbeFailure::Timeout => write!(f, "Request timed out"),
            ProbeFailure::HostNotFound => write!(f, "Host not found"),
            ProbeFailure::HttpStatus { status, reason } => {
                write!(f, "HTTP {} - {}", status, reason)
            }
            ProbeFailure::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Outcome of one HTTP probe.
///
/// Either a response was observed (`status_code` and `response_time_ms`
/// are set) or it was not (`error_detail` is set). Construct through
/// [`ProbeResult::responded`] or [`ProbeResult::failed`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub outcome: Outcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ProbeResult {
    /// A response with a status below 500 was received.
    pub fn responded(timestamp: DateTime<Utc>, status: u16, response_time_ms: u64) -> Self {
        let (outcome, message) = if (200..300).contains(&status) {
            (
                Outcome::Success,
                format!(
                    "Website loaded successfully - Status: {}, Response time: {}ms",
                    status, response_time_ms
                ),
            )
        } else {
            (
                Outcome::Warning,
                format!(
                    "Website responded but with status: {}, Response time: {}ms",
                    status, response_time_ms
                ),
            )
        };

        Self {
            timestamp,
            outcome,
            message,
            status_code: Some(status),
            response_time_ms: Some(response_time_ms),
            error_detail: None,
        }
    }

    /// No usable response was observed.
    pub fn failed(timestamp: DateTime<Utc>, failure: ProbeFailure) -> Self {
        let detail = failure.to_string();
        Self {
            timestamp,
            outcome: Outcome::Error,
            message: format!("Failed to load website - {}", detail),
            status_code: None,
            response_time_ms: None,
            error_detail: Some(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn is_error(&self) -> bool {
        self.outcome == Outcome::Error
    }
}

/// Trait for active probes.
///
/// A probe never fails towards its caller: every failure mode ends up in
/// the returned record.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Run the probe against a target with a hard timeout.
    async fn run(&self, target: &str, timeout: Duration) -> ProbeResult;
}
