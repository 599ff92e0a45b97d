//! API route definitions.

use super::error::ApiError;
use super::state::AppState;
use crate::probes::ProbeResult;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info).fallback(method_not_allowed))
        .route("/check", post(manual_check).fallback(method_not_allowed))
        .route("/logs", get(list_logs).fallback(method_not_allowed))
        .route("/status", get(monitor_status).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn service_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Website Monitor is running",
        "targetUrl": state.monitor.target(),
        "status": "active",
        "nextCheck": state.next_check,
        "endpoints": {
            "/api": "API info",
            "/api/check": "Manual website check (POST)",
            "/api/logs": "Get monitoring logs",
            "/api/status": "Get monitoring status",
            "/api/health": "Health check"
        },
        "timestamp": now_iso(),
        "uptime": state.uptime()
    }))
}

#[derive(Debug, Default, Deserialize)]
struct CheckRequest {
    url: Option<String>,
}

async fn manual_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Some(secret) = state.check_secret.as_deref() {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(secret) {
            warn!("Rejected manual check with missing or wrong bearer token");
            return Err(ApiError::Unauthorized);
        }
    }

    let request: CheckRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CheckRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let target = request
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| state.monitor.target().to_string());

    info!(%target, "Manual check triggered via API");
    let result = state.monitor.check(Some(&target)).await;

    Ok(Json(json!({
        "message": "Manual check completed",
        "result": result,
        "targetUrl": target
    })))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogsResponse {
    total: usize,
    showing: usize,
    logs: Vec<ProbeResult>,
}

async fn list_logs(State(state): State<AppState>, Query(query): Query<LogsQuery>) -> Json<LogsResponse> {
    // Anything that is not a positive integer falls back to the default window.
    let limit = query
        .limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .and_then(|l| usize::try_from(l).ok());

    let (total, logs) = state.monitor.store().recent_with_total(limit).await;
    Json(LogsResponse {
        total,
        showing: logs.len(),
        logs,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    target_url: String,
    total_checks: usize,
    success_count: usize,
    error_count: usize,
    success_rate: String,
    latest_logs: Vec<ProbeResult>,
    last_check_time: Option<DateTime<Utc>>,
}

async fn monitor_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.monitor.store().status().await;
    Json(StatusResponse {
        target_url: state.monitor.target().to_string(),
        total_checks: status.total_checks,
        success_count: status.success_count,
        error_count: status.error_count,
        success_rate: format!("{}%", status.success_rate),
        latest_logs: status.latest_entries,
        last_check_time: status.last_check_time,
    })
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": now_iso(),
        "uptime": state.uptime()
    }))
}
