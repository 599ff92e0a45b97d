//! HTTP probe classification against a mock server.

use sitepulse::probes::http::HttpProbe;
use sitepulse::probes::{Outcome, Probe};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn probe_status(status: u16) -> sitepulse::probes::ProbeResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_string("hello"))
        .mount(&server)
        .await;

    HttpProbe::new()
        .unwrap()
        .run(&format!("{}/", server.uri()), Duration::from_secs(5))
        .await
}

#[tokio::test]
async fn test_200_is_success() {
    let r = probe_status(200).await;
    assert_eq!(r.outcome, Outcome::Success);
    assert_eq!(r.status_code, Some(200));
    assert!(r.response_time_ms.is_some());
    assert!(r
        .message
        .starts_with("Website loaded successfully - Status: 200, Response time: "));
}

#[tokio::test]
async fn test_404_is_warning() {
    let r = probe_status(404).await;
    assert_eq!(r.outcome, Outcome::Warning);
    assert_eq!(r.status_code, Some(404));
    assert!(r.error_detail.is_none());
}

#[tokio::test]
async fn test_503_is_error_without_status() {
    let r = probe_status(503).await;
    assert_eq!(r.outcome, Outcome::Error);
    assert_eq!(
        r.error_detail.as_deref(),
        Some("HTTP 503 - Service Unavailable")
    );
    assert!(r.status_code.is_none());
    assert!(r.response_time_ms.is_none());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let r = HttpProbe::new()
        .unwrap()
        .run(&server.uri(), Duration::from_millis(200))
        .await;
    assert_eq!(r.outcome, Outcome::Error);
    assert_eq!(r.error_detail.as_deref(), Some("Request timed out"));
    assert_eq!(r.message, "Failed to load website - Request timed out");
}

#[tokio::test]
async fn test_unresolvable_host_is_host_not_found() {
    // `.invalid` is reserved and never resolves.
    let r = HttpProbe::new()
        .unwrap()
        .run("http://sitepulse-missing.invalid/", Duration::from_secs(5))
        .await;
    assert_eq!(r.outcome, Outcome::Error);
    assert_eq!(r.error_detail.as_deref(), Some("Host not found"));
    assert_eq!(r.message, "Failed to load website - Host not found");
}
