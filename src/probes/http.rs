use super::{Probe, ProbeFailure, ProbeResult};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};

/// HTTP GET probe checking status code and full response time.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sitepulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn run(&self, target: &str, timeout: Duration) -> ProbeResult {
        let url = with_scheme(target);

        let timestamp = Utc::now();
        let start = Instant::now();

        let response = match self.client.get(&url).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => return ProbeResult::failed(timestamp, classify(&e)),
        };

        let status = response.status();
        if status.is_server_error() {
            return ProbeResult::failed(
                timestamp,
                ProbeFailure::HttpStatus {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                },
            );
        }

        // The body counts towards the response time and the timeout.
        if let Err(e) = response.bytes().await {
            return ProbeResult::failed(timestamp, classify(&e));
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        ProbeResult::responded(timestamp, status.as_u16(), elapsed_ms)
    }
}

/// Map a transport error onto the closed failure set.
pub fn classify(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        return ProbeFailure::Timeout;
    }
    match classify_chain(err) {
        Some(failure) => failure,
        None => ProbeFailure::Other(chain_text(err)),
    }
}

/// Prefix `http://` unless the target already names a scheme.
fn with_scheme(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

/// Join an error and its causes as `outer: inner: ...`, skipping causes the
/// outer message already repeats.
fn chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string();
        if !msg.is_empty() && !text.contains(&msg) {
            text.push_str(": ");
            text.push_str(&msg);
        }
        current = e.source();
    }
    text
}

/// Walk an error's source chain looking for a known cause.
fn classify_chain(err: &(dyn StdError + 'static)) -> Option<ProbeFailure> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some(ProbeFailure::ConnectionRefused),
                io::ErrorKind::TimedOut => return Some(ProbeFailure::Timeout),
                _ => {}
            }
        }
        if is_dns_failure(&e.to_string()) {
            return Some(ProbeFailure::HostNotFound);
        }
        current = e.source();
    }
    None
}

// hyper's resolver reports lookup failures as "dns error: ..." and the
// system resolver as "failed to lookup address information: ...".
fn is_dns_failure(text: &str) -> bool {
    text.contains("dns error") || text.contains("failed to lookup address")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapped {
        msg: &'static str,
        inner: Option<io::Error>,
    }

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.msg)
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.inner.as_ref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_chain_connection_refused() {
        let err = Wrapped {
            msg: "client error (Connect)",
            inner: Some(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        };
        assert_eq!(classify_chain(&err), Some(ProbeFailure::ConnectionRefused));
    }

    #[test]
    fn test_chain_io_timeout() {
        let err = Wrapped {
            msg: "client error (Connect)",
            inner: Some(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
        };
        assert_eq!(classify_chain(&err), Some(ProbeFailure::Timeout));
    }

    #[test]
    fn test_chain_dns() {
        let err = Wrapped {
            msg: "client error (Connect)",
            inner: Some(io::Error::new(
                io::ErrorKind::Other,
                "failed to lookup address information: Name or service not known",
            )),
        };
        assert_eq!(classify_chain(&err), Some(ProbeFailure::HostNotFound));
    }

    #[test]
    fn test_chain_unknown() {
        let err = Wrapped {
            msg: "something else",
            inner: Some(io::Error::new(io::ErrorKind::Other, "broken pipe-ish")),
        };
        assert_eq!(classify_chain(&err), None);
    }

    #[test]
    fn test_chain_text_keeps_causes() {
        let err = Wrapped {
            msg: "error sending request for url (http://127.0.0.1:9/)",
            inner: Some(io::Error::new(
                io::ErrorKind::Other,
                "connection closed before message completed",
            )),
        };
        assert_eq!(
            chain_text(&err),
            "error sending request for url (http://127.0.0.1:9/): connection closed before message completed"
        );

        let bare = Wrapped {
            msg: "builder error",
            inner: None,
        };
        assert_eq!(chain_text(&bare), "builder error");
    }

    #[test]
    fn test_with_scheme() {
        assert_eq!(with_scheme("example.com"), "http://example.com");
        assert_eq!(with_scheme("httpbin.org"), "http://httpbin.org");
        assert_eq!(with_scheme("http-echo.local:8080/x"), "http://http-echo.local:8080/x");
        assert_eq!(with_scheme("https://example.com/"), "https://example.com/");
        assert_eq!(with_scheme("http://example.com/"), "http://example.com/");
    }

    #[tokio::test]
    async fn test_garbage_reply_keeps_underlying_cause() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf).await;
            let _ = sock.write_all(b"garbage not http\r\n\r\n").await;
            let _ = sock.shutdown().await;
        });

        let r = HttpProbe::new()
            .unwrap()
            .run(&format!("http://{}/", addr), Duration::from_secs(5))
            .await;
        assert!(r.is_error());
        let detail = r.error_detail.unwrap();
        assert!(detail.starts_with("error sending request"), "{}", detail);
        // The cause after the top-level message must survive.
        assert!(detail.contains("): "), "{}", detail);
    }

    #[tokio::test]
    async fn test_bare_host_starting_with_http_gets_scheme() {
        let r = HttpProbe::new()
            .unwrap()
            .run("httpbin.invalid", Duration::from_secs(5))
            .await;
        assert_eq!(r.error_detail.as_deref(), Some("Host not found"));
    }

    #[tokio::test]
    async fn test_refused_port_yields_error_record() {
        // Grab a free port, then release it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::new().unwrap();
        let r = probe
            .run(&format!("http://{}/", addr), Duration::from_secs(2))
            .await;
        assert!(r.is_error());
        assert_eq!(
            r.error_detail.as_deref(),
            Some("Connection refused - Server might be down")
        );
    }

    #[tokio::test]
    async fn test_bare_host_gets_scheme() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::default();
        let r = probe.run(&addr.to_string(), Duration::from_secs(2)).await;
        // A bare "host:port" must still reach the transport, not fail URL parsing.
        assert_eq!(r.error_detail.as_deref(), Some("Connection refused - Server might be down"));
    }
}
