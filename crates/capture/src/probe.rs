//! Readiness probe for the target web server
//!
//! The server under capture is external (a dev server someone else started),
//! so before spending a browser session on it we poll the base URL until it
//! answers. Any HTTP response counts as reachable; status codes are the
//! application's business.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::error::{CaptureError, CaptureResult};

/// Configuration for the readiness probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Total time to keep probing before giving up
    pub timeout: Duration,

    /// Delay between attempts
    pub interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(100),
        }
    }
}

/// Poll `base_url` until it responds or the probe timeout expires.
pub async fn wait_until_reachable(base_url: &Url, config: &ProbeConfig) -> CaptureResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0usize;

    while start.elapsed() < config.timeout {
        attempts += 1;

        match client.get(base_url.clone()).send().await {
            Ok(resp) => {
                info!(url = %base_url, status = %resp.status(), attempts, "server reachable");
                return Ok(());
            }
            Err(e) => {
                if attempts == 1 {
                    info!(url = %base_url, "waiting for server...");
                }
                // Connection refused is expected while the server is starting
                if !e.is_connect() {
                    warn!("probe error: {}", e);
                }
            }
        }

        sleep(config.interval).await;
    }

    Err(CaptureError::ServerUnreachable {
        url: base_url.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.interval, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn unreachable_server_reports_attempts() {
        // Bind then drop to get a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let config = ProbeConfig {
            timeout: Duration::from_millis(300),
            interval: Duration::from_millis(50),
        };

        match wait_until_reachable(&url, &config).await {
            Err(CaptureError::ServerUnreachable { attempts, .. }) => assert!(attempts >= 1),
            other => panic!("expected ServerUnreachable, got {other:?}"),
        }
    }
}
