//! Reachability probe for the configured captioning backend.
//!
//! Fired from the settings screen's "Check Connection" button: a single GET
//! against `http://{host}:{port}/` with a 5-second timeout.  Success is
//! defined as HTTP 200 within the timeout; timeout, transport failure and
//! any other status all collapse to the same "failed to connect" answer —
//! the user is not told which one occurred.

use std::time::Duration;

/// The bounded timeout the probe aborts after.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One-shot connectivity check.
pub struct ConnectivityProbe {
    client: reqwest::Client,
}

impl ConnectivityProbe {
    /// Probe with the standard 5-second timeout.
    pub fn new() -> Self {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    /// Probe with an explicit timeout (useful for tests).
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Check whether `http://{host}:{port}/` answers HTTP 200 in time.
    ///
    /// All failure modes are logged here and reported identically as `false`.
    pub async fn check(&self, host: &str, port: &str) -> bool {
        self.check_url(&format!("http://{host}:{port}/")).await
    }

    async fn check_url(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => true,
            Ok(response) => {
                log::warn!("connectivity: {url} answered HTTP {}", response.status());
                false
            }
            Err(e) => {
                log::warn!("connectivity: {url} unreachable ({e})");
                false
            }
        }
    }
}

impl Default for ConnectivityProbe {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
