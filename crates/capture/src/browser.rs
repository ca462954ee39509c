//! Headless browser session over WebDriver

use std::path::Path;
use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};
use url::Url;
use webdriver::capabilities::Capabilities;

use crate::error::{CaptureError, CaptureResult};
use crate::locator::Target;
use crate::step::{LoadWait, Viewport, WaitState};

/// Upper bound for page-load waits after navigation.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Network idle: no new resource fetches for this long.
const IDLE_QUIET: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Poll interval for element waits.
const ELEMENT_POLL: Duration = Duration::from_millis(100);

const LOAD_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Configuration for a browser session.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver endpoint (Chromedriver by default)
    pub webdriver_url: String,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Window size for the session
    pub viewport: Viewport,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
        }
    }
}

/// A single browser session scoped to one flow execution.
///
/// Wraps a fantoccini [`Client`] with the waits a capture flow needs:
/// load-state polling after navigation, element visibility polling with a
/// deadline, and screenshot capture to file.
pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    /// Connect to the WebDriver endpoint and open a fresh headless session.
    pub async fn launch(config: &BrowserConfig) -> CaptureResult<Self> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            format!(
                "--window-size={},{}",
                config.viewport.width, config.viewport.height
            ),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|source| CaptureError::Session {
                url: config.webdriver_url.clone(),
                source,
            })?;

        client
            .set_window_size(config.viewport.width, config.viewport.height)
            .await?;

        info!(
            webdriver = %config.webdriver_url,
            headless = config.headless,
            "browser session started"
        );

        Ok(Self { client })
    }

    /// Navigate to `url` and honor the requested load wait.
    pub async fn goto(&self, url: &Url, wait: LoadWait) -> CaptureResult<()> {
        debug!(%url, ?wait, "navigating");
        self.client.goto(url.as_str()).await?;
        self.wait_for_load(wait).await
    }

    async fn wait_for_load(&self, wait: LoadWait) -> CaptureResult<()> {
        match wait {
            LoadWait::None => Ok(()),
            LoadWait::Load => self.wait_for_ready_state().await,
            LoadWait::NetworkIdle => self.wait_for_network_idle().await,
        }
    }

    /// Read `document.readyState` and the resource-timing entry count.
    async fn load_state(&self) -> CaptureResult<(bool, u64)> {
        let value = self.client.execute(LOAD_STATE_SCRIPT, vec![]).await?;
        let pair = value.as_array();
        let complete = pair
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .map(|s| s == "complete")
            .unwrap_or(false);
        let resources = pair
            .and_then(|a| a.get(1))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Ok((complete, resources))
    }

    async fn wait_for_ready_state(&self) -> CaptureResult<()> {
        let deadline = Instant::now() + LOAD_TIMEOUT;
        loop {
            let (complete, _) = self.load_state().await?;
            if complete {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::LoadTimeout {
                    state: "load".to_string(),
                    timeout_ms: LOAD_TIMEOUT.as_millis() as u64,
                });
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    /// Wait until the document is complete and no resource has been fetched
    /// for the quiescent window.
    async fn wait_for_network_idle(&self) -> CaptureResult<()> {
        let deadline = Instant::now() + LOAD_TIMEOUT;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let (complete, resources) = self.load_state().await?;

            if last_count != Some(resources) {
                last_count = Some(resources);
                quiet_since = Instant::now();
            }

            if complete && quiet_since.elapsed() >= IDLE_QUIET {
                debug!(resources, "network idle");
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(CaptureError::LoadTimeout {
                    state: "network_idle".to_string(),
                    timeout_ms: LOAD_TIMEOUT.as_millis() as u64,
                });
            }

            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    /// Poll for an element matching `target` until it satisfies `state` or
    /// the timeout expires.
    pub async fn resolve(
        &self,
        target: &Target,
        timeout: Duration,
        state: WaitState,
    ) -> CaptureResult<Element> {
        let query = target.compile();
        let deadline = Instant::now() + timeout;

        loop {
            let candidates = self.client.find_all(query.as_locator()).await?;
            for element in candidates {
                match state {
                    WaitState::Present => return Ok(element),
                    WaitState::Visible => {
                        if element.is_displayed().await? {
                            return Ok(element);
                        }
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(CaptureError::WaitTimeout {
                    target: target.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }

            tokio::time::sleep(ELEMENT_POLL).await;
        }
    }

    /// Wait for `target` to become visible, then click it.
    pub async fn click(&self, target: &Target, timeout: Duration) -> CaptureResult<()> {
        let element = self.resolve(target, timeout, WaitState::Visible).await?;
        debug!(%target, "clicking");
        element.click().await?;
        Ok(())
    }

    /// Wait for `target`, clear it, and type `value` into it.
    pub async fn fill(&self, target: &Target, value: &str, timeout: Duration) -> CaptureResult<()> {
        let element = self.resolve(target, timeout, WaitState::Visible).await?;
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    /// Capture a viewport screenshot and write it to `path`.
    ///
    /// The PNG payload is decoded before writing; an empty or corrupt capture
    /// fails the step instead of leaving a broken file behind.
    pub async fn screenshot_to_file(&self, path: &Path) -> CaptureResult<()> {
        let png = self.client.screenshot().await?;
        if png.is_empty() {
            return Err(CaptureError::EmptyScreenshot);
        }

        let decoded = image::load_from_memory(&png)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &png)?;

        info!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            bytes = png.len(),
            "screenshot saved"
        );
        Ok(())
    }

    /// End the WebDriver session.
    pub async fn close(self) -> CaptureResult<()> {
        self.client.close().await?;
        Ok(())
    }
}
