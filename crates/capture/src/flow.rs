//! Flow execution: probe the server, drive a fresh session, report per step

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{BrowserConfig, BrowserSession};
use crate::error::{CaptureError, CaptureResult};
use crate::probe::{self, ProbeConfig};
use crate::step::{CaptureFlow, Step};

/// Timeout applied to click/fill targets when the step does not set one.
/// Browser automation libraries give actions a generous 30 s actionability
/// wait by default; explicit `wait` steps keep their own 5 s default.
const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of executing a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// Result of executing a whole flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub error: Option<String>,
}

/// Configuration for the flow runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL every navigate step is resolved against
    pub base_url: Url,

    /// Root directory screenshot paths are joined under
    pub out_dir: PathBuf,

    /// Browser session settings
    pub browser: BrowserConfig,

    /// Server readiness probe settings
    pub probe: ProbeConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            out_dir: PathBuf::from("verification"),
            browser: BrowserConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:5173/").expect("static URL parses")
}

/// Executes capture flows against a fresh browser session each.
pub struct FlowRunner {
    config: RunnerConfig,
}

impl FlowRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run `flow` to completion or first failure.
    ///
    /// The server is probed before a session is opened, and the session is
    /// closed on success and failure paths alike. Step failures land in the
    /// returned report; an `Err` from this function means the run could not
    /// be carried out at all (server unreachable, session setup, teardown).
    pub async fn run(&self, flow: &CaptureFlow) -> CaptureResult<FlowReport> {
        let start = Instant::now();
        info!(flow = %flow.name, base_url = %self.config.base_url, "running flow");

        probe::wait_until_reachable(&self.config.base_url, &self.config.probe).await?;

        let mut browser_config = self.config.browser.clone();
        browser_config.viewport = flow.viewport;
        let session = BrowserSession::launch(&browser_config).await?;

        let mut steps = Vec::new();
        let outcome = self.run_steps(&session, flow, &mut steps).await;
        let close_result = session.close().await;

        let flow_error =
            teardown_outcome(outcome.err().map(|e| e.to_string()), close_result)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let success = flow_error.is_none();

        if success {
            info!(flow = %flow.name, duration_ms, "flow completed");
        } else {
            error!(
                flow = %flow.name,
                error = flow_error.as_deref().unwrap_or("unknown"),
                "flow failed"
            );
        }

        Ok(FlowReport {
            name: flow.name.clone(),
            success,
            duration_ms,
            steps,
            error: flow_error,
        })
    }

    async fn run_steps(
        &self,
        session: &BrowserSession,
        flow: &CaptureFlow,
        reports: &mut Vec<StepReport>,
    ) -> CaptureResult<()> {
        for step in &flow.steps {
            let name = step.describe();
            debug!(step = %name, "executing");
            let start = Instant::now();

            let result = self.execute_step(session, step).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(screenshot_path) => {
                    reports.push(StepReport {
                        step: name,
                        success: true,
                        duration_ms,
                        error: None,
                        screenshot_path,
                    });
                }
                Err(e) => {
                    reports.push(StepReport {
                        step: name.clone(),
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                        screenshot_path: None,
                    });
                    // Fail fast: later steps depend on this one
                    return Err(CaptureError::StepFailed {
                        step: name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn execute_step(
        &self,
        session: &BrowserSession,
        step: &Step,
    ) -> CaptureResult<Option<PathBuf>> {
        match step {
            Step::Navigate { url, wait } => {
                let resolved = self.config.base_url.join(url)?;
                session.goto(&resolved, *wait).await?;
                Ok(None)
            }
            Step::Click { target, timeout_ms } => {
                session.click(target, action_timeout(*timeout_ms)).await?;
                Ok(None)
            }
            Step::Fill {
                target,
                value,
                timeout_ms,
            } => {
                session
                    .fill(target, value, action_timeout(*timeout_ms))
                    .await?;
                Ok(None)
            }
            Step::Wait {
                target,
                timeout_ms,
                state,
            } => {
                session
                    .resolve(target, Duration::from_millis(*timeout_ms), *state)
                    .await?;
                Ok(None)
            }
            Step::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(None)
            }
            Step::Screenshot { path } => {
                let full = self.config.out_dir.join(path);
                session.screenshot_to_file(&full).await?;
                Ok(Some(full))
            }
        }
    }

    /// Write a flow report to `path` as pretty-printed JSON.
    pub fn write_report(&self, report: &FlowReport, path: &Path) -> CaptureResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
}

/// Reconcile the step outcome with the session teardown result.
///
/// A close failure is only allowed to fail the run when every step
/// succeeded; a browser that died mid-step often cannot close cleanly, and
/// the step failure is the diagnosis worth reporting.
fn teardown_outcome(
    step_error: Option<String>,
    close_result: CaptureResult<()>,
) -> CaptureResult<Option<String>> {
    match (step_error, close_result) {
        (None, Err(close_err)) => Err(close_err),
        (step_error, Err(close_err)) => {
            warn!("failed to close browser session: {close_err}");
            Ok(step_error)
        }
        (step_error, Ok(())) => Ok(step_error),
    }
}

fn action_timeout(timeout_ms: Option<u64>) -> Duration {
    timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_ACTION_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_defaults_match_the_verification_setup() {
        let config = RunnerConfig::default();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5173/");
        assert_eq!(config.out_dir, PathBuf::from("verification"));
        assert!(config.browser.headless);
    }

    #[test]
    fn action_timeout_falls_back_to_default() {
        assert_eq!(action_timeout(None), Duration::from_secs(30));
        assert_eq!(action_timeout(Some(250)), Duration::from_millis(250));
    }

    #[test]
    fn step_failure_survives_a_failed_close() {
        let step_error = Some("wait timed out".to_string());
        let close_result = Err(crate::error::CaptureError::EmptyScreenshot);

        let outcome = teardown_outcome(step_error, close_result).unwrap();
        assert_eq!(outcome.as_deref(), Some("wait timed out"));
    }

    #[test]
    fn close_failure_fails_a_clean_run() {
        let close_result = Err(crate::error::CaptureError::EmptyScreenshot);
        assert!(teardown_outcome(None, close_result).is_err());
    }

    #[test]
    fn clean_close_preserves_the_step_outcome() {
        assert!(teardown_outcome(None, Ok(())).unwrap().is_none());
        let outcome = teardown_outcome(Some("boom".into()), Ok(())).unwrap();
        assert_eq!(outcome.as_deref(), Some("boom"));
    }

    #[test]
    fn report_round_trips_as_json() {
        let report = FlowReport {
            name: "verify-design".into(),
            success: false,
            duration_ms: 1234,
            steps: vec![StepReport {
                step: "wait:heading \"AI Cover Letter\"".into(),
                success: false,
                duration_ms: 5000,
                error: Some("Timed out after 5000 ms waiting for heading \"AI Cover Letter\"".into()),
                screenshot_path: None,
            }],
            error: Some("timeout".into()),
        };

        let json = serde_json::to_string(&report).unwrap();
        let parsed: FlowReport = serde_json::from_str(&json).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.steps.len(), 1);
    }

    #[test]
    fn write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FlowRunner::new(RunnerConfig::default());
        let report = FlowReport {
            name: "x".into(),
            success: true,
            duration_ms: 0,
            steps: vec![],
            error: None,
        };

        let path = dir.path().join("nested/report.json");
        runner.write_report(&report, &path).unwrap();
        assert!(path.exists());
    }
}
