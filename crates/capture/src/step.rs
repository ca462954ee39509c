//! Declarative capture flows: an ordered list of browser steps
//!
//! Flows are written in YAML and executed in order against a fresh browser
//! session; the first failing step aborts the flow.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CaptureError, CaptureResult};
use crate::locator::{Role, Target};

/// A complete capture flow parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureFlow {
    /// Unique name for this flow
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to the base URL)
    Navigate {
        url: String,
        #[serde(default)]
        wait: LoadWait,
    },

    /// Click an element
    Click {
        target: Target,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        target: Target,
        value: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for an element
    Wait {
        target: Target,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Capture a viewport screenshot to `path` under the output root
    Screenshot { path: PathBuf },
}

fn default_wait_timeout() -> u64 {
    5000
}

/// Page-load condition applied after a navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadWait {
    /// Return as soon as the navigation command completes
    None,
    /// Wait for `document.readyState == "complete"`
    Load,
    /// Wait until no network activity has occurred for a quiescent period
    #[default]
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    /// Element exists and is displayed
    #[default]
    Visible,
    /// Element exists in the DOM, displayed or not
    Present,
}

impl Step {
    /// Short name used in logs and step reports.
    pub fn describe(&self) -> String {
        match self {
            Step::Navigate { url, .. } => format!("navigate:{url}"),
            Step::Click { target, .. } => format!("click:{target}"),
            Step::Fill { target, .. } => format!("fill:{target}"),
            Step::Wait { target, .. } => format!("wait:{target}"),
            Step::Sleep { ms } => format!("sleep:{ms}ms"),
            Step::Screenshot { path } => format!("screenshot:{}", path.display()),
        }
    }
}

impl CaptureFlow {
    /// Parse a flow from a YAML string.
    pub fn from_yaml(yaml: &str) -> CaptureResult<Self> {
        serde_yaml::from_str(yaml).map_err(CaptureError::from)
    }

    /// Parse a flow from a YAML file.
    pub fn from_file(path: &Path) -> CaptureResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all flows from a directory.
    pub fn load_all(dir: &Path) -> CaptureResult<Vec<Self>> {
        let mut flows = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let flow = Self::from_file(entry.path())?;
            flows.push(flow);
        }

        Ok(flows)
    }

    /// The built-in design-verification flow: capture the landing page, click
    /// through to the assistant page, and capture it once its heading shows.
    pub fn verify_design() -> Self {
        Self {
            name: "verify-design".into(),
            description: "Landing and assistant page captures for manual review".into(),
            viewport: default_viewport(),
            steps: vec![
                Step::Navigate {
                    url: "/".into(),
                    wait: LoadWait::NetworkIdle,
                },
                Step::Screenshot {
                    path: PathBuf::from("landing-page.png"),
                },
                Step::Click {
                    target: Target::Role {
                        role: Role::Button,
                        name: "Launch App".into(),
                    },
                    timeout_ms: None,
                },
                Step::Wait {
                    target: Target::Role {
                        role: Role::Heading,
                        name: "AI Cover Letter".into(),
                    },
                    timeout_ms: default_wait_timeout(),
                    state: WaitState::Visible,
                },
                Step::Screenshot {
                    path: PathBuf::from("assistant-page.png"),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_flow() {
        let yaml = r#"
name: landing-only
description: Capture the landing page
steps:
  - action: navigate
    url: /
  - action: screenshot
    path: landing.png
"#;
        let flow = CaptureFlow::from_yaml(yaml).unwrap();
        assert_eq!(flow.name, "landing-only");
        assert_eq!(flow.steps.len(), 2);
        assert_eq!(flow.viewport.width, 1280);
        assert_eq!(flow.viewport.height, 720);
    }

    #[test]
    fn navigate_defaults_to_network_idle() {
        let yaml = r#"
name: nav
steps:
  - action: navigate
    url: /app
"#;
        let flow = CaptureFlow::from_yaml(yaml).unwrap();
        match &flow.steps[0] {
            Step::Navigate { url, wait } => {
                assert_eq!(url, "/app");
                assert_eq!(*wait, LoadWait::NetworkIdle);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn parse_role_targets() {
        let yaml = r#"
name: click-through
viewport:
  width: 1920
  height: 1080
steps:
  - action: click
    target: { role: button, name: Launch App }
  - action: wait
    target: { role: heading, name: AI Cover Letter }
"#;
        let flow = CaptureFlow::from_yaml(yaml).unwrap();
        assert_eq!(flow.viewport.width, 1920);
        match &flow.steps[1] {
            Step::Wait {
                target,
                timeout_ms,
                state,
            } => {
                assert_eq!(target.to_string(), "heading \"AI Cover Letter\"");
                assert_eq!(*timeout_ms, 5000);
                assert_eq!(*state, WaitState::Visible);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn verify_design_orders_wait_before_second_screenshot() {
        let flow = CaptureFlow::verify_design();
        let names: Vec<String> = flow.steps.iter().map(|s| s.describe()).collect();
        assert_eq!(
            names,
            vec![
                "navigate:/",
                "screenshot:landing-page.png",
                "click:button \"Launch App\"",
                "wait:heading \"AI Cover Letter\"",
                "screenshot:assistant-page.png",
            ]
        );
    }

    #[test]
    fn load_all_reads_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let flow = CaptureFlow::verify_design();
        let yaml = serde_yaml::to_string(&flow).unwrap();
        std::fs::write(dir.path().join("verify.yaml"), &yaml).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let flows = CaptureFlow::load_all(dir.path()).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].name, "verify-design");
        assert_eq!(flows[0].steps.len(), 5);
    }
}
