//! Error types for capture flows

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to start browser session at {url}: {source}")]
    Session {
        url: String,
        #[source]
        source: fantoccini::error::NewSessionError,
    },

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("Target server unreachable at {url} after {attempts} attempts")]
    ServerUnreachable { url: String, attempts: usize },

    #[error("Timed out after {timeout_ms} ms waiting for {target}")]
    WaitTimeout { target: String, timeout_ms: u64 },

    #[error("Page did not reach {state} within {timeout_ms} ms")]
    LoadTimeout { state: String, timeout_ms: u64 },

    #[error("Screenshot capture returned no data")]
    EmptyScreenshot,

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
