//! pageshot capture library
//!
//! Drives a headless browser through an ordered list of steps — navigate,
//! click, wait, screenshot — against a fresh session, saving each screenshot
//! and failing fast when a wait condition times out.
//!
//! ```no_run
//! use pageshot_capture::{CaptureFlow, FlowRunner, RunnerConfig};
//!
//! # async fn run() -> pageshot_capture::CaptureResult<()> {
//! let runner = FlowRunner::new(RunnerConfig::default());
//! let report = runner.run(&CaptureFlow::verify_design()).await?;
//! assert!(report.success);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod error;
pub mod flow;
pub mod locator;
pub mod probe;
pub mod step;

pub use browser::{BrowserConfig, BrowserSession};
pub use error::{CaptureError, CaptureResult};
pub use flow::{FlowReport, FlowRunner, RunnerConfig, StepReport};
pub use locator::{Role, Target};
pub use probe::ProbeConfig;
pub use step::{CaptureFlow, LoadWait, Step, Viewport, WaitState};
