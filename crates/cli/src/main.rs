//! pageshot - Capture verification screenshots of a running web app
//!
//! With no arguments this runs the built-in verify-design flow against the
//! local dev server: a landing-page screenshot, a click on the "Launch App"
//! button, a wait for the "AI Cover Letter" heading, and an assistant-page
//! screenshot, written under `verification/`.

use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use url::Url;

use pageshot_capture::{
    BrowserConfig, CaptureFlow, FlowRunner, ProbeConfig, RunnerConfig, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "pageshot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Flow file to run (YAML); defaults to the built-in verify-design flow
    flow: Option<PathBuf>,

    /// Base URL of the server under capture
    #[arg(long, default_value = "http://127.0.0.1:5173/")]
    base_url: Url,

    /// Directory screenshot paths are written under
    #[arg(long, default_value = "verification")]
    out: PathBuf,

    /// WebDriver endpoint (Chromedriver)
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    no_headless: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Seconds to wait for the server to become reachable
    #[arg(long, default_value = "30")]
    probe_timeout_secs: u64,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let flow = match &cli.flow {
        Some(path) => CaptureFlow::from_file(path)?,
        None => CaptureFlow::verify_design(),
    };

    let config = RunnerConfig {
        base_url: cli.base_url.clone(),
        out_dir: cli.out.clone(),
        browser: BrowserConfig {
            webdriver_url: cli.webdriver_url.clone(),
            headless: !cli.no_headless,
            viewport: Viewport {
                width: cli.viewport_width,
                height: cli.viewport_height,
            },
        },
        probe: ProbeConfig {
            timeout: std::time::Duration::from_secs(cli.probe_timeout_secs),
            ..Default::default()
        },
    };

    let runner = FlowRunner::new(config);
    let report = match runner.run(&flow).await {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    if let Some(path) = &cli.report {
        runner.write_report(&report, path)?;
    }

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}
