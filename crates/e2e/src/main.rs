//! Smoke check entry point
//!
//! `healthy-eating-smoke http` checks that the front-end routes respond;
//! `healthy-eating-smoke ui` runs the browser checklist.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use healthy_eating_e2e::playwright::{Browser, PlaywrightConfig, PlaywrightDriver};
use healthy_eating_e2e::reachability::{self, HttpChecker, HttpConfig};
use healthy_eating_e2e::report::{ReportFormat, UiReport};
use healthy_eating_e2e::{E2eResult, UiChecker, UiConfig, UiRun};

/// One day
const MAX_SECS: u64 = 86_400;

#[derive(Parser, Debug)]
#[command(name = "healthy-eating-smoke")]
#[command(author, version, about = "Smoke checks for the Healthy Eating front-end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that every front-end route answers 200
    Http(HttpArgs),

    /// Drive a browser through the pages and check expected UI elements
    Ui(UiArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Request / browser action timeout in seconds
    #[arg(
        long,
        env = "SMOKE_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..=MAX_SECS)
    )]
    timeout_secs: u64,

    /// Wait up to this many seconds for the server before checking (0 = no wait)
    #[arg(
        long,
        env = "SMOKE_WAIT_SECS",
        default_value = "0",
        value_parser = clap::value_parser!(u64).range(0..=MAX_SECS)
    )]
    wait_secs: u64,
}

#[derive(Args, Debug)]
struct HttpArgs {
    /// Front-end base URL
    #[arg(long, env = "SMOKE_HTTP_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct UiArgs {
    /// Front-end base URL
    #[arg(long, env = "SMOKE_UI_BASE_URL", default_value = "http://localhost:3001")]
    base_url: String,

    /// Directory screenshots are written to
    #[arg(long, env = "SMOKE_SCREENSHOT_DIR", default_value = ".")]
    screenshot_dir: PathBuf,

    /// Browser engine
    #[arg(long, env = "SMOKE_BROWSER", value_enum, default_value = "chromium")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Extra node_modules directory containing playwright
    #[arg(long, env = "SMOKE_NODE_MODULES")]
    node_modules: Option<PathBuf>,

    /// Write a run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    report_format: ReportFormat,

    #[command(flatten)]
    common: CommonArgs,
}

impl HttpArgs {
    fn config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.common.timeout_secs),
            wait: Duration::from_secs(self.common.wait_secs),
        }
    }
}

impl UiArgs {
    fn config(&self) -> UiConfig {
        UiConfig {
            base_url: self.base_url.clone(),
            screenshot_dir: self.screenshot_dir.clone(),
            playwright: PlaywrightConfig {
                browser: self.browser,
                headless: !self.headed,
                timeout: Duration::from_secs(self.common.timeout_secs),
                node_modules: self.node_modules.clone(),
            },
            wait: Duration::from_secs(self.common.wait_secs),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Http(args) => run_http(args.config()).await,
        Commands::Ui(args) => run_ui(args.config(), args.report, args.report_format).await,
    };

    ExitCode::from(exit_status(result))
}

/// 0 when every check passed; 1 when a check failed or the run could not start
fn exit_status(result: E2eResult<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("Error: {}", e);
            1
        }
    }
}

async fn run_http(config: HttpConfig) -> E2eResult<bool> {
    if !config.wait.is_zero() {
        reachability::wait_until_reachable(&config.base_url, config.wait).await?;
    }

    let checker = HttpChecker::new(&config)?;
    let outcomes = checker.check_all().await;

    let mut failed = 0;
    for (route, outcome) in &outcomes {
        match outcome {
            Ok(ok) => println!(
                "✅ {} -> {} ({})",
                route.path,
                ok.status,
                ok.content_type.as_deref().unwrap_or("no content type")
            ),
            Err(e) => {
                failed += 1;
                println!("❌ {} -> {}", route.path, e);
            }
        }
    }

    println!(
        "\n{} passed, {} failed",
        outcomes.len() - failed,
        failed
    );
    Ok(failed == 0)
}

async fn run_ui(config: UiConfig, report: Option<PathBuf>, format: ReportFormat) -> E2eResult<bool> {
    if !config.wait.is_zero() {
        reachability::wait_until_reachable(&config.base_url, config.wait).await?;
    }

    std::fs::create_dir_all(&config.screenshot_dir)?;

    let started_at = Utc::now();
    let start = Instant::now();

    let driver = PlaywrightDriver::launch(config.playwright.clone()).await?;
    let run = UiChecker::new(driver, config.base_url.clone(), config.screenshot_dir.clone())
        .run()
        .await;

    println!("\n{}", run.results.render_summary());

    let duration_ms = start.elapsed().as_millis() as u64;
    let report = report.map(|path| (path, format));
    Ok(conclude_ui_run(&run, &config.base_url, started_at, duration_ms, report))
}

/// Verdict of a finished run. A report that cannot be written is logged and
/// does not change the verdict.
fn conclude_ui_run(
    run: &UiRun,
    base_url: &str,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    report: Option<(PathBuf, ReportFormat)>,
) -> bool {
    let success = run.success();

    if let Some((path, format)) = report {
        let report = UiReport::from_run(run, base_url, started_at, duration_ms);
        if let Err(e) = report.write(&path, format) {
            warn!("Failed to write report to {}: {}", path.display(), e);
        }
    }

    success
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthy_eating_e2e::{CheckName, CheckResults, E2eError};

    fn finished_run(all_passed: bool) -> UiRun {
        let mut results = CheckResults::new();
        for name in CheckName::ALL {
            results.pass(name, "ok");
        }
        if !all_passed {
            results.fail(CheckName::MediaSection, "Media section not found");
        }
        UiRun {
            results,
            page_title: Some("Healthy Eating".to_string()),
            screenshots: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(exit_status(Ok(true)), 0);
        assert_eq!(exit_status(Ok(false)), 1);
        assert_eq!(exit_status(Err(E2eError::PlaywrightNotFound)), 1);
    }

    #[test]
    fn test_unwritable_report_keeps_passing_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let report = Some((blocker.join("ui-report.json"), ReportFormat::Json));

        let success = conclude_ui_run(&finished_run(true), "http://localhost:3001", Utc::now(), 5, report);
        assert!(success);
    }

    #[test]
    fn test_report_written_for_failed_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui-report.yaml");

        let success = conclude_ui_run(
            &finished_run(false),
            "http://localhost:3001",
            Utc::now(),
            5,
            Some((path.clone(), ReportFormat::Yaml)),
        );
        assert!(!success);
        assert!(std::fs::read_to_string(path).unwrap().contains("media_section"));
    }

    #[test]
    fn test_timeout_must_be_positive_and_bounded() {
        assert!(Cli::try_parse_from(["healthy-eating-smoke", "ui", "--timeout-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["healthy-eating-smoke", "http", "--timeout-secs", "86401"]).is_err());
        assert!(Cli::try_parse_from(["healthy-eating-smoke", "http", "--wait-secs", "86401"]).is_err());

        let cli = Cli::try_parse_from(["healthy-eating-smoke", "ui", "--timeout-secs", "86400"]).unwrap();
        match cli.command {
            Commands::Ui(args) => {
                assert_eq!(args.config().playwright.timeout, Duration::from_secs(MAX_SECS))
            }
            other => panic!("expected ui, got {:?}", other),
        }
    }
}
