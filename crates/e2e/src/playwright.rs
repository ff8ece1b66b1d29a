//! Playwright browser automation
//!
//! The browser lives in a long-running Node process (the bridge). Rust sends
//! one JSON request per line on the bridge's stdin and reads exactly one JSON
//! response per line from its stdout, matched by `id`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::driver::{PageDriver, Viewport};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,

    /// Default timeout for navigation, waits and element actions
    pub timeout: Duration,

    /// Extra `node_modules` directory to resolve `playwright` from
    pub node_modules: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            timeout: Duration::from_secs(30),
            node_modules: None,
        }
    }
}

/// Request sent to the bridge, minus its `id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    SetViewport { width: u32, height: u32 },
    Goto { url: String },
    WaitForNetworkIdle,
    Title,
    Screenshot { path: String },
    Count { selector: String },
    ClickFirst { selector: String },
    Close,
}

impl BridgeOp {
    fn name(&self) -> &'static str {
        match self {
            BridgeOp::SetViewport { .. } => "set_viewport",
            BridgeOp::Goto { .. } => "goto",
            BridgeOp::WaitForNetworkIdle => "wait_for_network_idle",
            BridgeOp::Title => "title",
            BridgeOp::Screenshot { .. } => "screenshot",
            BridgeOp::Count { .. } => "count",
            BridgeOp::ClickFirst { .. } => "click_first",
            BridgeOp::Close => "close",
        }
    }
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    op: &'a BridgeOp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeResponse {
    fn into_value(self, op: &str) -> E2eResult<serde_json::Value> {
        if self.ok {
            Ok(self.value)
        } else {
            Err(E2eError::Playwright(format!(
                "{} failed: {}",
                op,
                self.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
    }
}

/// Id of the unsolicited message the bridge emits once the page is ready
const READY_ID: u64 = 0;

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const browserName = process.argv[2];
const headless = process.argv[3] === 'true';
const timeoutMs = Number(process.argv[4]);

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const browser = await playwright[browserName].launch({ headless });
  const context = await browser.newContext();
  const page = await context.newPage();
  page.setDefaultTimeout(timeoutMs);
  page.setDefaultNavigationTimeout(timeoutMs);

  const handlers = {
    set_viewport: (req) => page.setViewportSize({ width: req.width, height: req.height }),
    goto: (req) => page.goto(req.url),
    wait_for_network_idle: () => page.waitForLoadState('networkidle'),
    title: () => page.title(),
    screenshot: (req) => page.screenshot({ path: req.path }),
    count: async (req) => (await page.$$(req.selector)).length,
    click_first: async (req) => {
      const el = await page.$(req.selector);
      if (!el) return false;
      await el.click();
      return true;
    },
    close: () => browser.close(),
  };

  reply({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (error) {
      reply({ id: null, ok: false, error: 'invalid request: ' + error.message });
      continue;
    }
    const handler = handlers[req.op];
    if (!handler) {
      reply({ id: req.id, ok: false, error: 'unknown op: ' + req.op });
      continue;
    }
    try {
      const value = await handler(req);
      const plain = typeof value === 'number' || typeof value === 'string' || typeof value === 'boolean';
      reply({ id: req.id, ok: true, value: plain ? value : null });
    } catch (error) {
      reply({ id: req.id, ok: false, error: error.message });
    }
    if (req.op === 'close') break;
  }
  process.exit(0);
})().catch((error) => {
  reply({ id: 0, ok: false, error: error.message });
  process.exit(1);
});
"#;

/// Playwright-backed page driver
pub struct PlaywrightDriver {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    /// `None` waits indefinitely
    response_timeout: Option<Duration>,
    closed: bool,

    // Holds the bridge script on disk for the child's lifetime
    _script_dir: Option<tempfile::TempDir>,
}

impl PlaywrightDriver {
    /// Launch a browser with one context and one page
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed().await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        info!(
            "Launching {} (headless: {})",
            config.browser.as_str(),
            config.headless
        );

        let mut cmd = Command::new("node");
        cmd.arg(&script_path)
            .arg(config.browser.as_str())
            .arg(config.headless.to_string())
            .arg(config.timeout.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(dir) = &config.node_modules {
            cmd.env("NODE_PATH", node_path_with(dir));
        }

        let child = cmd
            .spawn()
            .map_err(|e| E2eError::Bridge(format!("Failed to spawn node: {}", e)))?;

        let mut driver = Self::attach(child, response_timeout(config.timeout)).await?;
        driver._script_dir = Some(script_dir);
        Ok(driver)
    }

    /// Take over a spawned bridge process and wait for its ready message
    async fn attach(mut child: Child, response_timeout: Option<Duration>) -> E2eResult<Self> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout not captured".to_string()))?;

        let mut driver = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: READY_ID,
            response_timeout,
            closed: false,
            _script_dir: None,
        };

        driver.read_response(READY_ID, "launch").await?;
        debug!("Bridge ready");

        Ok(driver)
    }

    /// Check if Playwright is installed
    async fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn request(&mut self, op: BridgeOp) -> E2eResult<serde_json::Value> {
        if self.closed {
            return Err(E2eError::Bridge(format!(
                "{} requested after close",
                op.name()
            )));
        }

        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&BridgeRequest { id, op: &op })?;
        line.push('\n');
        debug!("bridge <- {}", line.trim_end());

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        self.read_response(id, op.name()).await
    }

    async fn read_response(&mut self, id: u64, op: &str) -> E2eResult<serde_json::Value> {
        let next = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, self.stdout.next_line())
                .await
                .map_err(|_| {
                    E2eError::Bridge(format!("no response to {} within {:?}", op, limit))
                })?,
            None => self.stdout.next_line().await,
        };
        let line = next?
            .ok_or_else(|| E2eError::Bridge(format!("bridge exited during {}", op)))?;

        debug!("bridge -> {}", line);

        let response: BridgeResponse = serde_json::from_str(&line)?;
        if response.id != Some(id) {
            return Err(E2eError::Bridge(format!(
                "response id {:?} does not match request {} ({})",
                response.id, id, op
            )));
        }

        response.into_value(op)
    }
}

#[async_trait]
impl PageDriver for PlaywrightDriver {
    async fn set_viewport(&mut self, viewport: Viewport) -> E2eResult<()> {
        self.request(BridgeOp::SetViewport {
            width: viewport.width,
            height: viewport.height,
        })
        .await?;
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.request(BridgeOp::Goto { url: url.to_string() }).await?;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> E2eResult<()> {
        self.request(BridgeOp::WaitForNetworkIdle).await?;
        Ok(())
    }

    async fn title(&mut self) -> E2eResult<String> {
        let value = self.request(BridgeOp::Title).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()> {
        self.request(BridgeOp::Screenshot {
            path: path.to_string_lossy().to_string(),
        })
        .await?;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        let value = self
            .request(BridgeOp::Count {
                selector: selector.to_string(),
            })
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| E2eError::Bridge(format!("count returned non-integer: {}", value)))
    }

    async fn click_first(&mut self, selector: &str) -> E2eResult<bool> {
        let value = self
            .request(BridgeOp::ClickFirst {
                selector: selector.to_string(),
            })
            .await?;
        value
            .as_bool()
            .ok_or_else(|| E2eError::Bridge(format!("click_first returned non-boolean: {}", value)))
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }

        let result = self.request(BridgeOp::Close).await;
        self.closed = true;

        if result.is_err() {
            let _ = self.child.start_kill();
        }

        match self.child.wait().await {
            Ok(status) if !status.success() => warn!("Bridge exited with {}", status),
            Ok(_) => debug!("Bridge exited"),
            Err(e) => warn!("Failed to reap bridge: {}", e),
        }

        result.map(|_| ())
    }
}

/// Deadline for one bridge reply. Twice the Playwright timeout leaves room for
/// Playwright to report its own timeout first; a zero timeout disables both.
fn response_timeout(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() {
        None
    } else {
        Some(timeout.checked_mul(2).unwrap_or(Duration::MAX))
    }
}

fn node_path_with(dir: &Path) -> std::ffi::OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("NODE_PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| dir.as_os_str().to_os_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_flat_json_with_op_tag() {
        let op = BridgeOp::Count {
            selector: "nav a".to_string(),
        };
        let json = serde_json::to_value(BridgeRequest { id: 3, op: &op }).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 3, "op": "count", "selector": "nav a" }));
    }

    #[test]
    fn test_unit_ops_serialize_to_bare_tag() {
        let json = serde_json::to_value(BridgeRequest {
            id: 7,
            op: &BridgeOp::WaitForNetworkIdle,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "op": "wait_for_network_idle" }));
    }

    #[test]
    fn test_viewport_request_carries_dimensions() {
        let op = BridgeOp::SetViewport {
            width: Viewport::MOBILE.width,
            height: Viewport::MOBILE.height,
        };
        let json = serde_json::to_value(BridgeRequest { id: 1, op: &op }).unwrap();
        assert_eq!(json["op"], "set_viewport");
        assert_eq!(json["width"], 390);
        assert_eq!(json["height"], 844);
    }

    #[test]
    fn test_error_response_becomes_playwright_error() {
        let response: BridgeResponse =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"Timeout 30000ms exceeded"}"#).unwrap();
        let err = response.into_value("goto").unwrap_err();
        assert!(matches!(err, E2eError::Playwright(ref msg) if msg == "goto failed: Timeout 30000ms exceeded"));
    }

    #[test]
    fn test_ok_response_without_value_is_null() {
        let response: BridgeResponse = serde_json::from_str(r#"{"id":2,"ok":true}"#).unwrap();
        assert_eq!(response.into_value("goto").unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_bridge_script_handles_every_op() {
        for op in [
            "set_viewport",
            "goto",
            "wait_for_network_idle",
            "title",
            "screenshot",
            "count",
            "click_first",
            "close",
        ] {
            assert!(BRIDGE_SCRIPT.contains(&format!("{}:", op)), "missing handler for {}", op);
        }
    }

    #[test]
    fn test_response_timeout_doubles_playwright_timeout() {
        assert_eq!(
            response_timeout(Duration::from_secs(30)),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_zero_timeout_means_no_deadline() {
        assert_eq!(response_timeout(Duration::ZERO), None);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        assert_eq!(
            response_timeout(Duration::from_secs(u64::MAX)),
            Some(Duration::MAX)
        );
    }

    const READY: &str = r#"{"id":0,"ok":true,"value":"ready"}"#;

    /// Spawn `sh -c script` wired up like the node bridge
    #[cfg(unix)]
    fn fake_bridge(script: &str) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[cfg(unix)]
    async fn attach_fake(script: &str, limit: Option<Duration>) -> E2eResult<PlaywrightDriver> {
        PlaywrightDriver::attach(fake_bridge(script), limit).await
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_request_gets_matching_response() {
        let script = format!(
            "printf '%s\\n' '{}'; read -r _; printf '%s\\n' '{}'; cat >/dev/null",
            READY, r#"{"id":1,"ok":true,"value":4}"#
        );
        let mut driver = attach_fake(&script, Some(Duration::from_secs(5))).await.unwrap();

        assert_eq!(driver.count("nav a").await.unwrap(), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mismatched_response_id_is_rejected() {
        let script = format!(
            "printf '%s\\n' '{}'; read -r _; printf '%s\\n' '{}'; cat >/dev/null",
            READY, r#"{"id":9,"ok":true,"value":null}"#
        );
        let mut driver = attach_fake(&script, Some(Duration::from_secs(5))).await.unwrap();

        let err = driver.goto("http://localhost:3001").await.unwrap_err();
        assert!(
            matches!(err, E2eError::Bridge(ref msg) if msg.contains("does not match request 1")),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bridge_exit_mid_request_is_reported() {
        let script = format!("printf '%s\\n' '{}'; read -r _", READY);
        let mut driver = attach_fake(&script, Some(Duration::from_secs(5))).await.unwrap();

        let err = driver.goto("http://localhost:3001").await.unwrap_err();
        assert!(
            matches!(err, E2eError::Bridge(ref msg) if msg == "bridge exited during goto"),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_launch_message_surfaces() {
        let script = format!(
            "printf '%s\\n' '{}'",
            r#"{"id":0,"ok":false,"error":"Executable not found"}"#
        );
        let err = attach_fake(&script, Some(Duration::from_secs(5))).await.err().unwrap();
        assert!(
            matches!(err, E2eError::Playwright(ref msg) if msg.contains("Executable not found")),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_bridge_hits_deadline() {
        let script = format!("printf '%s\\n' '{}'; cat >/dev/null", READY);
        let mut driver = attach_fake(&script, Some(Duration::from_millis(200))).await.unwrap();

        let err = driver.title().await.unwrap_err();
        assert!(
            matches!(err, E2eError::Bridge(ref msg) if msg.starts_with("no response to title")),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_later_requests() {
        let script = format!(
            "printf '%s\\n' '{}'; read -r _; printf '%s\\n' '{}'",
            READY, r#"{"id":1,"ok":true,"value":null}"#
        );
        let mut driver = attach_fake(&script, Some(Duration::from_secs(5))).await.unwrap();

        driver.close().await.unwrap();
        driver.close().await.unwrap();

        let err = driver.goto("http://localhost:3001").await.unwrap_err();
        assert!(
            matches!(err, E2eError::Bridge(ref msg) if msg == "goto requested after close"),
            "{:?}",
            err
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unanswered_close_kills_bridge() {
        let script = format!("printf '%s\\n' '{}'; cat >/dev/null", READY);
        let mut driver = attach_fake(&script, Some(Duration::from_millis(200))).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), driver.close()).await;
        assert!(matches!(result, Ok(Err(E2eError::Bridge(_)))), "{:?}", result);
    }

    #[test]
    fn test_playwright_config_default() {
        let config = PlaywrightConfig::default();
        assert_eq!(config.browser, Browser::Chromium);
        assert!(config.headless);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
