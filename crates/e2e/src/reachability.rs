//! HTTP reachability checks for the front-end routes

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// One route to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteCheck {
    pub path: &'static str,
    pub description: &'static str,
    /// Require a `text/html` content type
    pub expect_html: bool,
}

pub const ROUTES: [RouteCheck; 3] = [
    RouteCheck {
        path: "/",
        description: "Frontend should be accessible",
        expect_html: true,
    },
    RouteCheck {
        path: "/recipesuggester",
        description: "Recipe suggester page should be accessible",
        expect_html: false,
    },
    RouteCheck {
        path: "/mealbymacros",
        description: "Meal by macros page should be accessible",
        expect_html: false,
    },
];

/// What a passing route returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOutcome {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

/// Configuration for the HTTP checker
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// How long to wait for the server before checking (zero = don't wait)
    pub wait: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
            wait: Duration::ZERO,
        }
    }
}

pub struct HttpChecker {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpChecker {
    pub fn new(config: &HttpConfig) -> E2eResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Resolve `path` against the base URL; absolute paths replace the base path
    pub fn url_for(&self, path: &str) -> E2eResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| E2eError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    /// GET one route and assert its status and, for HTML routes, content type
    pub async fn check_route(&self, route: &RouteCheck) -> E2eResult<RouteOutcome> {
        let url = self.url_for(route.path)?;
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status != StatusCode::OK {
            return Err(E2eError::AssertionFailed(format!(
                "{}: expected status 200 from {}, got {}",
                route.description,
                url,
                status.as_u16()
            )));
        }

        if route.expect_html {
            let is_html = content_type
                .as_deref()
                .map(|ct| ct.contains("text/html"))
                .unwrap_or(false);
            if !is_html {
                return Err(E2eError::AssertionFailed(format!(
                    "Response should be HTML: content type of {} is {}",
                    url,
                    content_type.as_deref().unwrap_or("missing")
                )));
            }
        }

        Ok(RouteOutcome {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
        })
    }

    /// Check every route; one route failing does not stop the others
    pub async fn check_all(&self) -> Vec<(RouteCheck, E2eResult<RouteOutcome>)> {
        let mut outcomes = Vec::with_capacity(ROUTES.len());
        for route in ROUTES {
            let result = self.check_route(&route).await;
            match &result {
                Ok(outcome) => info!("✓ {} ({})", route.path, outcome.status),
                Err(e) => warn!("✗ {} - {}", route.path, e),
            }
            outcomes.push((route, result));
        }
        outcomes
    }
}

fn parse_base_url(base_url: &str) -> E2eResult<Url> {
    Url::parse(base_url).map_err(|e| E2eError::InvalidUrl(format!("{}: {}", base_url, e)))
}

/// Poll `base_url` until it answers with a 2xx or `timeout` elapses
pub async fn wait_until_reachable(base_url: &str, timeout: Duration) -> E2eResult<()> {
    let url = parse_base_url(base_url)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;

        match client.get(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("{} is reachable", url);
                return Ok(());
            }
            Ok(resp) => {
                warn!("{} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                // Connection refused is expected while the dev server starts
                if !e.is_connect() {
                    warn!("Readiness check error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(100)).await;
    }

    Err(E2eError::ServerUnreachable {
        url: url.to_string(),
        attempts,
    })
}
