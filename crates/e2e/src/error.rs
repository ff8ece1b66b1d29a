//! Error types for smoke checks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server at {url} not reachable after {attempts} attempts")]
    ServerUnreachable { url: String, attempts: usize },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

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

pub type E2eResult<T> = Result<T, E2eError>;
