//! Browser page abstraction used by the UI checklist

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DESKTOP: Viewport = Viewport { width: 1920, height: 1080 };
    pub const TABLET: Viewport = Viewport { width: 768, height: 1024 };
    pub const MOBILE: Viewport = Viewport { width: 390, height: 844 };
}

/// A single browser page.
///
/// Selectors are passed through to the browser engine untouched, so engine
/// extensions such as `:has-text()` work where the engine supports them.
#[async_trait]
pub trait PageDriver: Send {
    async fn set_viewport(&mut self, viewport: Viewport) -> E2eResult<()>;

    /// Navigate to an absolute URL and wait for the load event
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    async fn wait_for_network_idle(&mut self) -> E2eResult<()>;

    async fn title(&mut self) -> E2eResult<String>;

    async fn screenshot(&mut self, path: &Path) -> E2eResult<()>;

    /// Number of elements matching `selector`
    async fn count(&mut self, selector: &str) -> E2eResult<usize>;

    async fn exists(&mut self, selector: &str) -> E2eResult<bool> {
        Ok(self.count(selector).await? > 0)
    }

    /// Click the first element matching `selector`. Returns `false` without
    /// clicking when nothing matches.
    async fn click_first(&mut self, selector: &str) -> E2eResult<bool>;

    /// Release the page, its context and the browser
    async fn close(&mut self) -> E2eResult<()>;
}
