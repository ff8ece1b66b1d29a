//! Serializable record of a UI run

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checklist::UiRun;
use crate::error::E2eResult;
use crate::results::CheckResults;
use crate::screenshots::{self, ScreenshotRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub base_url: String,
    pub page_title: Option<String>,
    pub success: bool,
    pub results: CheckResults,
    pub error: Option<String>,
    pub screenshots: Vec<ScreenshotRecord>,
}

impl UiReport {
    pub fn from_run(run: &UiRun, base_url: &str, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        Self {
            started_at,
            duration_ms,
            base_url: base_url.to_string(),
            page_title: run.page_title.clone(),
            success: run.success(),
            results: run.results.clone(),
            error: run.error.clone(),
            screenshots: screenshots::collect(&run.screenshots),
        }
    }

    pub fn render(&self, format: ReportFormat) -> E2eResult<String> {
        Ok(match format {
            ReportFormat::Json => serde_json::to_string_pretty(self)?,
            ReportFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Write the report, creating parent directories as needed
    pub fn write(&self, path: &Path, format: ReportFormat) -> E2eResult<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(format)?)?;

        info!("Report written to: {}", path.display());
        Ok(path.to_path_buf())
    }
}
