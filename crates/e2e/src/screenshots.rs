//! Inspection of screenshot files written during a UI run

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::E2eResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub sha256: String,
}

impl ScreenshotRecord {
    /// Read a screenshot's dimensions and content hash
    pub fn inspect(path: &Path) -> E2eResult<Self> {
        let (width, height) = image::image_dimensions(path)?;
        let sha256 = hash_file(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            width,
            height,
            sha256,
        })
    }
}

/// Inspect every screenshot that can be read; unreadable files are logged and skipped
pub fn collect(paths: &[PathBuf]) -> Vec<ScreenshotRecord> {
    paths
        .iter()
        .filter_map(|path| match ScreenshotRecord::inspect(path) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping screenshot {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Hash a file using SHA256
fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
