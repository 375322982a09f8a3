//! Startup configuration shared read-only by all request handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::download::Strategy;
use crate::process::ToolBinary;

/// Everything a request handler needs besides the request itself.
///
/// Built once in `main`; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    pub ffmpeg: ToolBinary,
    pub ytdlp: ToolBinary,
    /// `yt-dlp --version` as reported at startup
    pub ytdlp_version: String,
    /// Used when a download request carries no `output_dir`
    pub output_dir: PathBuf,
    /// Ordered YouTube extraction strategies
    pub strategies: Vec<Strategy>,
}

impl HelperConfig {
    pub fn new(ffmpeg: ToolBinary, ytdlp: ToolBinary, output_dir: PathBuf) -> Self {
        Self {
            ffmpeg,
            ytdlp,
            ytdlp_version: "unknown".to_string(),
            output_dir,
            strategies: Strategy::defaults(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.ytdlp_version = version.into();
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }
}

/// Load an ordered strategy list from a JSON file.
///
/// The file holds an array of `{"name", "format"?, "player_clients"?}` objects.
pub fn load_strategies(path: &Path) -> Result<Vec<Strategy>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read strategy file {}", path.display()))?;
    let strategies: Vec<Strategy> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid strategy file {}", path.display()))?;

    if strategies.is_empty() {
        bail!("Strategy file {} contains no strategies", path.display());
    }

    Ok(strategies)
}
