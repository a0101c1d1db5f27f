use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Destination for exported content that should be kept locally.
pub trait ExportSink {
    /// Persists `bytes` under `file_name` and returns where they landed.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;
        let dest = self.root.join(file_name);
        fs::write(&dest, bytes).with_context(|| format!("writing {}", dest.display()))?;
        Ok(dest)
    }
}
