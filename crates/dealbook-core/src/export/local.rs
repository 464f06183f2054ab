//! Local directory export destination

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{ExportDestination, ExportDocument};
use crate::error::{Error, Result};

/// Writes export files into a local directory
pub struct LocalDirectory {
    dir: PathBuf,
}

impl LocalDirectory {
    /// Creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create export directory {}: {}", dir.display(), e),
                ))
            })?;
            info!("Created export directory: {}", dir.display());
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportDestination for LocalDirectory {
    fn name(&self) -> &str {
        "local"
    }

    /// Same-day exports overwrite the earlier file
    fn write(&self, file_name: &str, document: &ExportDocument) -> Result<String> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&path, json)?;

        info!("Wrote export: {}", path.display());
        Ok(path.display().to_string())
    }
}
