//! On-disk record of what a resolution fetched and how it ranked the candidates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::Result;

/// Writes debug artifacts into a directory; does nothing when disabled.
#[derive(Debug, Clone, Default)]
pub struct DebugArchive {
    dir: Option<PathBuf>,
}

impl DebugArchive {
    pub fn new(dir: Option<&Path>) -> Self {
        Self {
            dir: dir.map(Path::to_path_buf),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Stores a fetched document as-is.
    pub fn write_document(&self, name: &str, body: &[u8]) -> Result<()> {
        let Some(path) = self.prepare(name)? else {
            return Ok(());
        };
        fs::write(&path, body)?;
        tracing::debug!("Archived {}", path.display());
        Ok(())
    }

    /// Stores `value` as pretty-printed JSON.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let body = serde_json::to_vec_pretty(value).map_err(std::io::Error::from)?;
        self.write_document(name, &body)
    }

    fn prepare(&self, name: &str) -> Result<Option<PathBuf>> {
        let Some(ref dir) = self.dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir)?;
        Ok(Some(dir.join(name)))
    }
}
