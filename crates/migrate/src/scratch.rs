//! Scratch directory for intermediate stores.
//!
//! Every intermediate store file a migration produces lives inside one
//! scratch directory, created next to the store being migrated so the final
//! promotion is a same-filesystem rename. The directory (and anything still
//! in it) is removed when the [`ScratchDir`] drops, on success and failure
//! alike.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Owns the intermediate files of one migration run.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a scratch directory in the same directory as `store_path`.
    pub fn create_near(store_path: &Path) -> Result<Self> {
        let parent = store_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let dir = tempfile::Builder::new()
            .prefix(".sbx-migrate-")
            .tempdir_in(parent)?;
        debug!(path = %dir.path().display(), "created migration scratch directory");
        Ok(ScratchDir { dir })
    }

    /// Path of the scratch directory itself.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for an intermediate store file inside the scratch directory.
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
