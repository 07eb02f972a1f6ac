//! Scoped ownership of transient per-point artifacts.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Owns the transient files and directories of one sweep point.
///
/// Everything registered is removed by [`ArtifactGuard::purge`] and again on
/// drop, so no artifact outlives its point regardless of how the point ends.
#[derive(Debug)]
pub struct ArtifactGuard {
    paths: Vec<PathBuf>,
}

impl ArtifactGuard {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every registered artifact. Absent paths are not an error.
    ///
    /// All paths are attempted; the first failure is returned.
    pub fn purge(&self) -> io::Result<()> {
        let mut first_error = None;
        for path in &self.paths {
            if let Err(e) = remove_path(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove transient artifact");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Registered paths still present on disk.
    pub fn leftovers(&self) -> Vec<&Path> {
        self.paths
            .iter()
            .filter(|p| p.symlink_metadata().is_ok())
            .map(PathBuf::as_path)
            .collect()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        let _ = self.purge();
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match path.symlink_metadata() {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
