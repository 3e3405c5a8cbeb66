//! Output directory layout under the watched base directory.

use std::io;
use std::path::{Path, PathBuf};

/// Subdirectory receiving transformed images.
pub const DONE_DIR: &str = "done";
/// Subdirectory receiving the untouched source files.
pub const ORIGINAL_DIR: &str = "original";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    done: PathBuf,
    original: PathBuf,
}

impl OutputLayout {
    pub fn for_base(base_directory: &Path) -> Self {
        Self {
            done: base_directory.join(DONE_DIR),
            original: base_directory.join(ORIGINAL_DIR),
        }
    }

    /// Create `done` then `original` if missing.
    ///
    /// Existing directories are left untouched. On failure the offending
    /// path is returned with the error and later directories are not created.
    pub fn ensure(&self) -> Result<(), (PathBuf, io::Error)> {
        for dir in [&self.done, &self.original] {
            ensure_dir(dir).map_err(|e| (dir.clone(), e))?;
        }
        Ok(())
    }

    pub fn done(&self) -> &Path {
        &self.done
    }

    pub fn original(&self) -> &Path {
        &self.original
    }
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    match std::fs::create_dir(dir) {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "Created directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
