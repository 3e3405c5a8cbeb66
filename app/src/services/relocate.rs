//! Moving processed source files out of the watched directory.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while relocating a source file.
#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("Source file does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Source path has no file name: {0}")]
    InvalidSourcePath(PathBuf),

    #[error("Failed to move {from} to {to}: {error}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },
}

/// Moves a file into a directory, keeping its file name.
pub trait FileRelocator: Send + Sync {
    /// Move `source` into `destination_dir` and return the new path.
    fn relocate(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, RelocationError>;
}

/// Filesystem relocator: rename, with copy and remove across devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

impl FileRelocator for FsRelocator {
    fn relocate(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, RelocationError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| RelocationError::InvalidSourcePath(source.to_path_buf()))?;
        if !source.is_file() {
            return Err(RelocationError::SourceMissing(source.to_path_buf()));
        }

        let destination = destination_dir.join(file_name);
        if destination.exists() {
            return Err(RelocationError::DestinationExists(destination));
        }

        let move_error = |error| RelocationError::Move {
            from: source.to_path_buf(),
            to: destination.clone(),
            error,
        };

        match std::fs::rename(source, &destination) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(path = %source.display(), "Rename crosses devices, copying");
                std::fs::copy(source, &destination).map_err(move_error)?;
                std::fs::remove_file(source).map_err(move_error)?;
            }
            Err(e) => return Err(move_error(e)),
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("original");
        std::fs::create_dir(&dest).unwrap();
        (dir, dest)
    }

    #[test]
    fn moves_file_and_keeps_name() {
        let (dir, dest) = setup();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        let moved = FsRelocator.relocate(&source, &dest).unwrap();

        assert_eq!(moved, dest.join("photo.jpg"));
        assert!(!source.exists());
        assert_eq!(std::fs::read(moved).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn refuses_to_overwrite() {
        let (dir, dest) = setup();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, b"new").unwrap();
        std::fs::write(dest.join("photo.jpg"), b"old").unwrap();

        let err = FsRelocator.relocate(&source, &dest).unwrap_err();

        assert!(matches!(err, RelocationError::DestinationExists(_)));
        assert!(source.exists());
        assert_eq!(std::fs::read(dest.join("photo.jpg")).unwrap(), b"old");
    }

    #[test]
    fn missing_source_is_reported() {
        let (dir, dest) = setup();
        let err = FsRelocator
            .relocate(&dir.path().join("gone.png"), &dest)
            .unwrap_err();
        assert!(matches!(err, RelocationError::SourceMissing(_)));
    }

    #[test]
    fn missing_destination_directory_is_a_move_error() {
        let (dir, _) = setup();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, b"x").unwrap();

        let err = FsRelocator
            .relocate(&source, &dir.path().join("nowhere"))
            .unwrap_err();

        assert!(matches!(err, RelocationError::Move { .. }));
        assert!(source.exists());
    }

    #[test]
    fn root_path_is_invalid() {
        let (_dir, dest) = setup();
        let err = FsRelocator.relocate(Path::new("/"), &dest).unwrap_err();
        assert!(matches!(err, RelocationError::InvalidSourcePath(_)));
    }
}
