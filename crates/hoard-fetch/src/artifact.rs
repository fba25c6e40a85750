use std::io;
use std::path::{Path, PathBuf};

use hoard_sniff::MediaType;

/// A downloaded file awaiting upload.
///
/// The artifact owns its file. [`release`](Self::release) removes it; if the
/// artifact is dropped unreleased the file is removed on drop. Either way the
/// removal is attempted exactly once.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: PathBuf,
    size_bytes: u64,
    content_type: MediaType,
    released: bool,
}

impl TemporaryArtifact {
    pub(crate) fn new(path: PathBuf, size_bytes: u64, content_type: MediaType) -> Self {
        Self {
            path,
            size_bytes,
            content_type,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the file. Calling it again is a no-op, and a file that is
    /// already gone is not an error.
    pub fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "released artifact");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove artifact");
        }
    }
}
