//! Attachment storage: persists inbound photos for agent consumption.
//!
//! Files are named `{user_id}_{remote_file_id}.jpg`, so a repeated download
//! of the same upload lands on the same path and simply overwrites it.

use std::io;
use std::path::{Path, PathBuf};

/// Write-only store for photo attachments under a flat directory.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an attachment would be stored at, derived from immutable ids.
    pub fn path_for(&self, user_id: &str, file_id: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.jpg", user_id, file_id))
    }

    /// Write the bytes to `{dir}/{user_id}_{file_id}.jpg`, creating the
    /// directory if needed. Overwrites any existing file at that path.
    pub fn store(&self, user_id: &str, file_id: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(user_id, file_id);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
