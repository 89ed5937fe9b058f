//! Recording output naming

use std::path::{Path, PathBuf};

use crate::domain::capture::CaptureMode;
use crate::domain::error::CaptureError;

/// Destination of a single recording: `{dir}/{name}-{unix_seconds}.{ext}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingTarget {
    path: PathBuf,
}

impl RecordingTarget {
    /// Build the target path for a recording started at `timestamp`.
    ///
    /// The name becomes a single path component, so it must be non-empty
    /// and free of separators.
    pub fn new(
        dir: &Path,
        name: &str,
        timestamp: i64,
        mode: CaptureMode,
    ) -> Result<Self, CaptureError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CaptureError::FileSystemError(
                "recording name is empty".to_string(),
            ));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(CaptureError::FileSystemError(format!(
                "recording name \"{}\" is not a plain file name",
                name
            )));
        }

        let file_name = format!("{}-{}.{}", name, timestamp, mode.file_extension());
        Ok(Self {
            path: dir.join(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}
