//! Output file naming for captured screenshots
//!
//! A [`NamingScheme`] turns a [`Screenshot`] into the path it should be saved
//! at. The directory is resolved in this order:
//!
//! 1. An explicit directory prefix, concatenated as-is with the file name.
//!    Include the trailing separator (`"/tmp/"`). An empty string means the
//!    current application directory.
//! 2. When no directory is configured, the host's default storage folder.
//!
//! # Examples
//!
//! ```
//! use std::path::PathBuf;
//!
//! use framegrab::capture::NamingScheme;
//!
//! let scheme = NamingScheme::with_file_path_and_name("/tmp/", "App");
//! let storage = PathBuf::from("/unused");
//! assert_eq!(scheme.path_for_sequence(3, &storage).unwrap(), PathBuf::from("/tmp/App3.png"));
//! ```

use std::path::{Path, PathBuf};

use super::Screenshot;
use crate::{error::CaptureResult, host::StorageFolder};

/// Extension appended to every screenshot file
pub const SCREENSHOT_EXTENSION: &str = "png";

/// Base name used when neither the user nor the host supplied one
const FALLBACK_SHOT_NAME: &str = "Screenshot";

/// Computes output paths for screenshots
///
/// `numbered` is always `true`: no constructor turns numbering off, so every
/// file name carries the screenshot's sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
    file_path: Option<String>,
    shot_name: Option<String>,
    numbered:  bool,
}

impl NamingScheme {
    /// Writes sequentially numbered files to the default storage folder
    pub fn new() -> Self {
        Self {
            file_path: None,
            shot_name: None,
            numbered:  true,
        }
    }

    /// Writes to `file_path`, or the default storage folder when `None`
    pub fn with_file_path(file_path: Option<impl Into<String>>) -> Self {
        Self {
            file_path: file_path.map(Into::into),
            ..Self::new()
        }
    }

    /// Writes files named `shot_name<N>.png` under `file_path`
    pub fn with_file_path_and_name(file_path: impl Into<String>, shot_name: impl Into<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            shot_name: Some(shot_name.into()),
            numbered:  true,
        }
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, file_path: Option<String>) {
        self.file_path = file_path;
    }

    pub fn shot_name(&self) -> Option<&str> {
        self.shot_name.as_deref()
    }

    pub fn set_shot_name(&mut self, shot_name: impl Into<String>) {
        self.shot_name = Some(shot_name.into());
    }

    pub fn is_numbered(&self) -> bool {
        self.numbered
    }

    /// File name for the given sequence number, e.g. `App3.png`
    pub fn file_name(&self, sequence_number: u32) -> String {
        let base = self.shot_name.as_deref().unwrap_or(FALLBACK_SHOT_NAME);
        if self.numbered {
            format!("{base}{sequence_number}.{SCREENSHOT_EXTENSION}")
        } else {
            format!("{base}.{SCREENSHOT_EXTENSION}")
        }
    }

    /// Absolute output path for `screenshot`
    pub fn file_for(
        &self,
        screenshot: &Screenshot,
        storage: &dyn StorageFolder,
    ) -> CaptureResult<PathBuf> {
        self.path_for_sequence(screenshot.sequence_number(), storage)
    }

    /// Absolute output path for the screenshot numbered `sequence_number`
    pub fn path_for_sequence(
        &self,
        sequence_number: u32,
        storage: &dyn StorageFolder,
    ) -> CaptureResult<PathBuf> {
        let file_name = self.file_name(sequence_number);
        let path = match &self.file_path {
            Some(prefix) => PathBuf::from(format!("{prefix}{file_name}")),
            None => storage.storage_folder().join(file_name),
        };
        Ok(absolute(&path)?)
    }
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self::new()
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::path::absolute(path)
    }
}
