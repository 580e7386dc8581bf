//! PNG file output for captured frames
//!
//! [`PngFileHandler`] is the default [`ScreenshotHandler`]: it resolves the
//! output path with the state's [`NamingScheme`], creates missing parent
//! directories, encodes the frame as PNG and writes it. Every written file is
//! recorded in a shared [`WrittenFiles`] log.
//!
//! # Examples
//!
//! ```
//! use framegrab::{
//!     capture::{NamingScheme, ScreenshotAppState},
//!     host::headless::HeadlessApp,
//!     util::png_writer::PngFileHandler,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let prefix = format!("{}/", dir.path().display());
//!
//! let handler = PngFileHandler::new(dir.path().to_path_buf());
//! let written = handler.written_files();
//! let state = ScreenshotAppState::with_naming_scheme(NamingScheme::with_file_path_and_name(
//!     prefix, "Demo",
//! ))
//! .with_handler(handler);
//!
//! let mut app = HeadlessApp::new(64, 64);
//! app.attach_state(Box::new(state.clone()));
//! state.take_screenshot();
//! app.update(0.016).unwrap();
//!
//! assert_eq!(written.len(), 1);
//! assert!(dir.path().join("Demo1.png").exists());
//! ```

use std::{cell::RefCell, fs, path::PathBuf, rc::Rc};

use chrono::{DateTime, Utc};
use image::codecs::png::CompressionType;
use tracing::info;

use super::encode::{compression_type_from_quality, encode_png_with_compression, DEFAULT_QUALITY};
use crate::{
    capture::{NamingScheme, Screenshot, ScreenshotHandler},
    error::CaptureResult,
    host::StorageFolder,
};

/// Record of a screenshot file written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    /// Absolute path of the file
    pub path:            PathBuf,
    /// Encoded size in bytes
    pub size:            u64,
    /// Sequence number of the screenshot
    pub sequence_number: u32,
    /// When the screenshot was captured
    pub captured_at:     DateTime<Utc>,
}

/// Shared, append-only log of written files
///
/// Clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct WrittenFiles {
    files: Rc<RefCell<Vec<WrittenFile>>>,
}

impl WrittenFiles {
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }

    /// Paths of all written files, oldest first
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().iter().map(|f| f.path.clone()).collect()
    }

    /// Copy of every record, oldest first
    pub fn snapshot(&self) -> Vec<WrittenFile> {
        self.files.borrow().clone()
    }

    fn push(&self, file: WrittenFile) {
        self.files.borrow_mut().push(file);
    }
}

/// Writes each captured frame to a PNG file
pub struct PngFileHandler {
    storage:     Box<dyn StorageFolder>,
    compression: CompressionType,
    written:     WrittenFiles,
}

impl PngFileHandler {
    /// Creates a writer using `storage` as the default output folder
    pub fn new(storage: impl StorageFolder + 'static) -> Self {
        Self {
            storage:     Box::new(storage),
            compression: compression_type_from_quality(DEFAULT_QUALITY),
            written:     WrittenFiles::default(),
        }
    }

    /// Sets the PNG compression level from a 0-100 quality value
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.compression = compression_type_from_quality(quality);
        self
    }

    /// Handle to the log of files this writer produces
    pub fn written_files(&self) -> WrittenFiles {
        self.written.clone()
    }
}

impl std::fmt::Debug for PngFileHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PngFileHandler")
            .field("storage", &self.storage.storage_folder())
            .field("compression", &self.compression)
            .field("written", &self.written.len())
            .finish()
    }
}

impl ScreenshotHandler for PngFileHandler {
    fn screenshot_captured(
        &mut self,
        screenshot: Screenshot,
        naming: &NamingScheme,
    ) -> CaptureResult<()> {
        let path = naming.file_for(&screenshot, self.storage.as_ref())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let png = encode_png_with_compression(&screenshot, self.compression)?;
        fs::write(&path, &png)?;

        info!(
            path = %path.display(),
            sequence = screenshot.sequence_number(),
            bytes = png.len(),
            "Saved screenshot"
        );

        self.written.push(WrittenFile {
            path,
            size: png.len() as u64,
            sequence_number: screenshot.sequence_number(),
            captured_at: screenshot.captured_at(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sequence_number: u32) -> Screenshot {
        Screenshot::new(vec![10, 20, 30, 255].repeat(6), 3, 2, sequence_number)
    }

    #[test]
    fn test_writes_into_storage_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = PngFileHandler::new(dir.path().to_path_buf());
        let written = handler.written_files();

        let mut naming = NamingScheme::new();
        naming.set_shot_name("Game");
        handler.screenshot_captured(frame(4), &naming).unwrap();

        let expected = dir.path().join("Game4.png");
        assert!(expected.exists());
        assert_eq!(written.paths(), vec![expected.clone()]);

        let record = &written.snapshot()[0];
        assert_eq!(record.sequence_number, 4);
        assert_eq!(record.size, fs::metadata(&expected).unwrap().len());
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/nested/shots/", dir.path().display());
        let mut handler = PngFileHandler::new(PathBuf::from("/unused")).with_quality(10);

        let naming = NamingScheme::with_file_path_and_name(prefix, "App");
        handler.screenshot_captured(frame(1), &naming).unwrap();

        let path = dir.path().join("nested/shots/App1.png");
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_failed_encode_is_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = PngFileHandler::new(dir.path().to_path_buf());
        let written = handler.written_files();

        let empty = Screenshot::new(Vec::new(), 0, 0, 1);
        assert!(handler.screenshot_captured(empty, &NamingScheme::new()).is_err());
        assert!(written.is_empty());
    }
}
