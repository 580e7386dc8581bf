//! Error types for frame capture operations
//!
//! This module defines the error type shared by the capture component, the
//! host collaborator traits and the PNG output path. Each variant carries the
//! context needed to explain the failure and offers a remediation hint.

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error type for screenshot capture, readback and output
///
/// Each variant includes detailed context and provides remediation hints
/// through the `remediation_hint()` method.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// A component was used before the host initialized it
    #[error("{component} used before initialization")]
    NotInitialized {
        /// Name of the uninitialized component
        component: String,
    },

    /// The render pipeline has no post view to attach a processor to
    #[error("Render pipeline has no post view to attach the screenshot processor to")]
    NoOutputView,

    /// Frame dimensions cannot be represented as a pixel buffer
    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels
        width:  u32,
        /// Requested height in pixels
        height: u32,
    },

    /// Destination buffer cannot hold the requested readback
    #[error("Readback buffer too small: need {required} bytes, have {actual}")]
    BufferTooSmall {
        /// Bytes needed for the current viewport
        required: usize,
        /// Bytes available in the destination buffer
        actual:   usize,
    },

    /// The renderer failed to read back the frame buffer
    #[error("Frame buffer readback failed: {reason}")]
    ReadbackFailed {
        /// Reason reported by the renderer
        reason: String,
    },

    /// Image encoding failed
    #[error("Failed to encode image as {format}: {reason}")]
    EncodingFailed {
        /// Image format that failed
        format: String,
        /// Reason for encoding failure
        reason: String,
    },

    /// Configuration could not be loaded or is out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration
        reason: String,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    ImageError(String),
}

impl CaptureError {
    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use framegrab::error::CaptureError;
    ///
    /// let error = CaptureError::NoOutputView;
    /// assert!(error.remediation_hint().contains("post view"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            CaptureError::NotInitialized { .. } => {
                "Attach the screenshot state to the application and let the render pipeline run \
                 at least one frame before capturing."
            }
            CaptureError::NoOutputView => {
                "Create at least one post view in the render manager before attaching the \
                 screenshot state."
            }
            CaptureError::InvalidDimensions { .. } => {
                "The output surface size is too large for a CPU-side RGBA buffer. Reduce the \
                 window or render target size."
            }
            CaptureError::BufferTooSmall { .. } => {
                "The renderer viewport is larger than the scratch buffer. Make sure reshape \
                 notifications reach the screenshot processor."
            }
            CaptureError::ReadbackFailed { .. } => {
                "The renderer could not read the frame buffer. Check that the output target is \
                 still valid and readable."
            }
            CaptureError::EncodingFailed { .. } => {
                "PNG encoding failed. Check that the captured frame has non-zero dimensions."
            }
            CaptureError::InvalidConfig { .. } => {
                "Check the configuration file: quality must be between 0 and 100 and the file \
                 must be valid JSON."
            }
            CaptureError::IoError(_) => {
                "An I/O error occurred. Check file permissions, disk space, and that the output \
                 directory is writable."
            }
            CaptureError::ImageError(_) => {
                "Image processing failed. Ensure the pixel buffer matches the frame dimensions."
            }
        }
    }
}
