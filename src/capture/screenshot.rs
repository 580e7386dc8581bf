//! Captured frames and the readback session that produces them

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::{CaptureError, CaptureResult},
    host::{FrameBuffer, RenderContext},
    model::ViewportRect,
};

/// A single captured frame
///
/// Holds RGBA8 pixels exactly as the renderer read them back: rows are
/// ordered bottom-up. Use [`to_rgba_image`](Screenshot::to_rgba_image) for a
/// conventional top-down image.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    buffer:          Vec<u8>,
    width:           u32,
    height:          u32,
    sequence_number: u32,
    captured_at:     DateTime<Utc>,
}

impl Screenshot {
    pub(crate) fn new(buffer: Vec<u8>, width: u32, height: u32, sequence_number: u32) -> Self {
        Self {
            buffer,
            width,
            height,
            sequence_number,
            captured_at: Utc::now(),
        }
    }

    /// Sequence number of this capture, starting at 1
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Raw bottom-up RGBA8 pixels
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the screenshot and returns its pixel buffer
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    /// Converts the pixels to a top-down RGBA image
    ///
    /// # Errors
    ///
    /// [`CaptureError::ImageError`] when the buffer does not hold
    /// `width * height * 4` bytes.
    pub fn to_rgba_image(&self) -> CaptureResult<image::RgbaImage> {
        let mut img = image::RgbaImage::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or_else(|| {
                CaptureError::ImageError(format!(
                    "{} bytes cannot hold a {}x{} RGBA frame",
                    self.buffer.len(),
                    self.width,
                    self.height
                ))
            })?;

        // Readback origin is the bottom-left corner
        image::imageops::flip_vertical_in_place(&mut img);
        Ok(img)
    }
}

/// Scratch buffer and sequence counter owned by one screenshot state
#[derive(Default)]
pub struct CaptureSession {
    scratch:       Vec<u8>,
    width:         u32,
    height:        u32,
    last_sequence: u32,
    bound:         bool,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the session as attached to a render pipeline
    pub fn bind(&mut self) {
        self.bound = true;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Reallocates the scratch buffer for a `width` x `height` surface
    pub fn reshape(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(CaptureError::InvalidDimensions { width, height })?;

        self.scratch = vec![0u8; len];
        self.width = width;
        self.height = height;
        debug!(width, height, bytes = len, "Resized screenshot scratch buffer");
        Ok(())
    }

    /// Size of the scratch buffer in bytes
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }

    /// Current surface dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sequence number the next capture will receive
    pub fn next_sequence_number(&self) -> u32 {
        self.last_sequence + 1
    }

    /// Reads the whole frame buffer and returns it as a new screenshot
    ///
    /// The renderer viewport is widened to the full surface for the readback
    /// and then set back to the current camera's viewport, whether or not the
    /// readback succeeded.
    pub fn capture(
        &mut self,
        ctx: &mut dyn RenderContext,
        out: Option<&FrameBuffer>,
    ) -> CaptureResult<Screenshot> {
        if !self.bound {
            return Err(CaptureError::NotInitialized {
                component: "CaptureSession".to_string(),
            });
        }

        let restore = ctx.current_camera().viewport_rect();
        let renderer = ctx.renderer();

        renderer.set_viewport(ViewportRect::full(self.width, self.height));
        let readback = renderer.read_frame_buffer(out, &mut self.scratch);
        renderer.set_viewport(restore);
        readback?;

        self.last_sequence += 1;
        Ok(Screenshot::new(self.scratch.clone(), self.width, self.height, self.last_sequence))
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("scratch_len", &self.scratch.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("last_sequence", &self.last_sequence)
            .field("bound", &self.bound)
            .finish()
    }
}
