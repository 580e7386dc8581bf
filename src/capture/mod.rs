//! Key-triggered frame capture
//!
//! This module contains the screenshot component and the types it hands to
//! consumers:
//!
//! - [`ScreenshotAppState`]: registers a Print Screen mapping and a
//!   post-processing stage, and captures the frame buffer when triggered
//! - [`Screenshot`]: one captured frame with its sequence number
//! - [`NamingScheme`]: resolves where a screenshot file should go
//! - [`ScreenshotHandler`]: consumer callback invoked once per capture

use crate::error::CaptureResult;

pub mod app_state;
pub mod naming;
pub mod screenshot;

pub use app_state::ScreenshotAppState;
pub use naming::NamingScheme;
pub use screenshot::{CaptureSession, Screenshot};

/// Receives every captured frame
///
/// Runs synchronously on the render thread, so the frame does not finish
/// until the handler returns. The handler owns the screenshot; `naming` is
/// a snapshot of the state's naming scheme at capture time.
///
/// Closures with a matching signature implement this trait:
///
/// ```
/// use framegrab::capture::{NamingScheme, Screenshot, ScreenshotHandler};
/// use framegrab::error::CaptureResult;
///
/// fn count_captures() -> impl ScreenshotHandler {
///     let mut captured = 0;
///     move |_shot: Screenshot, _naming: &NamingScheme| -> CaptureResult<()> {
///         captured += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait ScreenshotHandler {
    fn screenshot_captured(
        &mut self,
        screenshot: Screenshot,
        naming: &NamingScheme,
    ) -> CaptureResult<()>;
}

impl<F> ScreenshotHandler for F
where
    F: FnMut(Screenshot, &NamingScheme) -> CaptureResult<()>,
{
    fn screenshot_captured(
        &mut self,
        screenshot: Screenshot,
        naming: &NamingScheme,
    ) -> CaptureResult<()> {
        self(screenshot, naming)
    }
}
